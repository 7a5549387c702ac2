use huddle_client::{ClientConfig, ClientSession, PeerState, StaticMedia};
use huddle_core::{Envelope, EventKind, ParticipantId, RoomId};
use std::sync::Arc;

use crate::integration::init_tracing;
use crate::utils::{MockConnector, MockTransportFactory, next_end};

fn offer(from: &str, to: &str) -> Envelope {
    Envelope::Offer {
        from: ParticipantId::from(from),
        to: ParticipantId::from(to),
        sdp: format!("offer {from} -> {to}"),
    }
}

#[tokio::test]
async fn test_discovery_races_keep_a_single_link() {
    init_tracing();
    let bob = ParticipantId::from("bob");

    let factory = MockTransportFactory::new("alice");
    let (connector, mut ends) = MockConnector::new();
    let (mut alice, _events) = ClientSession::new(
        &ClientConfig::new("http://unused", "r1", "alice"),
        connector,
        factory.clone(),
    );
    alice.start().await.unwrap();
    let mut server = next_end(&mut ends).await.unwrap();
    server.expect(EventKind::JoinRoom).await.unwrap();
    alice
        .attach_media(Arc::new(StaticMedia::camera_and_microphone("cam")))
        .await;

    let room_info = Envelope::RoomInfo {
        room: RoomId::from("r1"),
        members: vec![bob.clone()],
    };
    alice.handle_envelope(room_info.clone()).await;
    alice
        .handle_envelope(Envelope::NewPeer {
            participant_id: bob.clone(),
        })
        .await;
    alice
        .handle_envelope(Envelope::Ready {
            participant_id: bob.clone(),
        })
        .await;
    alice.handle_envelope(offer("bob", "alice")).await;
    alice.handle_envelope(room_info).await;

    assert_eq!(alice.peer_count(), 1);
    assert_eq!(alice.peer_state(&bob), Some(PeerState::Offering));

    let log = factory.log("bob");
    // the new_peer replaced the first link; nothing else created one
    assert_eq!(log.created, 2);
    assert_eq!(log.open, 1);
    assert_eq!(log.max_open, 1);
}

#[tokio::test]
async fn test_repeated_offers_replace_the_link() {
    init_tracing();
    let alice = ParticipantId::from("alice");

    let factory = MockTransportFactory::new("bob");
    let (connector, mut ends) = MockConnector::new();
    let (mut bob, _events) = ClientSession::new(
        &ClientConfig::new("http://unused", "r1", "bob"),
        connector,
        factory.clone(),
    );
    bob.start().await.unwrap();
    let mut server = next_end(&mut ends).await.unwrap();
    server.expect(EventKind::JoinRoom).await.unwrap();
    bob.attach_media(Arc::new(StaticMedia::camera_and_microphone("cam")))
        .await;
    server.expect(EventKind::Ready).await.unwrap();

    bob.handle_envelope(offer("alice", "bob")).await;
    server.expect(EventKind::Answer).await.unwrap();
    assert_eq!(bob.peer_state(&alice), Some(PeerState::Connected));

    bob.handle_envelope(offer("alice", "bob")).await;
    server.expect(EventKind::Answer).await.unwrap();

    assert_eq!(bob.peer_count(), 1);
    let log = factory.log("alice");
    assert_eq!(log.created, 2);
    assert_eq!(log.max_open, 1);
}
