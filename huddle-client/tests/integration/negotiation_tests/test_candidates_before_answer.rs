use huddle_client::{ClientConfig, ClientSession, PeerState, SdpKind, StaticMedia};
use huddle_core::{Candidate, Envelope, EventKind, ParticipantId, RoomId};
use std::sync::Arc;

use crate::integration::init_tracing;
use crate::utils::{MockConnector, MockTransportFactory, next_end};

fn candidate(n: u8) -> Candidate {
    Candidate::new(format!("candidate:{n} 1 udp 2122260223 192.168.0.{n} 6000 typ host"))
        .with_mid("0", 0)
}

#[tokio::test]
async fn test_candidates_before_answer_are_applied_afterwards() {
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
    alice
        .handle_envelope(Envelope::RoomInfo {
            room: RoomId::from("r1"),
            members: vec![bob.clone()],
        })
        .await;
    server.expect(EventKind::Ready).await.unwrap();
    server.expect(EventKind::Offer).await.unwrap();

    for n in 1..=3 {
        alice
            .handle_envelope(Envelope::IceCandidate {
                from: bob.clone(),
                to: ParticipantId::from("alice"),
                candidate: candidate(n),
            })
            .await;
    }
    // a malformed one in the middle is dropped without harm
    alice
        .handle_envelope(Envelope::IceCandidate {
            from: bob.clone(),
            to: ParticipantId::from("alice"),
            candidate: Candidate::new(""),
        })
        .await;
    assert!(factory.log("bob").candidates.is_empty());

    alice
        .handle_envelope(Envelope::Answer {
            from: bob.clone(),
            to: ParticipantId::from("alice"),
            sdp: "answer bob -> alice".into(),
        })
        .await;
    alice
        .handle_envelope(Envelope::IceCandidate {
            from: bob.clone(),
            to: ParticipantId::from("alice"),
            candidate: candidate(4),
        })
        .await;

    assert_eq!(alice.peer_state(&bob), Some(PeerState::Connected));
    let log = factory.log("bob");
    assert_eq!(
        log.remote_descriptions,
        vec![(SdpKind::Answer, "answer bob -> alice".to_owned())]
    );
    assert_eq!(
        log.candidates,
        vec![candidate(1), candidate(2), candidate(3), candidate(4)]
    );
}
