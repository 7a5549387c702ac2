use huddle_client::{
    ClientConfig, ClientEvent, ClientSession, MediaSource, ReconnectPolicy, StaticMedia,
    TransportEvent,
};
use huddle_core::{Candidate, Envelope, EventKind, ParticipantId, RoomId};
use std::sync::Arc;
use std::time::Duration;

use crate::integration::{init_tracing, wait_for_event};
use crate::utils::{MockConnector, MockTransportFactory, next_end};

#[tokio::test]
async fn test_stale_negotiation_is_purged_on_reconnect() {
    init_tracing();
    let bob = ParticipantId::from("bob");
    let media: Arc<dyn MediaSource> = Arc::new(StaticMedia::camera_and_microphone("cam"));

    let mut config = ClientConfig::new("http://unused", "r1", "alice");
    config.reconnect = ReconnectPolicy {
        max_attempts: 3,
        delay: Duration::from_millis(300),
    };
    let factory = MockTransportFactory::new("alice");
    let (connector, mut ends) = MockConnector::new();
    let (mut alice, mut events) = ClientSession::new(&config, connector, factory.clone());
    alice.start().await.unwrap();
    let handle = alice.handle();
    let mut first = next_end(&mut ends).await.unwrap();
    let task = tokio::spawn(alice.run());

    first.expect(EventKind::JoinRoom).await.unwrap();
    first.send(Envelope::RoomInfo {
        room: RoomId::from("r1"),
        members: vec![bob.clone()],
    });
    assert!(handle.attach_media(media.clone()).await);
    first.expect(EventKind::Ready).await.unwrap();
    first.expect(EventKind::Offer).await.unwrap();
    drop(first);

    assert!(wait_for_event(&mut events, |e| *e == ClientEvent::Disconnected).await.is_some());

    // both are queued while the channel is down
    factory
        .raise(TransportEvent::CandidateGenerated(
            bob.clone(),
            Candidate::new("candidate:1 1 udp 2122260223 10.0.0.1 6000 typ host").with_mid("0", 0),
        ))
        .await;
    assert!(handle.attach_media(media).await);

    let mut second = next_end(&mut ends).await.unwrap();
    second.expect(EventKind::JoinRoom).await.unwrap();
    second.expect(EventKind::Ready).await.unwrap();
    second.expect_silence().await.unwrap();

    assert_eq!(
        wait_for_event(&mut events, |e| matches!(e, ClientEvent::PeerClosed(_))).await,
        Some(ClientEvent::PeerClosed(bob.clone()))
    );
    assert!(wait_for_event(&mut events, |e| *e == ClientEvent::Connected).await.is_some());
    assert_eq!(factory.log("bob").open, 0);

    // the fresh room snapshot restarts negotiation from scratch
    second.send(Envelope::RoomInfo {
        room: RoomId::from("r1"),
        members: vec![bob.clone()],
    });
    let Envelope::Offer { to, .. } = second.expect(EventKind::Offer).await.unwrap() else {
        unreachable!();
    };
    assert_eq!(to, bob);
    assert_eq!(factory.log("bob").created, 2);

    handle.shutdown().await;
    task.await.unwrap();
}
