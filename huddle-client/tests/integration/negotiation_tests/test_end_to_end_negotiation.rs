use huddle_client::{ClientEvent, ClientSession, StaticMedia};
use huddle_core::{ParticipantId, RoomId};
use std::sync::Arc;

use crate::integration::{init_tracing, wait_for_event};
use crate::utils::{MockTransportFactory, TestServer};

#[tokio::test]
async fn test_two_clients_negotiate_through_the_server() {
    init_tracing();
    let server = TestServer::start().await.unwrap();
    let alice_id = ParticipantId::from("alice");
    let bob_id = ParticipantId::from("bob");

    let alice_config = server.client_config("standup", "alice");
    let (mut alice, mut alice_events) = ClientSession::new(
        &alice_config,
        Arc::new(server.connector(&alice_config)),
        MockTransportFactory::new("alice"),
    );
    alice.start().await.unwrap();
    let alice_handle = alice.handle();
    let alice_task = tokio::spawn(alice.run());

    let bob_config = server.client_config("standup", "bob");
    let bob_factory = MockTransportFactory::new("bob");
    let (mut bob, mut bob_events) = ClientSession::new(
        &bob_config,
        Arc::new(server.connector(&bob_config)),
        bob_factory.clone(),
    );
    bob.start().await.unwrap();
    let bob_handle = bob.handle();
    let bob_task = tokio::spawn(bob.run());

    let media = Arc::new(StaticMedia::camera_and_microphone("cam"));
    assert!(bob_handle.attach_media(media.clone()).await);
    assert!(alice_handle.attach_media(media).await);

    let connected = wait_for_event(&mut alice_events, |e| {
        matches!(e, ClientEvent::PeerConnected(_))
    })
    .await;
    assert_eq!(connected, Some(ClientEvent::PeerConnected(bob_id.clone())));
    let connected = wait_for_event(&mut bob_events, |e| {
        matches!(e, ClientEvent::PeerConnected(_))
    })
    .await;
    assert_eq!(connected, Some(ClientEvent::PeerConnected(alice_id.clone())));

    let log = bob_factory.log("alice");
    assert_eq!(log.created, 1);
    assert_eq!(log.remote_descriptions.len(), 1);
    assert_eq!(log.remote_descriptions[0].1, "offer alice -> bob");

    assert_eq!(
        server.service.rooms().members(&RoomId::from("standup")).await,
        vec![alice_id, bob_id.clone()]
    );

    assert!(bob_handle.leave().await);
    let closed = wait_for_event(&mut alice_events, |e| {
        matches!(e, ClientEvent::PeerClosed(_))
    })
    .await;
    assert_eq!(closed, Some(ClientEvent::PeerClosed(bob_id)));

    assert!(alice_handle.shutdown().await);
    assert!(bob_handle.shutdown().await);
    alice_task.await.unwrap();
    bob_task.await.unwrap();
}
