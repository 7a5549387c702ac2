use huddle_client::{ClientEvent, ClientSession};
use huddle_core::{ParticipantId, RoomId};
use std::sync::Arc;

use crate::integration::{init_tracing, wait_for_event};
use crate::utils::{MockTransportFactory, TestServer};

#[tokio::test]
async fn test_message_reaches_room_and_its_sender() {
    init_tracing();
    let server = TestServer::start().await.unwrap();

    let alice_config = server.client_config("r1", "alice");
    let (mut alice, mut alice_events) = ClientSession::new(
        &alice_config,
        Arc::new(server.connector(&alice_config)),
        MockTransportFactory::new("alice"),
    );
    alice.start().await.unwrap();
    let alice_handle = alice.handle();
    let alice_task = tokio::spawn(alice.run());

    let bob_config = server.client_config("r1", "bob");
    let (mut bob, mut bob_events) = ClientSession::new(
        &bob_config,
        Arc::new(server.connector(&bob_config)),
        MockTransportFactory::new("bob"),
    );
    bob.start().await.unwrap();
    let bob_handle = bob.handle();
    let bob_task = tokio::spawn(bob.run());

    // wait until the server has both members before talking
    for _ in 0..50 {
        if server.service.rooms().members(&RoomId::from("r1")).await.len() == 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(bob_handle.send_message("hello from bob").await);

    for events in [&mut alice_events, &mut bob_events] {
        let Some(ClientEvent::Message { from, message, .. }) =
            wait_for_event(events, |e| matches!(e, ClientEvent::Message { .. })).await
        else {
            panic!("message never arrived");
        };
        assert_eq!(from, ParticipantId::from("bob"));
        assert_eq!(message, "hello from bob");
    }

    alice_handle.shutdown().await;
    bob_handle.shutdown().await;
    alice_task.await.unwrap();
    bob_task.await.unwrap();
}
