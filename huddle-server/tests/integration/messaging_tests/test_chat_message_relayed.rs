use huddle_core::{Envelope, EventKind, ParticipantId};

use crate::integration::init_tracing;
use crate::utils::{TestServer, WsTestClient};

#[tokio::test]
async fn test_chat_message_reaches_everyone_in_the_room() {
    init_tracing();

    let server = TestServer::start().await.expect("Failed to start server");

    let mut alice = WsTestClient::connect(&server.ws_url(), "alice").await.unwrap();
    let mut bob = WsTestClient::connect(&server.ws_url(), "bob").await.unwrap();
    let mut outsider = WsTestClient::connect(&server.ws_url(), "zed").await.unwrap();
    alice.join("r1").await.unwrap();
    bob.join("r1").await.unwrap();
    outsider.join("r2").await.unwrap();
    alice.expect(EventKind::NewPeer).await.unwrap();

    alice
        .send(&Envelope::SendMessage {
            message: "can everyone hear me?".into(),
        })
        .await
        .unwrap();

    for client in [&mut alice, &mut bob] {
        let Envelope::NewMessage { from, message, .. } =
            client.expect(EventKind::NewMessage).await.unwrap()
        else {
            unreachable!();
        };
        assert_eq!(from, ParticipantId::from("alice"));
        assert_eq!(message, "can everyone hear me?");
    }
    outsider.expect_silence().await.unwrap();
}

#[tokio::test]
async fn test_client_cannot_forge_new_message() {
    init_tracing();

    let server = TestServer::start().await.expect("Failed to start server");

    let mut alice = WsTestClient::connect(&server.ws_url(), "alice").await.unwrap();
    let mut bob = WsTestClient::connect(&server.ws_url(), "bob").await.unwrap();
    alice.join("r1").await.unwrap();
    bob.join("r1").await.unwrap();
    alice.expect(EventKind::NewPeer).await.unwrap();

    alice
        .send(&Envelope::NewMessage {
            from: ParticipantId::from("bob"),
            message: "i am bob".into(),
            sent: 1,
        })
        .await
        .unwrap();

    bob.expect_silence().await.unwrap();
}
