use huddle_core::{Envelope, EventKind, ParticipantId, RoomId};

use crate::integration::init_tracing;
use crate::utils::{TestServer, WsTestClient};

#[tokio::test]
async fn test_peer_disconnect_triggers_leave() {
    init_tracing();

    let server = TestServer::start().await.expect("Failed to start server");

    let mut alice = WsTestClient::connect(&server.ws_url(), "alice").await.unwrap();
    let mut bob = WsTestClient::connect(&server.ws_url(), "bob").await.unwrap();

    alice.join("r1").await.unwrap();
    bob.join("r1").await.unwrap();
    alice.expect(EventKind::NewPeer).await.unwrap();

    bob.close().await.expect("Failed to close bob");

    let Envelope::PeerLeft { participant_id } = alice.expect(EventKind::PeerLeft).await.unwrap()
    else {
        unreachable!();
    };
    assert_eq!(participant_id, ParticipantId::from("bob"));
    assert_eq!(
        server.service.rooms().members(&RoomId::from("r1")).await,
        vec![ParticipantId::from("alice")]
    );
}

#[tokio::test]
async fn test_explicit_leave_room() {
    init_tracing();

    let server = TestServer::start().await.expect("Failed to start server");

    let mut alice = WsTestClient::connect(&server.ws_url(), "alice").await.unwrap();
    let mut bob = WsTestClient::connect(&server.ws_url(), "bob").await.unwrap();
    alice.join("r1").await.unwrap();
    bob.join("r1").await.unwrap();
    alice.expect(EventKind::NewPeer).await.unwrap();

    bob.send(&Envelope::LeaveRoom {
        room: RoomId::from("r1"),
    })
    .await
    .unwrap();

    alice.expect(EventKind::PeerLeft).await.unwrap();
    // still connected, so bob can come back
    assert_eq!(bob.join("r1").await.unwrap(), vec![ParticipantId::from("alice")]);
}
