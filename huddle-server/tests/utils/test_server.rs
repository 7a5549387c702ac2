use anyhow::Result;
use huddle_server::{Credential, ServerConfig, SignalingService, signaling_router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Registry served over real sockets on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub service: SignalingService,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let config = ServerConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            credentials: vec![Credential::parse("ardhi:123").expect("valid credential")],
            ..Default::default()
        };
        let service = SignalingService::new(&config);
        let listener = TcpListener::bind(config.bind_addr).await?;
        let addr = listener.local_addr()?;

        let app = signaling_router(service.clone());
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            service,
            task,
        })
    }

    /// Websocket URL carrying a freshly issued one-time password for `ardhi`.
    pub fn ws_url(&self) -> String {
        self.ws_url_as("ardhi")
    }

    pub fn ws_url_as(&self, login: &str) -> String {
        format!("ws://{}/ws?otp={}", self.addr, self.service.otps().issue(login))
    }

    pub fn ws_url_without_otp(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
