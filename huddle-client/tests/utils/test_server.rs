use anyhow::Result;
use huddle_client::{ClientConfig, LoginTokenProvider, ReconnectPolicy, WsConnector};
use huddle_server::{Credential, ServerConfig, SignalingService, signaling_router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const USERNAME: &str = "ardhi";
pub const PASSWORD: &str = "123";

/// The real registry on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub service: SignalingService,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let config = ServerConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            credentials: vec![Credential::parse(&format!("{USERNAME}:{PASSWORD}")).expect("valid credential")],
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

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client settings for `participant` in `room` with a quick reconnect schedule.
    pub fn client_config(&self, room: &str, participant: &str) -> ClientConfig {
        let mut config = ClientConfig::new(self.base_url(), room, participant);
        config.reconnect = ReconnectPolicy {
            max_attempts: 5,
            delay: Duration::from_millis(50),
        };
        config
    }

    pub fn connector(&self, config: &ClientConfig) -> WsConnector {
        let tokens = LoginTokenProvider::new(config.http_url(), USERNAME, PASSWORD);
        WsConnector::new(config.ws_url(), Arc::new(tokens))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
