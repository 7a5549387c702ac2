use crate::peer::MediaSource;
use std::sync::Arc;
use tokio::sync::mpsc;

pub(crate) enum SessionCommand {
    AttachMedia(Arc<dyn MediaSource>),
    SendMessage(String),
    Leave,
    Shutdown,
}

/// Cloneable remote control for a running [`ClientSession`](crate::ClientSession).
#[derive(Clone)]
pub struct SessionHandle {
    pub(crate) commands: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Returns `false` if the session is no longer running.
    pub async fn attach_media(&self, media: Arc<dyn MediaSource>) -> bool {
        self.commands
            .send(SessionCommand::AttachMedia(media))
            .await
            .is_ok()
    }

    /// Queues chat text for the room. Returns `false` if the session is no longer running.
    pub async fn send_message(&self, message: impl Into<String>) -> bool {
        self.commands
            .send(SessionCommand::SendMessage(message.into()))
            .await
            .is_ok()
    }

    pub async fn leave(&self) -> bool {
        self.commands.send(SessionCommand::Leave).await.is_ok()
    }

    pub async fn shutdown(&self) -> bool {
        self.commands.send(SessionCommand::Shutdown).await.is_ok()
    }
}
