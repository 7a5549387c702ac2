#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

/// Description of one local capture track. Samples are produced elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: MediaKind,
}

impl LocalTrack {
    pub fn audio(id: impl Into<String>, stream_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stream_id: stream_id.into(),
            kind: MediaKind::Audio,
        }
    }

    pub fn video(id: impl Into<String>, stream_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stream_id: stream_id.into(),
            kind: MediaKind::Video,
        }
    }
}

/// Local capture capability. Once attached to a session, its tracks are added to
/// every peer connection before the local description is generated.
pub trait MediaSource: Send + Sync {
    fn tracks(&self) -> Vec<LocalTrack>;
}

/// A fixed set of tracks.
#[derive(Debug, Clone, Default)]
pub struct StaticMedia {
    tracks: Vec<LocalTrack>,
}

impl StaticMedia {
    pub fn new(tracks: Vec<LocalTrack>) -> Self {
        Self { tracks }
    }

    /// One audio and one video track in a single stream.
    pub fn camera_and_microphone(stream_id: &str) -> Self {
        Self::new(vec![
            LocalTrack::audio("audio", stream_id),
            LocalTrack::video("video", stream_id),
        ])
    }
}

impl MediaSource for StaticMedia {
    fn tracks(&self) -> Vec<LocalTrack> {
        self.tracks.clone()
    }
}
