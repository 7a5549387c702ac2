use serde::{Deserialize, Serialize};

/// Network path candidate as produced by the peer transport. Opaque to the core
/// apart from the basic shape check in [`Candidate::is_well_formed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub candidate: String,
    #[serde(rename = "sdpMid", default)]
    pub sdp_mid: Option<String>,
    #[serde(rename = "sdpMLineIndex", default)]
    pub sdp_m_line_index: Option<u16>,
}

impl Candidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
        }
    }

    pub fn with_mid(mut self, sdp_mid: impl Into<String>, sdp_m_line_index: u16) -> Self {
        self.sdp_mid = Some(sdp_mid.into());
        self.sdp_m_line_index = Some(sdp_m_line_index);
        self
    }

    /// A candidate needs a non-empty candidate line and something that ties it to a
    /// media section.
    pub fn is_well_formed(&self) -> bool {
        !self.candidate.trim().is_empty()
            && (self.sdp_mid.is_some() || self.sdp_m_line_index.is_some())
    }
}
