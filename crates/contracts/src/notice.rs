//! Notice - status text sent to the display owner

use std::time::Duration;

/// A short status message for the display's notice line
///
/// Tasks other than the sensing loop never write to the display; they post
/// a `Notice` through the notice channel instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    /// How long the notice stays on screen (`None` = configured default)
    pub ttl: Option<Duration>,
}

impl Notice {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}
