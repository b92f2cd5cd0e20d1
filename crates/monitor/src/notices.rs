//! Notice line state

use std::time::{Duration, Instant};

use contracts::Notice;

/// Newest notice with its expiry
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    default_ttl: Duration,
    current: Option<(String, Instant)>,
}

impl NoticeBoard {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            current: None,
        }
    }

    /// Replace the shown notice
    pub fn post(&mut self, notice: Notice, now: Instant) {
        let ttl = notice.ttl.unwrap_or(self.default_ttl);
        self.current = Some((notice.text, now + ttl));
    }

    /// Text to show at `now`, clearing it once expired
    pub fn active(&mut self, now: Instant) -> Option<&str> {
        if self.current.as_ref().is_some_and(|(_, until)| now >= *until) {
            self.current = None;
        }
        self.current.as_ref().map(|(text, _)| text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_wins_and_expires() {
        let t0 = Instant::now();
        let mut board = NoticeBoard::new(Duration::from_secs(3));
        board.post(Notice::new("Uploading"), t0);
        board.post(Notice::new("Upload ok"), t0 + Duration::from_secs(1));

        assert_eq!(board.active(t0 + Duration::from_secs(2)), Some("Upload ok"));
        assert_eq!(board.active(t0 + Duration::from_secs(4)), None);
    }

    #[test]
    fn test_explicit_ttl() {
        let t0 = Instant::now();
        let mut board = NoticeBoard::new(Duration::from_secs(3));
        board.post(Notice::new("Capture failed").with_ttl(Duration::from_millis(500)), t0);
        assert_eq!(board.active(t0 + Duration::from_millis(499)), Some("Capture failed"));
        assert_eq!(board.active(t0 + Duration::from_millis(500)), None);
    }
}
