use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gridlet_engine::core::SessionEvent;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Remembers the last seen file content.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: Option<String>,
}

impl ChangeDetector {
    /// Records `content` and reports whether it differs from the previous
    /// observation. The first observation is a baseline, not a change.
    pub fn observe(&mut self, content: &str) -> bool {
        if self.last.as_deref() == Some(content) {
            return false;
        }
        let baseline = self.last.is_none();
        self.last = Some(content.to_owned());
        !baseline
    }
}

/// Text the studio itself is about to write to the watched file.
///
/// Shared between the editor and the watcher so a preset load is not
/// reported back to the session as a user edit.
#[derive(Debug, Clone, Default)]
pub struct OwnWrites(Arc<Mutex<Option<String>>>);

impl OwnWrites {
    pub fn record(&self, text: &str) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(text.to_owned());
        }
    }

    pub fn forget(&self) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = None;
        }
    }

    /// Clears the pending write and reports whether `content` is it.
    pub fn claim(&self, content: &str) -> bool {
        match self.0.lock() {
            Ok(mut slot) => slot.take().is_some_and(|text| text == content),
            Err(_) => false,
        }
    }
}

/// Polls `path` and posts `ContentChanged` followed by `FocusLost` whenever
/// its content changes. A save is both an edit and a commit. Changes that
/// match a pending entry in `own_writes` are taken as the new baseline
/// without posting anything.
///
/// Returns when the session stops listening.
pub async fn watch_file(
    path: PathBuf,
    every: Duration,
    own_writes: OwnWrites,
    events: mpsc::UnboundedSender<SessionEvent>,
) {
    let mut detector = ChangeDetector::default();
    let mut poll = tokio::time::interval(every.max(Duration::from_millis(1)));
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        poll.tick().await;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) => {
                log::trace!("watch: cannot read {}: {e}", path.display());
                continue;
            }
        };
        if !detector.observe(&content) {
            continue;
        }
        if own_writes.claim(&content) {
            log::debug!("{} rewritten by the studio", path.display());
            continue;
        }
        log::debug!("{} changed", path.display());
        if events.send(SessionEvent::ContentChanged).is_err()
            || events.send(SessionEvent::FocusLost).is_err()
        {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_is_baseline() {
        let mut d = ChangeDetector::default();
        assert!(!d.observe("a"));
        assert!(!d.observe("a"));
        assert!(d.observe("b"));
        assert!(!d.observe("b"));
    }

    #[test]
    fn own_write_is_claimed_once() {
        let own = OwnWrites::default();
        assert!(!own.claim("preset"));
        own.record("preset");
        assert!(own.claim("preset"));
        assert!(!own.claim("preset"));
    }

    #[test]
    fn user_edit_clears_pending_write() {
        let own = OwnWrites::default();
        own.record("preset");
        assert!(!own.claim("typed by hand"));
        assert!(!own.claim("preset"));
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gridlet-watch-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[tokio::test]
    async fn posts_edit_then_commit() {
        let path = scratch("watched.js");
        std::fs::write(&path, "one").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let own = OwnWrites::default();
        let task = tokio::spawn(watch_file(path.clone(), Duration::from_millis(10), own, tx));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());

        std::fs::write(&path, "two").unwrap();
        let wait = Duration::from_secs(5);
        let first = tokio::time::timeout(wait, rx.recv()).await.unwrap();
        let second = tokio::time::timeout(wait, rx.recv()).await.unwrap();
        assert_eq!(first, Some(SessionEvent::ContentChanged));
        assert_eq!(second, Some(SessionEvent::FocusLost));

        drop(rx);
        std::fs::write(&path, "three").unwrap();
        tokio::time::timeout(wait, task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn preset_write_posts_nothing() {
        use crate::editor::FileEditor;
        use gridlet_engine::core::Editor;

        let path = scratch("preset-load.js");
        std::fs::write(&path, "one").unwrap();
        let mut editor = FileEditor::new(&path);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let every = Duration::from_millis(10);
        let task = tokio::spawn(watch_file(path.clone(), every, editor.own_writes(), tx));
        tokio::time::sleep(Duration::from_millis(100)).await;

        editor.set_value("function color(x, y) { return x ^ y }");
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_err());

        // A later save by the user is still reported.
        std::fs::write(&path, "two").unwrap();
        let wait = Duration::from_secs(5);
        let first = tokio::time::timeout(wait, rx.recv()).await.unwrap();
        assert_eq!(first, Some(SessionEvent::ContentChanged));

        drop(rx);
        std::fs::write(&path, "three").unwrap();
        tokio::time::timeout(wait, task).await.unwrap().unwrap();
    }
}
