//! Change detection.
//!
//! The engine needs to know when document content changed so it can
//! close the current undo checkpoint. Hosts that can watch the tree
//! report mutations directly; others only forward key-ups, and the
//! engine guesses from those.

use crate::config::Capabilities;

use super::Editor;

/// A host notification the engine may interpret as "content changed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSignal {
    /// The document revision counter after a reported mutation.
    TreeRevision(u64),
    /// A key was released.
    KeyUp {
        code: u32,
        ctrl: bool,
        meta: bool,
        alt: bool,
    },
}

/// Strategy for deciding when the document content changed.
pub trait ChangeNotifier {
    /// True when the signal means the document changed.
    fn observe(&mut self, signal: ChangeSignal) -> bool;

    /// Fold an engine-initiated change into the baseline so it is not
    /// reported back as a host change.
    fn acknowledge(&mut self, revision: u64);
}

/// Tracks the revision counter on hosts that report mutations.
#[derive(Debug, Default)]
pub struct RevisionWatcher {
    last_seen: u64,
}

impl ChangeNotifier for RevisionWatcher {
    fn observe(&mut self, signal: ChangeSignal) -> bool {
        match signal {
            ChangeSignal::TreeRevision(revision) if revision != self.last_seen => {
                self.last_seen = revision;
                true
            }
            _ => false,
        }
    }

    fn acknowledge(&mut self, revision: u64) {
        self.last_seen = revision;
    }
}

/// Guesses changes from key-ups: modifier chords, lone modifier keys
/// and pure navigation keys do not count.
#[derive(Debug, Default)]
pub struct KeyUpHeuristic;

impl ChangeNotifier for KeyUpHeuristic {
    fn observe(&mut self, signal: ChangeSignal) -> bool {
        match signal {
            ChangeSignal::KeyUp {
                code,
                ctrl,
                meta,
                alt,
            } => {
                !ctrl
                    && !meta
                    && !alt
                    && !(16..=20).contains(&code)
                    && !(33..=45).contains(&code)
            }
            _ => false,
        }
    }

    fn acknowledge(&mut self, _revision: u64) {}
}

pub(crate) fn notifier_for(caps: &Capabilities) -> Box<dyn ChangeNotifier> {
    if caps.can_observe_mutations {
        Box::new(RevisionWatcher::default())
    } else {
        Box::new(KeyUpHeuristic)
    }
}

impl Editor {
    /// Host-reported tree mutation (content edited outside the
    /// engine's own operations).
    pub fn note_mutation(&mut self) {
        let signal = ChangeSignal::TreeRevision(self.tree.revision());
        if self.notifier.observe(signal) {
            self.doc_was_changed();
        }
    }

    /// Host-reported key release. On hosts without mutation reporting
    /// this is the change heuristic.
    pub fn note_key_up(&mut self, code: u32, ctrl: bool, meta: bool, alt: bool) {
        let signal = ChangeSignal::KeyUp {
            code,
            ctrl,
            meta,
            alt,
        };
        if self.notifier.observe(signal) {
            self.doc_was_changed();
        }
    }

    /// Report an engine-initiated mutation through whichever strategy
    /// the host capabilities selected.
    pub(crate) fn note_change(&mut self) {
        if self.caps.can_observe_mutations {
            self.note_mutation();
        } else {
            self.doc_was_changed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_watcher_fires_once_per_revision() {
        let mut watcher = RevisionWatcher::default();
        assert!(watcher.observe(ChangeSignal::TreeRevision(3)));
        assert!(!watcher.observe(ChangeSignal::TreeRevision(3)));
        assert!(watcher.observe(ChangeSignal::TreeRevision(4)));
    }

    #[test]
    fn acknowledged_revisions_are_not_reported() {
        let mut watcher = RevisionWatcher::default();
        watcher.acknowledge(7);
        assert!(!watcher.observe(ChangeSignal::TreeRevision(7)));
        assert!(watcher.observe(ChangeSignal::TreeRevision(8)));
    }

    #[test]
    fn key_up_heuristic_ignores_modifiers_and_navigation() {
        let mut h = KeyUpHeuristic;
        let key = |code| ChangeSignal::KeyUp {
            code,
            ctrl: false,
            meta: false,
            alt: false,
        };
        assert!(h.observe(key(65)));
        assert!(h.observe(key(46)));
        assert!(!h.observe(key(16)));
        assert!(!h.observe(key(37)));
        assert!(!h.observe(ChangeSignal::KeyUp {
            code: 65,
            ctrl: true,
            meta: false,
            alt: false,
        }));
        assert!(!h.observe(ChangeSignal::TreeRevision(1)));
    }
}
