use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::conversation::ConversationStatus;
use crate::errors::StatusUpdateError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerState {
    pub status: ConversationStatus,
    pub note: Option<String>,
}

/// Negotiation status and note for one conversation.
///
/// Status and note sit behind a single lock so readers never see a status
/// from one update paired with the note of another.
#[derive(Debug, Default)]
pub struct ConversationStatusTracker {
    state: Mutex<TrackerState>,
}

impl ConversationStatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(status: ConversationStatus, note: Option<String>) -> Self {
        Self { state: Mutex::new(TrackerState { status, note }) }
    }

    pub fn state(&self) -> TrackerState {
        self.lock().clone()
    }

    /// Applies a raw status literal as received from a tool call. An unknown
    /// literal leaves the state untouched.
    pub fn update_status(
        &self,
        status: &str,
        note: Option<&str>,
    ) -> Result<String, StatusUpdateError> {
        let status = status.trim().parse::<ConversationStatus>()?;
        Ok(self.set_status(status, note))
    }

    pub fn set_status(&self, status: ConversationStatus, note: Option<&str>) -> String {
        let note = note.filter(|note| !note.trim().is_empty());

        {
            let mut state = self.lock();
            state.status = status;
            if let Some(note) = note {
                state.note = Some(note.to_string());
            }
        }

        info!(
            event_name = "core.tracker.status_updated",
            status = status.as_str(),
            note_supplied = note.is_some(),
            "conversation status updated"
        );

        match note {
            Some(note) => {
                format!("Conversation status successfully updated to: {status}. Note: {note}")
            }
            None => format!("Conversation status successfully updated to: {status}"),
        }
    }

    // The pair is always written together, so a poisoned guard still holds a
    // consistent value.
    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;

    use super::{ConversationStatusTracker, TrackerState};
    use crate::domain::conversation::ConversationStatus;
    use crate::errors::StatusUpdateError;

    #[test]
    fn every_status_can_be_set_and_read_back() {
        let tracker = ConversationStatusTracker::with_state(
            ConversationStatus::InitialResearch,
            Some("kept".to_string()),
        );

        for status in ConversationStatus::ALL {
            tracker.update_status(status.as_str(), None).expect("valid status");
            assert_eq!(
                tracker.state(),
                TrackerState { status, note: Some("kept".to_string()) }
            );
        }
    }

    #[test]
    fn note_persists_across_updates_that_omit_it() {
        let tracker = ConversationStatusTracker::new();

        tracker.update_status("NEGOTIATION_TURN", Some("n1")).expect("first update");
        tracker.update_status("AWAITING_COUNTERPARTY_RESPONSE", None).expect("second update");

        assert_eq!(
            tracker.state(),
            TrackerState {
                status: ConversationStatus::AwaitingCounterpartyResponse,
                note: Some("n1".to_string()),
            }
        );
    }

    #[test]
    fn blank_note_does_not_clear_previous_note() {
        let tracker = ConversationStatusTracker::new();

        tracker.set_status(ConversationStatus::NegotiationTurn, Some("target 16.80/KG"));
        tracker.set_status(ConversationStatus::NegotiationTurn, Some("   "));

        assert_eq!(tracker.state().note.as_deref(), Some("target 16.80/KG"));
    }

    #[test]
    fn note_is_stored_verbatim() {
        let tracker = ConversationStatusTracker::new();

        tracker.set_status(ConversationStatus::NegotiationTurn, Some("  counter at 16.80/KG\n"));

        assert_eq!(tracker.state().note.as_deref(), Some("  counter at 16.80/KG\n"));
    }

    #[test]
    fn invalid_status_is_rejected_and_state_unchanged() {
        let tracker = ConversationStatusTracker::new();
        tracker.update_status("SPECIFICATION_CONFIRMATION", Some("grade confirmed")).expect("valid");
        let before = tracker.state();

        let error = tracker.update_status("NOT_A_REAL_STATUS", Some("ignored")).expect_err("invalid");

        assert_eq!(error, StatusUpdateError::InvalidStatus("NOT_A_REAL_STATUS".to_string()));
        assert_eq!(tracker.state(), before);
    }

    #[test]
    fn confirmation_embeds_status_and_note() {
        let tracker = ConversationStatusTracker::new();

        let with_note =
            tracker.set_status(ConversationStatus::FinalAgreementReady, Some("17.25/KG agreed"));
        let without_note = tracker.set_status(ConversationStatus::FinalAgreementReady, None);

        assert_eq!(
            with_note,
            "Conversation status successfully updated to: FINAL_AGREEMENT_READY. Note: 17.25/KG agreed"
        );
        assert_eq!(
            without_note,
            "Conversation status successfully updated to: FINAL_AGREEMENT_READY"
        );
    }

    #[test]
    fn terminal_status_can_regress() {
        let tracker = ConversationStatusTracker::new();

        tracker.set_status(ConversationStatus::ConversationClosedFailure, None);
        tracker.set_status(ConversationStatus::InitialResearch, None);

        assert_eq!(tracker.state().status, ConversationStatus::InitialResearch);
    }

    /// Minimal write/read surface shared by the real tracker and the
    /// split-lock control below.
    trait PairStore: Send + Sync + 'static {
        fn write(&self, status: ConversationStatus, note: &str);
        fn read(&self) -> (ConversationStatus, Option<String>);
    }

    impl PairStore for ConversationStatusTracker {
        fn write(&self, status: ConversationStatus, note: &str) {
            self.set_status(status, Some(note));
        }

        fn read(&self) -> (ConversationStatus, Option<String>) {
            let state = self.state();
            (state.status, state.note)
        }
    }

    /// Status and note behind separate locks, written in two critical
    /// sections.
    #[derive(Default)]
    struct SplitLockTracker {
        status: Mutex<ConversationStatus>,
        note: Mutex<Option<String>>,
    }

    impl PairStore for SplitLockTracker {
        fn write(&self, status: ConversationStatus, note: &str) {
            *self.status.lock().expect("status lock") = status;
            thread::yield_now();
            *self.note.lock().expect("note lock") = Some(note.to_string());
        }

        fn read(&self) -> (ConversationStatus, Option<String>) {
            let status = *self.status.lock().expect("status lock");
            let note = self.note.lock().expect("note lock").clone();
            (status, note)
        }
    }

    const WRITERS: [(ConversationStatus, &str); 2] = [
        (ConversationStatus::NegotiationTurn, "note-from-a"),
        (ConversationStatus::AwaitingCounterpartyResponse, "note-from-b"),
    ];

    fn is_consistent(status: ConversationStatus, note: Option<&str>) -> bool {
        matches!(
            (status, note),
            (ConversationStatus::InitialResearch, None)
                | (ConversationStatus::NegotiationTurn, Some("note-from-a"))
                | (ConversationStatus::AwaitingCounterpartyResponse, Some("note-from-b"))
        )
    }

    /// Two writers and one reader hammer `store`; returns how many reads saw
    /// a status paired with another writer's note. Stops early once a torn
    /// read has been seen.
    fn count_torn_reads<S: PairStore>(store: Arc<S>, iterations: usize) -> usize {
        let stop = Arc::new(AtomicBool::new(false));

        let writers: Vec<_> = WRITERS
            .into_iter()
            .map(|(status, note)| {
                let store = Arc::clone(&store);
                let stop = Arc::clone(&stop);
                thread::spawn(move || {
                    for _ in 0..iterations {
                        if stop.load(Ordering::Relaxed) {
                            break;
                        }
                        store.write(status, note);
                    }
                })
            })
            .collect();

        let reader = {
            let store = Arc::clone(&store);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut torn = 0;
                while !stop.load(Ordering::Relaxed) {
                    let (status, note) = store.read();
                    if !is_consistent(status, note.as_deref()) {
                        torn += 1;
                        stop.store(true, Ordering::Relaxed);
                    }
                    thread::yield_now();
                }
                torn
            })
        };

        for writer in writers {
            writer.join().expect("writer thread");
        }
        stop.store(true, Ordering::Relaxed);
        let torn = reader.join().expect("reader thread");

        // A tear left in place after the last write still counts.
        let (status, note) = store.read();
        torn + usize::from(!is_consistent(status, note.as_deref()))
    }

    #[test]
    fn concurrent_updates_never_tear_status_and_note() {
        let tracker = Arc::new(ConversationStatusTracker::new());

        assert_eq!(count_torn_reads(tracker, 20_000), 0);
    }

    #[test]
    fn split_lock_tracker_is_observed_tearing() {
        let tracker = Arc::new(SplitLockTracker::default());

        assert!(count_torn_reads(tracker, 200_000) > 0);
    }
}
