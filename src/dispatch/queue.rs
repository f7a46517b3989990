//! UI-affine event queue.
//!
//! Workers post events through a cloneable [`UiHandle`] and never wait.
//! The single [`UiExecutor`] lives on the thread that created it and is
//! the only place actions and notices run.

use super::{Action, GestureConfirmed, Notice, NoticeSink};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Work for the UI context.
#[derive(Debug, Clone)]
pub enum UiEvent {
    /// The gesture was confirmed; perform the action.
    GestureConfirmed(GestureConfirmed),
    /// Show a message to the user.
    Notice(Notice),
}

/// Non-blocking sender into the UI queue.
#[derive(Debug, Clone)]
pub struct UiHandle {
    tx: Sender<UiEvent>,
}

impl UiHandle {
    /// Enqueues an event. Returns false if the executor is gone.
    pub fn post(&self, event: UiEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Schedules the action for a confirmation.
    pub fn confirm(&self, event: GestureConfirmed) -> bool {
        self.post(UiEvent::GestureConfirmed(event))
    }

    /// Schedules a notice.
    pub fn notify(&self, notice: Notice) -> bool {
        self.post(UiEvent::Notice(notice))
    }

    /// Events waiting to run.
    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}

/// Runs queued UI events on the owning thread.
pub struct UiExecutor {
    rx: Receiver<UiEvent>,
    action: Box<dyn Action>,
    notices: Box<dyn NoticeSink>,
    dispatched: u64,
    failed: u64,
}

/// Creates a connected handle/executor pair.
pub fn ui_queue(action: Box<dyn Action>, notices: Box<dyn NoticeSink>) -> (UiHandle, UiExecutor) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (
        UiHandle { tx },
        UiExecutor {
            rx,
            action,
            notices,
            dispatched: 0,
            failed: 0,
        },
    )
}

impl UiExecutor {
    /// Runs everything currently queued and returns how many events ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.handle(event);
            ran += 1;
        }
        ran
    }

    /// Waits up to `timeout` for the first event, then drains the queue.
    pub fn run_for(&mut self, timeout: Duration) -> usize {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => {
                self.handle(event);
                1 + self.run_pending()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    /// Actions performed successfully.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Actions that failed.
    pub fn failed(&self) -> u64 {
        self.failed
    }

    fn handle(&mut self, event: UiEvent) {
        match event {
            UiEvent::GestureConfirmed(confirmed) => match self.action.perform(&confirmed) {
                Ok(()) => {
                    self.dispatched += 1;
                    tracing::info!(
                        sequence = confirmed.sequence,
                        action = %self.action.describe(),
                        "Action dispatched"
                    );
                }
                Err(e) => {
                    self.failed += 1;
                    tracing::warn!(error = %e, "Action failed");
                    self.notices.show(&Notice::error(e.to_string()));
                }
            },
            UiEvent::Notice(notice) => self.notices.show(&notice),
        }
    }
}

impl std::fmt::Debug for UiExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiExecutor")
            .field("action", &self.action.describe())
            .field("queued", &self.rx.len())
            .field("dispatched", &self.dispatched)
            .field("failed", &self.failed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ConfidenceScore;
    use crate::dispatch::{DispatchError, NoticeKind};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recording {
        seen: Rc<RefCell<Vec<u64>>>,
        fail: bool,
    }

    impl Action for Recording {
        fn perform(&mut self, event: &GestureConfirmed) -> Result<(), DispatchError> {
            if self.fail {
                return Err(DispatchError::InvalidUrl("nowhere".into()));
            }
            self.seen.borrow_mut().push(event.sequence);
            Ok(())
        }

        fn describe(&self) -> String {
            "record".into()
        }
    }

    #[derive(Default)]
    struct Collect(Rc<RefCell<Vec<Notice>>>);

    impl NoticeSink for Collect {
        fn show(&mut self, notice: &Notice) {
            self.0.borrow_mut().push(notice.clone());
        }
    }

    fn score() -> ConfidenceScore {
        ConfidenceScore::new(0.95).unwrap()
    }

    #[test]
    fn test_events_run_only_when_executor_runs() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (handle, mut executor) = ui_queue(
            Box::new(Recording { seen: Rc::clone(&seen), fail: false }),
            Box::new(Collect::default()),
        );

        assert!(handle.confirm(GestureConfirmed::new(1, score())));
        assert!(handle.confirm(GestureConfirmed::new(2, score())));
        assert!(seen.borrow().is_empty());
        assert_eq!(handle.pending(), 2);

        assert_eq!(executor.run_pending(), 2);
        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(executor.dispatched(), 2);
    }

    #[test]
    fn test_failed_action_becomes_notice() {
        let notices = Rc::new(RefCell::new(Vec::new()));
        let (handle, mut executor) = ui_queue(
            Box::new(Recording { seen: Rc::default(), fail: true }),
            Box::new(Collect(Rc::clone(&notices))),
        );

        handle.confirm(GestureConfirmed::new(1, score()));
        executor.run_pending();

        assert_eq!(executor.failed(), 1);
        assert_eq!(notices.borrow().len(), 1);
        assert_eq!(notices.borrow()[0].kind, NoticeKind::Error);
    }

    #[test]
    fn test_run_for_times_out_when_idle() {
        let (_handle, mut executor) = ui_queue(
            Box::new(Recording { seen: Rc::default(), fail: false }),
            Box::new(Collect::default()),
        );
        assert_eq!(executor.run_for(Duration::from_millis(10)), 0);
    }

    #[test]
    fn test_post_after_executor_dropped() {
        let (handle, executor) = ui_queue(
            Box::new(Recording { seen: Rc::default(), fail: false }),
            Box::new(Collect::default()),
        );
        drop(executor);
        assert!(!handle.notify(Notice::info("gone")));
    }
}
