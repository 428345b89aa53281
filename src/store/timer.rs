use std::sync::Arc;

use tokio::sync::watch;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimerState {
    pub running: bool,
    /// Seconds in the current segment. Only advances while `running`.
    pub elapsed_time: u64,
    /// The "still working?" prompt is visible.
    pub open_confirm: bool,
}

/// Shared timer state. Cloning hands out another handle to the same state.
#[derive(Clone)]
pub struct TimerStore {
    tx: Arc<watch::Sender<TimerState>>,
}

impl Default for TimerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(TimerState::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn get(&self) -> TimerState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.tx.subscribe()
    }

    fn modify(&self, f: impl FnOnce(&mut TimerState)) {
        self.tx.send_if_modified(|state| {
            let before = *state;
            f(state);
            *state != before
        });
    }

    pub fn start(&self) {
        self.modify(|state| {
            *state = TimerState {
                running: true,
                ..TimerState::default()
            }
        });
    }

    /// Restores a segment that was already running on the host.
    pub fn resume(&self, elapsed_time: u64) {
        self.modify(|state| {
            *state = TimerState {
                running: true,
                elapsed_time,
                open_confirm: false,
            }
        });
    }

    /// Records a new elapsed sample and returns how far it moved. Samples that would move the
    /// counter backwards, or arrive while stopped, are ignored.
    pub fn advance(&self, elapsed_time: u64) -> u64 {
        let mut delta = 0;
        self.modify(|state| {
            if state.running && elapsed_time > state.elapsed_time {
                delta = elapsed_time - state.elapsed_time;
                state.elapsed_time = elapsed_time;
            }
        });
        delta
    }

    pub fn set_open_confirm(&self, open: bool) {
        self.modify(|state| state.open_confirm = open);
    }

    /// Back to idle. Returns the elapsed time the segment had reached.
    pub fn reset(&self) -> u64 {
        let elapsed = self.get().elapsed_time;
        self.modify(|state| *state = TimerState::default());
        elapsed
    }
}
