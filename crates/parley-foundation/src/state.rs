use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use std::sync::Arc;

/// Run-state of the listen loop.
///
/// `Stopped` is both initial and terminal; the loop alternates between
/// `Listening` and `Paused` while running. There is exactly one logical
/// instance per loop, mutated only through the operations on
/// [`StateHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Listening,
    Paused,
}

/// Thread-safe handle to the run-state.
///
/// Cloning shares the underlying state. Transitions are plain flag writes
/// with eventual visibility; the loop reads the state once per iteration,
/// so a toggle raced against a dispatch costs at most one poll interval.
#[derive(Clone)]
pub struct StateHandle {
    state: Arc<RwLock<RunState>>,
    state_tx: Sender<RunState>,
    state_rx: Receiver<RunState>,
}

impl Default for StateHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StateHandle {
    pub fn new() -> Self {
        let (state_tx, state_rx) = crossbeam_channel::unbounded();
        Self {
            state: Arc::new(RwLock::new(RunState::Stopped)),
            state_tx,
            state_rx,
        }
    }

    pub fn current(&self) -> RunState {
        *self.state.read()
    }

    pub fn is_listening(&self) -> bool {
        self.current() == RunState::Listening
    }

    pub fn is_stopped(&self) -> bool {
        self.current() == RunState::Stopped
    }

    /// Transition to a new state, publishing it to subscribers.
    pub fn set(&self, new_state: RunState) {
        let mut current = self.state.write();
        if *current == new_state {
            return;
        }
        tracing::info!("Run-state transition: {:?} -> {:?}", *current, new_state);
        *current = new_state;
        let _ = self.state_tx.send(new_state);
    }

    /// Flip between `Listening` and `Paused`, returning the post-toggle
    /// "is listening" value.
    ///
    /// Note: this deliberately does not special-case `Stopped`. Toggling
    /// while stopped flips the flag even though no loop is running to
    /// observe it; a later `start()` then begins from whatever the flag
    /// says. Known quirk, kept as-is.
    pub fn toggle_listening(&self) -> bool {
        let mut current = self.state.write();
        let next = if *current == RunState::Listening {
            RunState::Paused
        } else {
            RunState::Listening
        };
        tracing::info!("Run-state toggle: {:?} -> {:?}", *current, next);
        *current = next;
        let _ = self.state_tx.send(next);
        next == RunState::Listening
    }

    /// Observe state transitions as they happen.
    pub fn subscribe(&self) -> Receiver<RunState> {
        self.state_rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_stopped() {
        let state = StateHandle::new();
        assert_eq!(state.current(), RunState::Stopped);
        assert!(state.is_stopped());
        assert!(!state.is_listening());
    }

    #[test]
    fn toggle_alternates_strictly() {
        let state = StateHandle::new();
        state.set(RunState::Listening);
        for i in 0..6 {
            let listening = state.toggle_listening();
            // First toggle pauses, second resumes, and so on.
            assert_eq!(listening, i % 2 == 1);
            assert_eq!(state.is_listening(), listening);
        }
    }

    #[test]
    fn toggle_returns_post_toggle_value() {
        let state = StateHandle::new();
        state.set(RunState::Paused);
        assert!(state.toggle_listening());
        assert_eq!(state.current(), RunState::Listening);
        assert!(!state.toggle_listening());
        assert_eq!(state.current(), RunState::Paused);
    }

    #[test]
    fn toggle_while_stopped_still_flips() {
        // Documented quirk: no Stopped check in toggle.
        let state = StateHandle::new();
        assert!(state.toggle_listening());
        assert_eq!(state.current(), RunState::Listening);
    }

    #[test]
    fn subscribers_see_transitions() {
        let state = StateHandle::new();
        let rx = state.subscribe();
        state.set(RunState::Listening);
        state.set(RunState::Paused);
        assert_eq!(rx.try_recv().unwrap(), RunState::Listening);
        assert_eq!(rx.try_recv().unwrap(), RunState::Paused);
    }

    #[test]
    fn set_same_state_is_silent() {
        let state = StateHandle::new();
        let rx = state.subscribe();
        state.set(RunState::Stopped);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn shared_across_clones() {
        let state = StateHandle::new();
        let other = state.clone();
        state.set(RunState::Listening);
        assert!(other.is_listening());
    }
}
