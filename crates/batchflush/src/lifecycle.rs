//! Start-once lifecycle shared by a dispatcher and its flush loop.

use crate::error::StartError;
use crate::invariants::debug_assert_stopped_from_running;
use crate::sync::{AtomicU8, Ordering};

/// Lifecycle state of a [`PeriodicDispatcher`](crate::PeriodicDispatcher).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DispatcherState {
    /// Constructed, loop not started.
    Idle = 0,
    /// Loop spawned and ticking.
    Running = 1,
    /// Loop exited after cancellation. Terminal.
    Stopped = 2,
}

impl DispatcherState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            _ => Self::Stopped,
        }
    }
}

/// Idle → Running → Stopped, with the first transition won by exactly one
/// caller.
pub struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(DispatcherState::Idle as u8),
        }
    }

    pub fn state(&self) -> DispatcherState {
        DispatcherState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Claims the single activation. Fails once any caller has claimed it,
    /// including after the loop has stopped.
    pub fn try_start(&self) -> Result<(), StartError> {
        self.state
            .compare_exchange(
                DispatcherState::Idle as u8,
                DispatcherState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(|_| StartError::AlreadyStarted)
    }

    /// Publishes `Stopped`, returning the state it replaced.
    pub fn stop(&self) -> DispatcherState {
        let previous = self
            .state
            .swap(DispatcherState::Stopped as u8, Ordering::AcqRel);
        debug_assert_stopped_from_running!(previous);
        DispatcherState::from_u8(previous)
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle").field("state", &self.state()).finish()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;

    #[test]
    fn test_single_activation_then_terminal_stop() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), DispatcherState::Idle);

        lifecycle.try_start().unwrap();
        assert_eq!(lifecycle.try_start(), Err(StartError::AlreadyStarted));
        assert_eq!(lifecycle.state(), DispatcherState::Running);

        assert_eq!(lifecycle.stop(), DispatcherState::Running);
        assert_eq!(lifecycle.state(), DispatcherState::Stopped);
        assert_eq!(lifecycle.try_start(), Err(StartError::AlreadyStarted));
    }
}
