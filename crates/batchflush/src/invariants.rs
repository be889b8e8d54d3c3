//! Debug assertion macros for dispatcher invariants.
//!
//! Only active in debug builds; they compile to nothing in release.

/// Assert that the handler is only ever given a non-empty batch.
///
/// Used in: `FlushLoop::tick()` right before invoking the handler
macro_rules! debug_assert_batch_not_empty {
    ($batch:expr) => {
        debug_assert!(
            !$batch.is_empty(),
            "handler invoked with an empty batch"
        )
    };
}

/// Assert that the loop only stops from the `Running` state.
///
/// **Invariant**: Idle → Running → Stopped, never backwards
///
/// Used in: `Lifecycle::stop()`
macro_rules! debug_assert_stopped_from_running {
    ($previous:expr) => {
        debug_assert_eq!(
            $previous,
            $crate::lifecycle::DispatcherState::Running as u8,
            "dispatch loop stopped from a state other than Running"
        )
    };
}

pub(crate) use debug_assert_batch_not_empty;
pub(crate) use debug_assert_stopped_from_running;
