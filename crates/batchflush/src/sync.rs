//! Synchronization primitives, swapped for loom's model-checked versions
//! under `--features loom`.

#[cfg(feature = "loom")]
pub(crate) use loom::sync::{
    atomic::{AtomicU8, Ordering},
    Mutex, MutexGuard,
};

#[cfg(not(feature = "loom"))]
pub(crate) use std::sync::{
    atomic::{AtomicU8, Ordering},
    Mutex, MutexGuard,
};
