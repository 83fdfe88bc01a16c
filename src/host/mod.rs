// Host collaborators - Optional platform features behind small traits
//
// Every failure here is best effort: callers log it and carry on.

#[cfg(any(test, feature = "test-support"))]
pub mod fake;
pub mod keep_awake;
pub mod storage;

use crate::error::HostError;

/// Opaque handle for an acquired keep-awake lock
#[derive(Debug, PartialEq, Eq)]
pub struct WakeHandle(pub u64);

/// Keeps the display awake while playing
pub trait KeepAwake {
    fn acquire(&mut self) -> Result<WakeHandle, HostError>;

    fn release(&mut self, handle: WakeHandle) -> Result<(), HostError>;
}

/// Durable per-device key/value store
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), HostError>;
}

pub use keep_awake::{SystemKeepAwake, UnsupportedKeepAwake};
pub use storage::{FileStorage, MemoryStorage};
