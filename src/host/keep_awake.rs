// Keep-awake providers

use super::{KeepAwake, WakeHandle};
use crate::error::HostError;
use std::collections::HashMap;

const REASON: &str = "Metronome is playing";
const APP_NAME: &str = "MyMusic Metronome";
const APP_REVERSE_DOMAIN: &str = "io.github.mymusic.metronome";

/// Display inhibitor of the desktop session
///
/// Each acquire holds its own platform guard; dropping the guard (on release
/// or when the provider goes away) lets the display sleep again.
#[derive(Default)]
pub struct SystemKeepAwake {
    guards: HashMap<u64, keepawake::KeepAwake>,
    next_handle: u64,
}

impl SystemKeepAwake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a provider only if the session accepts an inhibitor right now
    pub fn detect() -> Result<Self, HostError> {
        let mut provider = Self::new();
        let handle = provider.acquire()?;
        provider.release(handle)?;
        Ok(provider)
    }

    /// Number of guards currently held
    pub fn held(&self) -> usize {
        self.guards.len()
    }
}

impl KeepAwake for SystemKeepAwake {
    fn acquire(&mut self) -> Result<WakeHandle, HostError> {
        let guard = keepawake::Builder::default()
            .display(true)
            .reason(REASON)
            .app_name(APP_NAME)
            .app_reverse_domain(APP_REVERSE_DOMAIN)
            .create()
            .map_err(|e| HostError::Failed(e.to_string()))?;

        let id = self.next_handle;
        self.next_handle += 1;
        self.guards.insert(id, guard);
        log::debug!("Display inhibitor {} acquired", id);
        Ok(WakeHandle(id))
    }

    fn release(&mut self, handle: WakeHandle) -> Result<(), HostError> {
        match self.guards.remove(&handle.0) {
            Some(guard) => {
                drop(guard);
                log::debug!("Display inhibitor {} released", handle.0);
                Ok(())
            }
            None => Err(HostError::Failed(format!(
                "unknown wake handle {}",
                handle.0
            ))),
        }
    }
}

/// Provider for hosts without a screen wake lock
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedKeepAwake;

impl KeepAwake for UnsupportedKeepAwake {
    fn acquire(&mut self) -> Result<WakeHandle, HostError> {
        Err(HostError::Unsupported("screen wake lock"))
    }

    fn release(&mut self, _handle: WakeHandle) -> Result<(), HostError> {
        Err(HostError::Unsupported("screen wake lock"))
    }
}
