//! Desired-patch hand-off from the MQTT callback to the main loop.
//!
//! Uses an `embassy-sync` bounded channel so the MQTT event task and the
//! main loop share it without heap allocation.
//!
//! ```text
//! ┌──────────────┐  DesiredPatch  ┌──────────────┐
//! │ MQTT event   │───────────────▶│  Main loop    │
//! │ callback     │                │  (consumer)   │
//! └──────────────┘                └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use super::twin::DesiredPatch;

/// Pending patches.  A full twin GET restores any dropped state.
const INBOX_DEPTH: usize = 4;

pub static TWIN_INBOX: Channel<CriticalSectionRawMutex, DesiredPatch, INBOX_DEPTH> = Channel::new();

/// Queue a patch for the main loop.  Returns `false` (and logs) when the
/// inbox is full and the patch was dropped.
pub fn deliver(patch: DesiredPatch) -> bool {
    if TWIN_INBOX.try_send(patch).is_err() {
        warn!("Twin inbox full, dropping desired patch {:?}", patch.version);
        return false;
    }
    true
}

/// Take every pending patch, oldest first.
pub fn drain(mut handler: impl FnMut(DesiredPatch)) {
    while let Ok(patch) = TWIN_INBOX.try_receive() {
        handler(patch);
    }
}
