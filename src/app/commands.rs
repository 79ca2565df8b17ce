//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (today only the
//! cloud twin) that the [`AppService`](super::service::AppService)
//! interprets and acts upon.

use crate::cloud::twin::DesiredPatch;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Apply a desired-properties patch (full twin or incremental).
    ApplyDesired(DesiredPatch),
}
