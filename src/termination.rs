//! Process termination bookkeeping.
//!
//! Any handler may request that the event loop stop; the first requested
//! [`ExitCode`] wins and becomes the process exit status.  State lives in
//! atomics so a signal / timer context can request termination too.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use log::error;

/// Distinct exit status for every fatal path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    TerminationSignal = 1,
    EventLoopFailed = 2,
    TimerEventDispatch = 3,
    MissingIdScope = 4,
    SensorInitFailed = 5,
    PeripheralInitFailed = 6,
    CloudInitFailed = 7,
}

impl ExitCode {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Success,
            1 => Self::TerminationSignal,
            2 => Self::EventLoopFailed,
            3 => Self::TimerEventDispatch,
            4 => Self::MissingIdScope,
            5 => Self::SensorInitFailed,
            6 => Self::PeripheralInitFailed,
            _ => Self::CloudInitFailed,
        }
    }

    /// Numeric process exit status.
    pub const fn code(self) -> i32 {
        self as i32
    }
}

static TERMINATION_REQUIRED: AtomicBool = AtomicBool::new(false);
static EXIT_CODE: AtomicU8 = AtomicU8::new(ExitCode::Success as u8);

/// Request loop exit with `code`.  Later requests do not overwrite the
/// first recorded code.
pub fn terminate(code: ExitCode) {
    if TERMINATION_REQUIRED
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
    {
        EXIT_CODE.store(code as u8, Ordering::Release);
        if code != ExitCode::Success {
            error!("Termination requested: {:?} (exit {})", code, code.code());
        }
    }
}

/// True once any context has called [`terminate`].
pub fn is_termination_required() -> bool {
    TERMINATION_REQUIRED.load(Ordering::Acquire)
}

/// The recorded exit code (`Success` if nobody asked to terminate).
pub fn exit_code() -> ExitCode {
    ExitCode::from_u8(EXIT_CODE.load(Ordering::Acquire))
}
