//! Lock-free event queue between the timer set and the main loop.
//!
//! Events are produced by the [`TimerDelegate`](crate::app::ports::TimerDelegate)
//! the main loop hands to [`TimerSet::advance`](crate::scheduler::TimerSet::advance)
//! and consumed by the same loop, one at a time, in FIFO order.  A full
//! queue means the loop has stopped keeping up; the producer treats a
//! failed push as fatal.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ TimerSet    │────▶│  Event Queue │────▶│  Main Loop   │
//! │ (delegate)  │     │  (lock-free) │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::sync::atomic::{AtomicU8, Ordering};

use crate::app::ports::{TimerDelegate, TimerId};
use crate::termination::{terminate, ExitCode};

/// Ring size.  One slot stays empty, so at most `EVENT_QUEUE_CAP - 1`
/// events can be pending.  Power of 2 for efficient ring buffer modulo.
pub const EVENT_QUEUE_CAP: usize = 16;

/// System events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Event {
    // ── Sensor ────────────────────────────────────────────
    /// Sensor poll timer fired.
    MeasureSensorTick = 10,

    // ── Cloud ─────────────────────────────────────────────
    /// Telemetry publish timer fired.
    PublishTelemetryTick = 20,

    // ── CO2 alert ─────────────────────────────────────────
    /// Periodic buzzer check fired.
    Co2AlertCheckTick = 30,
    /// Buzzer pulse ended.
    Co2BuzzerOff = 31,

    // ── Status LED ────────────────────────────────────────
    /// Start of a blink.
    FlashLeds = 40,
    /// End of the lit part of a blink.
    FlashLedOff = 41,
}

impl Event {
    pub const fn timer(self) -> TimerId {
        match self {
            Self::MeasureSensorTick => TimerId::MeasureSensor,
            Self::PublishTelemetryTick => TimerId::PublishTelemetry,
            Self::Co2AlertCheckTick => TimerId::Co2AlertCheck,
            Self::Co2BuzzerOff => TimerId::Co2BuzzerOff,
            Self::FlashLeds => TimerId::FlashLeds,
            Self::FlashLedOff => TimerId::FlashLedOff,
        }
    }
}

impl From<TimerId> for Event {
    fn from(id: TimerId) -> Self {
        match id {
            TimerId::MeasureSensor => Self::MeasureSensorTick,
            TimerId::PublishTelemetry => Self::PublishTelemetryTick,
            TimerId::Co2AlertCheck => Self::Co2AlertCheckTick,
            TimerId::Co2BuzzerOff => Self::Co2BuzzerOff,
            TimerId::FlashLeds => Self::FlashLeds,
            TimerId::FlashLedOff => Self::FlashLedOff,
        }
    }
}

// ── Lock-free SPSC ring buffer ────────────────────────────────
//
// One producer, one consumer.  Head/tail are atomics; slots are atomics
// too so no `static mut` is needed.

static EVENT_HEAD: AtomicU8 = AtomicU8::new(0);
static EVENT_TAIL: AtomicU8 = AtomicU8::new(0);
static EVENT_BUFFER: [AtomicU8; EVENT_QUEUE_CAP] = [const { AtomicU8::new(0) }; EVENT_QUEUE_CAP];

/// Push an event into the queue.
/// Returns `false` if the queue is full (event dropped).
pub fn push_event(event: Event) -> bool {
    let head = EVENT_HEAD.load(Ordering::Relaxed);
    let tail = EVENT_TAIL.load(Ordering::Acquire);
    let next_head = (head + 1) % EVENT_QUEUE_CAP as u8;

    if next_head == tail {
        return false;
    }

    EVENT_BUFFER[head as usize].store(event as u8, Ordering::Relaxed);
    EVENT_HEAD.store(next_head, Ordering::Release);
    true
}

/// Pop the next event from the queue.
/// Returns `None` if the queue is empty.
pub fn pop_event() -> Option<Event> {
    loop {
        let tail = EVENT_TAIL.load(Ordering::Relaxed);
        let head = EVENT_HEAD.load(Ordering::Acquire);

        if tail == head {
            return None;
        }

        let raw = EVENT_BUFFER[tail as usize].load(Ordering::Relaxed);
        EVENT_TAIL.store((tail + 1) % EVENT_QUEUE_CAP as u8, Ordering::Release);

        // `push_event` never writes unknown codes.
        if let Some(event) = event_from_u8(raw) {
            return Some(event);
        }
    }
}

/// Drain all pending events into a callback.
/// Processes events in FIFO order.
pub fn drain_events(mut handler: impl FnMut(Event)) {
    while let Some(event) = pop_event() {
        handler(event);
    }
}

/// Check if the event queue is empty.
pub fn queue_is_empty() -> bool {
    let tail = EVENT_TAIL.load(Ordering::Relaxed);
    let head = EVENT_HEAD.load(Ordering::Acquire);
    tail == head
}

// ── Timer delegate ────────────────────────────────────────────

/// Bridges the timer set to the queue.  A full queue means an expiry
/// would be lost, which stops the application with
/// [`ExitCode::TimerEventDispatch`].
#[derive(Debug, Default)]
pub struct EventQueueDelegate;

impl TimerDelegate for EventQueueDelegate {
    fn on_timer_fired(&mut self, id: TimerId) {
        if !push_event(Event::from(id)) {
            terminate(ExitCode::TimerEventDispatch);
        }
    }
}

// ── Internal ──────────────────────────────────────────────────

fn event_from_u8(raw: u8) -> Option<Event> {
    match raw {
        10 => Some(Event::MeasureSensorTick),
        20 => Some(Event::PublishTelemetryTick),
        30 => Some(Event::Co2AlertCheckTick),
        31 => Some(Event::Co2BuzzerOff),
        40 => Some(Event::FlashLeds),
        41 => Some(Event::FlashLedOff),
        _ => None,
    }
}
