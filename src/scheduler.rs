//! Timer set — the clock that drives the event loop.
//!
//! Three periodic timers (sensor poll, telemetry, CO2 alert check) and
//! three one-shots (buzzer off, status LED on / off).  The set is a plain
//! deadline table: the main loop asks for [`TimerSet::next_deadline`],
//! sleeps until then, and calls [`TimerSet::advance`].  Expired timers are
//! reported through a [`TimerDelegate`] which pushes them into the event
//! queue.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        TimerSet                              │
//! │                                                              │
//! │  ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌──────────┐   │
//! │  │ Measure   │  │ Publish   │  │ Co2Alert  │  │ One-shot │   │
//! │  │ 20 s      │  │ 30 s      │  │ 4 s       │  │ ×3       │   │
//! │  └─────┬─────┘  └─────┬─────┘  └─────┬─────┘  └─────┬────┘   │
//! │        └──────────────┴──────┬───────┴──────────────┘        │
//! │                              ▼                               │
//! │                       TimerDelegate                          │
//! │                 (main loop → Event queue)                    │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                ▼
//!                     AppService::handle_timer()
//! ```
//!
//! All times are milliseconds of monotonic uptime.

use log::{debug, info};

use crate::app::ports::{TimerDelegate, TimerPort};
use crate::config::SystemConfig;

pub use crate::app::ports::TimerId;

// ═══════════════════════════════════════════════════════════════
//  Timer slots
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    /// `Some` for periodic timers.
    period_ms: Option<u64>,
    /// Pending expiry, `None` when disarmed.
    deadline_ms: Option<u64>,
}

/// The timer engine.
///
/// Decoupled from the event system: expiries go to a [`TimerDelegate`]
/// so the set can be driven from tests with a fake clock.
pub struct TimerSet {
    slots: [Slot; TimerId::COUNT],
    /// Time of the last `start` / `advance`; one-shots are armed relative
    /// to it.
    now_ms: u64,
}

impl TimerSet {
    pub fn new(config: &SystemConfig) -> Self {
        let mut slots = [Slot::default(); TimerId::COUNT];
        slots[TimerId::MeasureSensor.index()].period_ms =
            Some(u64::from(config.measure_interval_secs) * 1000);
        slots[TimerId::PublishTelemetry.index()].period_ms =
            Some(u64::from(config.publish_interval_secs) * 1000);
        slots[TimerId::Co2AlertCheck.index()].period_ms =
            Some(u64::from(config.co2_alert_check_secs) * 1000);
        Self { slots, now_ms: 0 }
    }

    /// Arm every periodic timer one period after `now_ms`.
    pub fn start(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        for slot in &mut self.slots {
            if let Some(period) = slot.period_ms {
                slot.deadline_ms = Some(now_ms + period);
            }
        }
        info!("TimerSet: started at {}ms", now_ms);
    }

    /// Cancel every pending deadline.
    pub fn stop_all(&mut self) {
        for slot in &mut self.slots {
            slot.deadline_ms = None;
        }
        info!("TimerSet: stopped");
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.slots[id.index()].deadline_ms.is_some()
    }

    pub fn deadline(&self, id: TimerId) -> Option<u64> {
        self.slots[id.index()].deadline_ms
    }

    /// Earliest pending deadline, if any timer is armed.
    pub fn next_deadline(&self) -> Option<u64> {
        self.slots.iter().filter_map(|s| s.deadline_ms).min()
    }

    /// Fire every timer whose deadline is `<= now_ms`, earliest first.
    ///
    /// One-shots are disarmed before their callback.  Periodic timers are
    /// re-armed at `deadline + period`; if that is still not in the future
    /// the missed periods are dropped and the timer is re-armed at
    /// `now_ms + period`, so each periodic timer fires at most once per call.
    pub fn advance(&mut self, now_ms: u64, delegate: &mut dyn TimerDelegate) {
        self.now_ms = now_ms;
        while let Some(id) = self.earliest_expired(now_ms) {
            let slot = &mut self.slots[id.index()];
            match (slot.period_ms, slot.deadline_ms) {
                (Some(period), Some(deadline)) => {
                    let mut next = deadline + period;
                    if next <= now_ms {
                        debug!("TimerSet: {:?} missed periods, coalescing", id);
                        next = now_ms + period;
                    }
                    slot.deadline_ms = Some(next);
                }
                _ => slot.deadline_ms = None,
            }
            delegate.on_timer_fired(id);
        }
    }

    fn earliest_expired(&self, now_ms: u64) -> Option<TimerId> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.deadline_ms.filter(|&d| d <= now_ms).map(|d| (d, i)))
            .min()
            .and_then(|(_, i)| TimerId::from_index(i))
    }
}

impl TimerPort for TimerSet {
    fn arm_oneshot(&mut self, id: TimerId, delay_ms: u64) {
        self.slots[id.index()].deadline_ms = Some(self.now_ms + delay_ms);
    }

    fn disarm(&mut self, id: TimerId) {
        self.slots[id.index()].deadline_ms = None;
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    /// Test delegate that records fire events.
    struct RecordingDelegate {
        fires: Vec<TimerId>,
    }

    impl RecordingDelegate {
        fn new() -> Self {
            Self { fires: Vec::new() }
        }
    }

    impl TimerDelegate for RecordingDelegate {
        fn on_timer_fired(&mut self, id: TimerId) {
            self.fires.push(id);
        }
    }

    fn started() -> TimerSet {
        let mut t = TimerSet::new(&SystemConfig::default());
        t.start(0);
        t
    }

    #[test]
    fn periodic_fires_at_interval() {
        let mut t = started();
        let mut d = RecordingDelegate::new();

        t.advance(3_999, &mut d);
        assert!(d.fires.is_empty());

        t.advance(4_000, &mut d);
        assert_eq!(d.fires, vec![TimerId::Co2AlertCheck]);
        assert_eq!(t.deadline(TimerId::Co2AlertCheck), Some(8_000));
    }

    #[test]
    fn fires_in_deadline_order() {
        let mut t = started();
        let mut d = RecordingDelegate::new();
        t.arm_oneshot(TimerId::FlashLeds, 1_000);

        // 20 s: alert check (20 000), measure (20 000) and flash (1 000).
        t.advance(20_000, &mut d);
        assert_eq!(d.fires[0], TimerId::FlashLeds);
        assert!(d.fires.contains(&TimerId::MeasureSensor));
        assert!(!d.fires.contains(&TimerId::PublishTelemetry));
    }

    #[test]
    fn missed_periods_are_coalesced() {
        let mut t = started();
        let mut d = RecordingDelegate::new();

        // Stalled for 13 s: alert check missed 3 periods but fires once.
        t.advance(13_000, &mut d);
        assert_eq!(d.fires, vec![TimerId::Co2AlertCheck]);
        assert_eq!(t.deadline(TimerId::Co2AlertCheck), Some(17_000));
    }

    #[test]
    fn on_time_rearm_keeps_phase() {
        let mut t = started();
        let mut d = RecordingDelegate::new();
        // Late by 500 ms, but the next deadline is still in the future.
        t.advance(4_500, &mut d);
        assert_eq!(t.deadline(TimerId::Co2AlertCheck), Some(8_000));
    }

    #[test]
    fn oneshot_fires_once() {
        let mut t = started();
        let mut d = RecordingDelegate::new();
        t.arm_oneshot(TimerId::Co2BuzzerOff, 500);

        t.advance(499, &mut d);
        assert!(d.fires.is_empty());
        t.advance(500, &mut d);
        assert_eq!(d.fires, vec![TimerId::Co2BuzzerOff]);
        assert!(!t.is_armed(TimerId::Co2BuzzerOff));

        t.advance(3_999, &mut d);
        assert_eq!(d.fires.len(), 1);
    }

    #[test]
    fn rearm_replaces_pending_deadline() {
        let mut t = started();
        t.arm_oneshot(TimerId::FlashLedOff, 1_300);
        t.arm_oneshot(TimerId::FlashLedOff, 100);
        assert_eq!(t.deadline(TimerId::FlashLedOff), Some(100));
    }

    #[test]
    fn oneshot_is_relative_to_last_advance() {
        let mut t = started();
        let mut d = RecordingDelegate::new();
        t.advance(2_000, &mut d);
        t.arm_oneshot(TimerId::FlashLeds, 1_400);
        assert_eq!(t.deadline(TimerId::FlashLeds), Some(3_400));
    }

    #[test]
    fn disarm_and_stop_all() {
        let mut t = started();
        let mut d = RecordingDelegate::new();
        t.arm_oneshot(TimerId::FlashLeds, 10);
        t.disarm(TimerId::FlashLeds);
        t.advance(100, &mut d);
        assert!(d.fires.is_empty());

        t.stop_all();
        assert_eq!(t.next_deadline(), None);
        t.advance(1_000_000, &mut d);
        assert!(d.fires.is_empty());
    }

    #[test]
    fn next_deadline_is_earliest() {
        let mut t = started();
        assert_eq!(t.next_deadline(), Some(4_000));
        t.arm_oneshot(TimerId::FlashLeds, 1_000);
        assert_eq!(t.next_deadline(), Some(1_000));
    }
}
