//! Timer set → event queue → termination, as the main loop wires them.

use co2monitor::app::ports::{TimerDelegate, TimerId};
use co2monitor::config::SystemConfig;
use co2monitor::events::{self, Event, EventQueueDelegate, EVENT_QUEUE_CAP};
use co2monitor::scheduler::TimerSet;
use co2monitor::termination::{self, ExitCode};

// The only test in this binary that touches the event queue or the
// termination state; both are process-wide.
#[test]
fn expiries_reach_the_queue_until_it_overflows() {
    let config = SystemConfig::default();
    let mut timers = TimerSet::new(&config);
    let mut delegate = EventQueueDelegate;

    timers.start(0);
    timers.advance(u64::from(config.co2_alert_check_secs) * 1000, &mut delegate);

    let mut seen = Vec::new();
    events::drain_events(|e| seen.push(e));
    assert_eq!(seen, vec![Event::Co2AlertCheckTick]);
    assert!(!termination::is_termination_required());

    // Nobody drains: the slot after the last free one is an overflow.
    for _ in 0..EVENT_QUEUE_CAP - 1 {
        delegate.on_timer_fired(TimerId::MeasureSensor);
    }
    assert!(!termination::is_termination_required());

    delegate.on_timer_fired(TimerId::PublishTelemetry);
    assert!(termination::is_termination_required());
    assert_eq!(termination::exit_code(), ExitCode::TimerEventDispatch);

    let mut pending = 0;
    events::drain_events(|e| {
        assert_eq!(e, Event::MeasureSensorTick);
        pending += 1;
    });
    assert_eq!(pending, EVENT_QUEUE_CAP - 1);
}
