//! CO2 Monitor Firmware — Main Entry Point
//!
//! Hexagonal architecture with timer-driven, event-queue execution.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter      LogEventSink   NvsAdapter  MonotonicClock│
//! │  (Sensor+Indicator)   (EventSink)    (Config)                  │
//! │  WifiAdapter          IotHubClient                             │
//! │  (Connectivity)       (CloudPort, twin inbox)                  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  HVAC · CO2 alert · telemetry · twin                   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  TimerSet (delegate-driven) → event queue → handle_timer       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;
use log::{error, info, warn};

use co2monitor::adapters::hardware::HardwareAdapter;
use co2monitor::adapters::iot_hub::IotHubClient;
use co2monitor::adapters::log_sink::LogEventSink;
use co2monitor::adapters::nvs::{self, NvsAdapter};
use co2monitor::adapters::time::MonotonicClock;
use co2monitor::adapters::wifi::{ConnectivityPort, WifiAdapter};
use co2monitor::app::commands::AppCommand;
use co2monitor::app::ports::TimerId;
use co2monitor::app::service::AppService;
use co2monitor::cloud::inbox;
use co2monitor::config::{self, SystemConfig};
use co2monitor::drivers::hw_init::{self, HwInitError};
use co2monitor::drivers::watchdog::{self, Watchdog};
use co2monitor::events::{self, EventQueueDelegate};
use co2monitor::pins;
use co2monitor::scheduler::TimerSet;
use co2monitor::sensors::scd30::Scd30;
use co2monitor::sensors::Co2Sensor;
use co2monitor::termination::{self, terminate, ExitCode};

/// Upper bound on one idle wait so WiFi / MQTT polling and the watchdog
/// keep running when no timer is due.
const MAX_IDLE_MS: u64 = 100;

/// Record `code` as the exit status when `result` is an error.
fn or_exit<T, E>(result: core::result::Result<T, E>, code: ExitCode) -> Result<T>
where
    E: Into<anyhow::Error>,
{
    result.map_err(|e| {
        terminate(code);
        e.into()
    })
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  CO2 Monitor v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    if let Err(e) = run() {
        error!("{:#}", e);
        terminate(ExitCode::EventLoopFailed);
    }

    let code = termination::exit_code();
    info!("Application exiting (code {})", code.code());
    std::process::exit(code.code());
}

fn run() -> Result<()> {
    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = match NvsAdapter::new() {
        Ok(nvs) => nvs::load_or_reset(&nvs),
        Err(e) => {
            warn!("NVS unavailable ({}), using defaults", e);
            SystemConfig::default()
        }
    };
    if let Err(msg) = config::validate_config(&config) {
        terminate(ExitCode::EventLoopFailed);
        anyhow::bail!("invalid config: {}", msg);
    }
    if let Err(msg) = config::validate_connection(&config.connection) {
        terminate(ExitCode::MissingIdScope);
        anyhow::bail!("connection config: {}", msg);
    }

    // ── 3. Peripherals ────────────────────────────────────────
    or_exit(
        hw_init::init_gpio_outputs(&pins::OUTPUT_PINS).map_err(co2monitor::Error::from),
        ExitCode::PeripheralInitFailed,
    )?;
    let peripherals = or_exit(Peripherals::take(), ExitCode::PeripheralInitFailed)?;
    // SDA / SCL are fixed by the board: see pins::I2C_SDA_GPIO / I2C_SCL_GPIO.
    let i2c = or_exit(
        I2cDriver::new(
            peripherals.i2c0,
            peripherals.pins.gpio21,
            peripherals.pins.gpio22,
            &I2cConfig::new().baudrate(Hertz(pins::I2C_BAUDRATE_HZ)),
        )
        .map_err(|e| {
            error!("I2C: {}", e);
            co2monitor::Error::from(HwInitError::I2cInitFailed)
        }),
        ExitCode::PeripheralInitFailed,
    )?;

    // ── 4. CO2 sensor ─────────────────────────────────────────
    let mut sensor = Co2Sensor::new(Scd30::new(i2c, FreeRtos));
    or_exit(
        sensor.initialise(&config).map_err(co2monitor::Error::from),
        ExitCode::SensorInitFailed,
    )?;
    let mut hw = HardwareAdapter::new(sensor);

    // ── 5. Network + cloud ────────────────────────────────────
    let sysloop = or_exit(EspSystemEventLoop::take(), ExitCode::PeripheralInitFailed)?;
    let nvs_partition = or_exit(EspDefaultNvsPartition::take(), ExitCode::PeripheralInitFailed)?;
    let esp_wifi = or_exit(
        EspWifi::new(peripherals.modem, sysloop, Some(nvs_partition)),
        ExitCode::PeripheralInitFailed,
    )?;
    let mut wifi = WifiAdapter::new(esp_wifi);
    match wifi.set_credentials(&config.connection.wifi_ssid, &config.connection.wifi_password) {
        Ok(()) => {
            if let Err(e) = wifi.connect() {
                warn!("WiFi: initial connect failed ({}), retrying in background", e);
            }
        }
        Err(e) => warn!("WiFi: {}", e),
    }

    let mut cloud = or_exit(
        IotHubClient::new(&config.connection),
        ExitCode::CloudInitFailed,
    )?;

    // ── 6. Timers + app service ───────────────────────────────
    let clock = MonotonicClock::new();
    let watchdog = Watchdog::new(watchdog::DEFAULT_TIMEOUT_MS);
    let mut sink = LogEventSink::new();
    let mut timers = TimerSet::new(&config);
    let mut delegate = EventQueueDelegate;
    let mut app = AppService::new(&config);

    timers.start(clock.now_ms());
    app.start(&mut hw, &mut timers, &mut sink);
    // Sample once now rather than waiting a full measure period.
    app.handle_timer(TimerId::MeasureSensor, &mut hw, &mut cloud, &mut timers, &mut sink);

    info!("System ready. Entering event loop.");

    // ── 7. Event loop ─────────────────────────────────────────
    while !termination::is_termination_required() {
        let now = clock.now_ms();
        let wait = timers
            .next_deadline()
            .map_or(MAX_IDLE_MS, |d| d.saturating_sub(now).min(MAX_IDLE_MS));
        if wait > 0 {
            FreeRtos::delay_ms(wait as u32);
        }

        let now = clock.now_ms();
        timers.advance(now, &mut delegate);

        inbox::drain(|patch| {
            app.handle_command(AppCommand::ApplyDesired(patch), &mut hw, &mut cloud, &mut sink);
        });

        events::drain_events(|event| {
            app.handle_timer(event.timer(), &mut hw, &mut cloud, &mut timers, &mut sink);
        });

        wifi.poll(now);
        cloud.set_network_ready(wifi.is_connected());
        cloud.poll();

        watchdog.feed();
    }

    // ── 8. Shutdown ───────────────────────────────────────────
    timers.stop_all();
    hw.shutdown();
    wifi.disconnect();
    Ok(())
}
