//! Sensirion SCD30 NDIR CO2 sensor over `embedded-hal` 1.0 I2C.
//!
//! Wire format: every command is a 16-bit big-endian word.  Every 16-bit
//! data word (in either direction) is followed by a CRC-8 (poly 0x31,
//! init 0xFF).  Commands that return data need a pause between the write
//! and the read, and the SCD30 does not support repeated-start, so reads are
//! issued as a separate `write` then `read` rather than `write_read`.
//!
//! ```text
//! read_measurement (0x0300) response, 18 bytes:
//!   CO2[31:16] crc CO2[15:0] crc  T[31:16] crc T[15:0] crc  RH[31:16] crc RH[15:0] crc
//! ```

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::Measurement;

/// Fixed 7-bit I2C address.
pub const SCD30_ADDRESS: u8 = 0x61;

/// Pause between a command write and its response read.
const COMMAND_DELAY_MS: u32 = 3;

// ── Command words ─────────────────────────────────────────────

pub const CMD_START_PERIODIC_MEASUREMENT: u16 = 0x0010;
pub const CMD_STOP_PERIODIC_MEASUREMENT: u16 = 0x0104;
pub const CMD_READ_MEASUREMENT: u16 = 0x0300;
pub const CMD_SET_MEASUREMENT_INTERVAL: u16 = 0x4600;
pub const CMD_AUTO_SELF_CALIBRATION: u16 = 0x5306;
pub const CMD_READ_FIRMWARE_VERSION: u16 = 0xD100;

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scd30Error<E> {
    /// The underlying bus transaction failed.
    I2c(E),
    /// A received data word failed its CRC-8 check.
    Crc,
}

impl<E: fmt::Debug> fmt::Display for Scd30Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I2c(e) => write!(f, "I2C error: {:?}", e),
            Self::Crc => write!(f, "CRC mismatch"),
        }
    }
}

impl<E> From<Scd30Error<E>> for crate::error::SensorError {
    fn from(e: Scd30Error<E>) -> Self {
        match e {
            Scd30Error::I2c(_) => Self::Bus,
            Scd30Error::Crc => Self::Crc,
        }
    }
}

/// Sensirion CRC-8: polynomial 0x31, init 0xFF, no final XOR.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for byte in data {
        crc ^= byte;
        for _ in 0..8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ 0x31;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

// ── Driver ────────────────────────────────────────────────────

pub struct Scd30<I2C, D> {
    i2c: I2C,
    delay: D,
}

impl<I2C, D> Scd30<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self { i2c, delay }
    }

    /// Give the bus and delay back (e.g. to share the bus after shutdown).
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// Block for `ms` milliseconds using the driver's delay provider.
    pub fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// Read the firmware version.  Used as a presence check.
    pub fn probe(&mut self) -> Result<u16, Scd30Error<I2C::Error>> {
        let mut buf = [0u8; 3];
        self.read_words(CMD_READ_FIRMWARE_VERSION, &mut buf)?;
        Ok(u16::from_be_bytes([buf[0], buf[1]]))
    }

    pub fn automatic_self_calibration(&mut self) -> Result<bool, Scd30Error<I2C::Error>> {
        let mut buf = [0u8; 3];
        self.read_words(CMD_AUTO_SELF_CALIBRATION, &mut buf)?;
        Ok(u16::from_be_bytes([buf[0], buf[1]]) != 0)
    }

    pub fn set_automatic_self_calibration(
        &mut self,
        enabled: bool,
    ) -> Result<(), Scd30Error<I2C::Error>> {
        self.command_with_arg(CMD_AUTO_SELF_CALIBRATION, u16::from(enabled))
    }

    /// Sensor-internal sampling interval, 2..=1800 s.
    pub fn set_measurement_interval(&mut self, secs: u16) -> Result<(), Scd30Error<I2C::Error>> {
        self.command_with_arg(CMD_SET_MEASUREMENT_INTERVAL, secs)
    }

    /// Start continuous measurement.  `ambient_pressure_mbar == 0` turns
    /// pressure compensation off.
    pub fn start_periodic_measurement(
        &mut self,
        ambient_pressure_mbar: u16,
    ) -> Result<(), Scd30Error<I2C::Error>> {
        self.command_with_arg(CMD_START_PERIODIC_MEASUREMENT, ambient_pressure_mbar)
    }

    pub fn stop_periodic_measurement(&mut self) -> Result<(), Scd30Error<I2C::Error>> {
        self.command(CMD_STOP_PERIODIC_MEASUREMENT)
    }

    /// Read the latest CO2 (ppm), temperature (°C) and humidity (%RH).
    pub fn read_measurement(&mut self) -> Result<Measurement, Scd30Error<I2C::Error>> {
        let mut buf = [0u8; 18];
        self.read_words(CMD_READ_MEASUREMENT, &mut buf)?;
        Ok(Measurement {
            co2_ppm: be_f32(&buf[0..6]),
            temperature_c: be_f32(&buf[6..12]),
            humidity_pct: be_f32(&buf[12..18]),
        })
    }

    // ── Internal ──────────────────────────────────────────────

    fn command(&mut self, cmd: u16) -> Result<(), Scd30Error<I2C::Error>> {
        self.i2c
            .write(SCD30_ADDRESS, &cmd.to_be_bytes())
            .map_err(Scd30Error::I2c)
    }

    fn command_with_arg(&mut self, cmd: u16, arg: u16) -> Result<(), Scd30Error<I2C::Error>> {
        let [c0, c1] = cmd.to_be_bytes();
        let [a0, a1] = arg.to_be_bytes();
        let frame = [c0, c1, a0, a1, crc8(&[a0, a1])];
        self.i2c.write(SCD30_ADDRESS, &frame).map_err(Scd30Error::I2c)
    }

    /// Send `cmd`, wait, then read `buf.len()` bytes of (word, crc) triples
    /// and verify every CRC.
    fn read_words(&mut self, cmd: u16, buf: &mut [u8]) -> Result<(), Scd30Error<I2C::Error>> {
        self.command(cmd)?;
        self.delay.delay_ms(COMMAND_DELAY_MS);
        self.i2c.read(SCD30_ADDRESS, buf).map_err(Scd30Error::I2c)?;
        for word in buf.chunks_exact(3) {
            if crc8(&word[..2]) != word[2] {
                return Err(Scd30Error::Crc);
            }
        }
        Ok(())
    }
}

/// Reassemble a big-endian f32 from two CRC-framed words.
fn be_f32(words: &[u8]) -> f32 {
    f32::from_be_bytes([words[0], words[1], words[3], words[4]])
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
