//! Device-twin documents.
//!
//! Inbound, the hub delivers desired properties in two shapes:
//!
//! ```json
//! {"desired": {"DesiredTemperature": 21.5, "$version": 7}, "reported": {...}}   // twin GET
//! {"DesiredTemperature": 21.5, "$version": 8}                                   // PATCH
//! ```
//!
//! Outbound, the device sends reported-property patches and, for every
//! desired value it accepts, the IoT Central writable-property ack:
//!
//! ```json
//! {"DesiredTemperature": {"value": 21.5, "ac": 200, "av": 8, "ad": "completed"}}
//! ```

use core::fmt;

use log::warn;
use serde_json::{Map, Value};

use super::round2;

// ── Property names ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TwinProperty {
    DesiredTemperature,
    DesiredCo2AlertLevel,
    ActualTemperature,
    ActualCo2Level,
    ActualHvacState,
}

impl TwinProperty {
    pub const fn name(self) -> &'static str {
        match self {
            Self::DesiredTemperature => "DesiredTemperature",
            Self::DesiredCo2AlertLevel => "DesiredCO2AlertLevel",
            Self::ActualTemperature => "ActualTemperature",
            Self::ActualCo2Level => "ActualCO2Level",
            Self::ActualHvacState => "ActualHvacState",
        }
    }
}

impl fmt::Display for TwinProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A reported or echoed twin value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TwinValue {
    Float(f32),
    Text(&'static str),
}

impl TwinValue {
    fn to_json(self) -> Value {
        match self {
            Self::Float(v) => Value::from(round2(v)),
            Self::Text(s) => Value::from(s),
        }
    }
}

/// Acknowledgement status codes for writable properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    Completed,
    Pending,
    Invalid,
}

impl AckStatus {
    pub const fn code(self) -> u16 {
        match self {
            Self::Completed => 200,
            Self::Pending => 202,
            Self::Invalid => 404,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Invalid => "invalid",
        }
    }
}

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwinError {
    /// Not JSON, or not a JSON object.
    Malformed,
    /// A known desired property carried a non-numeric value.
    InvalidValue(TwinProperty),
    /// An outbound document could not be serialised.
    Encode,
}

impl fmt::Display for TwinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed twin document"),
            Self::InvalidValue(p) => write!(f, "{} is not a number", p),
            Self::Encode => write!(f, "twin document encode failed"),
        }
    }
}

impl From<TwinError> for crate::error::CloudError {
    fn from(e: TwinError) -> Self {
        match e {
            TwinError::Encode => Self::Encode,
            TwinError::Malformed | TwinError::InvalidValue(_) => Self::Malformed,
        }
    }
}

impl From<TwinError> for crate::error::Error {
    fn from(e: TwinError) -> Self {
        Self::Cloud(e.into())
    }
}

// ── Desired properties ────────────────────────────────────────

/// Desired properties the device accepts, in patch order.
const DESIRED_PROPERTIES: [TwinProperty; 2] =
    [TwinProperty::DesiredTemperature, TwinProperty::DesiredCo2AlertLevel];

/// The desired properties this device understands, extracted from one
/// inbound document.  `None` means "not present in this document".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DesiredPatch {
    pub version: Option<u32>,
    pub desired_temperature: Option<f32>,
    pub desired_co2_alert_level: Option<f32>,
    /// Known properties that were present but carried no usable value.
    pub rejected: [Option<TwinProperty>; 2],
}

impl DesiredPatch {
    /// `true` when no known property is present, valid or not.
    pub fn is_empty(&self) -> bool {
        self.desired_temperature.is_none()
            && self.desired_co2_alert_level.is_none()
            && self.rejected.iter().all(Option::is_none)
    }

    /// Properties whose value was refused.
    pub fn rejected(&self) -> impl Iterator<Item = TwinProperty> {
        self.rejected.into_iter().flatten()
    }

    /// Present properties, in a fixed order.
    pub fn values(&self) -> impl Iterator<Item = (TwinProperty, f32)> {
        [
            (TwinProperty::DesiredTemperature, self.desired_temperature),
            (TwinProperty::DesiredCo2AlertLevel, self.desired_co2_alert_level),
        ]
        .into_iter()
        .filter_map(|(p, v)| v.map(|v| (p, v)))
    }
}

/// Parse a full twin document or a desired-properties patch.
///
/// Unknown keys are ignored.  A `null` value (property removed in the
/// cloud) is treated as absent.  A known key whose value is not a finite
/// `f32` lands in [`DesiredPatch::rejected`]; the other values still apply.
pub fn parse_desired(payload: &[u8]) -> Result<DesiredPatch, TwinError> {
    let root: Value = serde_json::from_slice(payload).map_err(|_| TwinError::Malformed)?;
    let root = root.as_object().ok_or(TwinError::Malformed)?;

    let desired = match root.get("desired") {
        Some(Value::Object(d)) => d,
        Some(_) => return Err(TwinError::Malformed),
        None => root,
    };

    let mut values = [None; 2];
    let mut rejected = [None; 2];
    for (i, prop) in DESIRED_PROPERTIES.into_iter().enumerate() {
        match number(desired, prop) {
            Ok(v) => values[i] = v,
            Err(e) => {
                warn!("Twin: {}", e);
                rejected[i] = Some(prop);
            }
        }
    }

    Ok(DesiredPatch {
        version: desired
            .get("$version")
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok()),
        desired_temperature: values[0],
        desired_co2_alert_level: values[1],
        rejected,
    })
}

/// Numbers beyond `f32` range would become infinities, which JSON cannot
/// carry back to the hub.
fn number(obj: &Map<String, Value>, prop: TwinProperty) -> Result<Option<f32>, TwinError> {
    match obj.get(prop.name()) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(|f| f as f32)
            .filter(|f| f.is_finite())
            .map(Some)
            .ok_or(TwinError::InvalidValue(prop)),
    }
}

// ── Outbound documents ────────────────────────────────────────

/// `{"<prop>": <value>}`
pub fn reported_document(prop: TwinProperty, value: TwinValue) -> Result<String, TwinError> {
    let mut doc = Map::new();
    doc.insert(prop.name().into(), value.to_json());
    serde_json::to_string(&Value::Object(doc)).map_err(|_| TwinError::Encode)
}

/// `{"<prop>": {"value": v, "ac": code, "av": version, "ad": "<desc>"}}`
///
/// `av` is omitted when the inbound document carried no `$version`.
pub fn ack_document(
    prop: TwinProperty,
    value: TwinValue,
    version: Option<u32>,
    status: AckStatus,
) -> Result<String, TwinError> {
    ack(prop, Some(value), version, status)
}

/// [`AckStatus::Invalid`] ack for a refused desired value.  `value` is the
/// setpoint still in force and is left out when there is none.
pub fn rejection_document(
    prop: TwinProperty,
    current: Option<TwinValue>,
    version: Option<u32>,
) -> Result<String, TwinError> {
    ack(prop, current, version, AckStatus::Invalid)
}

fn ack(
    prop: TwinProperty,
    value: Option<TwinValue>,
    version: Option<u32>,
    status: AckStatus,
) -> Result<String, TwinError> {
    let mut ack = Map::new();
    if let Some(value) = value {
        ack.insert("value".into(), value.to_json());
    }
    ack.insert("ac".into(), Value::from(status.code()));
    if let Some(v) = version {
        ack.insert("av".into(), Value::from(v));
    }
    ack.insert("ad".into(), Value::from(status.description()));

    let mut doc = Map::new();
    doc.insert(prop.name().into(), Value::Object(ack));
    serde_json::to_string(&Value::Object(doc)).map_err(|_| TwinError::Encode)
}
