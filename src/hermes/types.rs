use serde::{Deserialize, Serialize};
use thiserror::Error;

const HOURS_PER_DAY: f64 = 24.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HermesError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl HermesError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

fn require_finite(name: &'static str, value: f64) -> Result<f64, HermesError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(HermesError::invalid(name, format!("must be finite (got {value})")))
    }
}

/// Hour of day in `[0, 24)`. Finite inputs outside the range wrap around midnight.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Hour(f64);

impl Hour {
    pub fn new(value: f64) -> Result<Self, HermesError> {
        let value = require_finite("hour", value)?;
        let wrapped = value.rem_euclid(HOURS_PER_DAY);
        // rem_euclid can round up to exactly 24.0 for tiny negative inputs.
        Ok(Self(if wrapped >= HOURS_PER_DAY { 0.0 } else { wrapped }))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Elapsed time in hours, never negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ElapsedHours(f64);

impl ElapsedHours {
    pub const ZERO: Self = Self(0.0);

    pub fn new(value: f64) -> Result<Self, HermesError> {
        let value = require_finite("elapsedHours", value)?;
        if value < 0.0 {
            return Err(HermesError::invalid(
                "elapsedHours",
                format!("must be >= 0 (got {value})"),
            ));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Ambient platform load, clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct SystemLoad(f64);

impl SystemLoad {
    pub const IDLE: Self = Self(0.0);

    pub fn new(value: f64) -> Result<Self, HermesError> {
        let value = require_finite("systemLoad", value)?;
        Ok(Self(value.clamp(0.0, 1.0)))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for SystemLoad {
    type Error = HermesError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SystemLoad> for f64 {
    fn from(load: SystemLoad) -> Self {
        load.0
    }
}

/// Exponential decay rate (λ), strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct DecayConstant(f64);

impl DecayConstant {
    pub fn new(value: f64) -> Result<Self, HermesError> {
        let value = require_finite("decayConstant", value)?;
        if value <= 0.0 {
            return Err(HermesError::invalid(
                "decayConstant",
                format!("must be > 0 (got {value})"),
            ));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Checks an initial visibility value before it enters the decay math.
pub fn validate_visibility(value: f64) -> Result<f64, HermesError> {
    let value = require_finite("initialVisibility", value)?;
    if value < 0.0 {
        return Err(HermesError::invalid(
            "initialVisibility",
            format!("must be >= 0 (got {value})"),
        ));
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HermesOp {
    VisibilityScore,
    TimeImpact,
    VisibilityReport,
    SystemLoadUpdate,
    ConfigUpdate,
}

impl HermesOp {
    pub const ALL: [HermesOp; 5] = [
        HermesOp::VisibilityScore,
        HermesOp::TimeImpact,
        HermesOp::VisibilityReport,
        HermesOp::SystemLoadUpdate,
        HermesOp::ConfigUpdate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HermesOp::VisibilityScore => "visibility_score",
            HermesOp::TimeImpact => "time_impact",
            HermesOp::VisibilityReport => "visibility_report",
            HermesOp::SystemLoadUpdate => "system_load_update",
            HermesOp::ConfigUpdate => "config_update",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityReport {
    pub profile_id: Option<String>,
    pub visibility_score: f64,
    pub decay_constant: f64,
    pub hour: f64,
    pub time_impact: f64,
    pub boosted_score: f64,
}
