use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AGGRESSION_FACTOR, DEFAULT_BASE_DECAY_CONSTANT, DEFAULT_MAX_BOOST_EFFECT,
    DEFAULT_TIME_OF_DAY_FACTOR,
};
use crate::hermes::types::HermesError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HermesConfig {
    pub max_boost_effect: f64,
    pub base_decay_constant: f64,
    pub aggression_factor: f64,
    #[serde(default = "default_time_of_day_factor")]
    pub time_of_day_factor: f64,
}

fn default_time_of_day_factor() -> f64 {
    DEFAULT_TIME_OF_DAY_FACTOR
}

impl Default for HermesConfig {
    fn default() -> Self {
        Self {
            max_boost_effect: DEFAULT_MAX_BOOST_EFFECT,
            base_decay_constant: DEFAULT_BASE_DECAY_CONSTANT,
            aggression_factor: DEFAULT_AGGRESSION_FACTOR,
            time_of_day_factor: DEFAULT_TIME_OF_DAY_FACTOR,
        }
    }
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HermesConfigPatch {
    #[serde(default)]
    pub max_boost_effect: Option<f64>,
    #[serde(default)]
    pub base_decay_constant: Option<f64>,
    #[serde(default)]
    pub aggression_factor: Option<f64>,
    #[serde(default)]
    pub time_of_day_factor: Option<f64>,
}

impl HermesConfigPatch {
    pub fn is_empty(&self) -> bool {
        self.max_boost_effect.is_none()
            && self.base_decay_constant.is_none()
            && self.aggression_factor.is_none()
            && self.time_of_day_factor.is_none()
    }
}

impl HermesConfig {
    /// Seeds the engine config from the environment, falling back to defaults
    /// when the seeded values do not validate.
    pub fn from_env(env_config: &crate::config::HermesEnvConfig) -> Self {
        let config = Self {
            max_boost_effect: env_config.max_boost_effect,
            base_decay_constant: env_config.base_decay_constant,
            aggression_factor: env_config.aggression_factor,
            time_of_day_factor: env_config.time_of_day_factor,
        };
        match config.validate() {
            Ok(()) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Hermes env config rejected, using defaults");
                Self::default()
            }
        }
    }

    /// Returns a new config with the patch merged in. `self` is untouched.
    pub fn apply(&self, patch: &HermesConfigPatch) -> Self {
        Self {
            max_boost_effect: patch.max_boost_effect.unwrap_or(self.max_boost_effect),
            base_decay_constant: patch
                .base_decay_constant
                .unwrap_or(self.base_decay_constant),
            aggression_factor: patch.aggression_factor.unwrap_or(self.aggression_factor),
            time_of_day_factor: patch.time_of_day_factor.unwrap_or(self.time_of_day_factor),
        }
    }

    pub fn validate(&self) -> Result<(), HermesError> {
        if !self.max_boost_effect.is_finite() || self.max_boost_effect < 0.0 {
            return Err(HermesError::InvalidConfig(
                "maxBoostEffect must be finite and >= 0".to_string(),
            ));
        }
        if !self.base_decay_constant.is_finite() || self.base_decay_constant <= 0.0 {
            return Err(HermesError::InvalidConfig(
                "baseDecayConstant must be finite and > 0".to_string(),
            ));
        }
        if !self.aggression_factor.is_finite() || self.aggression_factor <= 0.0 {
            return Err(HermesError::InvalidConfig(
                "aggressionFactor must be finite and > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.time_of_day_factor) {
            return Err(HermesError::InvalidConfig(
                "timeOfDayFactor must be in [0,1]".to_string(),
            ));
        }
        Ok(())
    }
}
