//! Valuation configuration.
//!
//! A [`ValuationConfig`] is loaded from JSON or TOML, validated, and turned
//! into the parameter structs every valuation call takes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use meridian_core::calendars::BusinessDayConvention;
use meridian_core::types::Date;

use crate::params::{CashSettleParams, PricerParams, QuotingParams, ValuationParams};

/// Configuration result type.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Validation error.
    #[error("Validation error: {field}: {message}")]
    Validation {
        /// Field that failed validation.
        field: String,
        /// Validation error message.
        message: String,
    },

    /// Multiple validation errors.
    #[error("Multiple validation errors: {0:?}")]
    MultipleValidationErrors(Vec<ValidationError>),

    /// Deserialization error.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            ConfigError::Deserialization(err.to_string())
        } else {
            ConfigError::Serialization(err.to_string())
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Deserialization(err.to_string())
    }
}

/// A single validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Field that failed validation.
    pub field: String,
    /// Validation error message.
    pub message: String,
    /// Validation rule that was violated.
    pub rule: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: None,
        }
    }

    /// Creates a validation error with a rule name.
    pub fn with_rule(field: impl Into<String>, message: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: Some(rule.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.rule {
            Some(rule) => write!(f, "{}: {} (rule: {})", self.field, self.message, rule),
            None => write!(f, "{}: {}", self.field, self.message),
        }
    }
}

/// Trait for validatable configurations.
pub trait Validate {
    /// Returns every validation error, empty when valid.
    fn validate(&self) -> Vec<ValidationError>;

    /// Returns true if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Validates and returns an error if invalid.
    fn validate_or_error(&self) -> ConfigResult<()> {
        let mut errors = self.validate();
        match errors.len() {
            0 => Ok(()),
            1 => {
                let err = errors.remove(0);
                Err(ConfigError::Validation {
                    field: err.field,
                    message: err.message,
                })
            }
            _ => Err(ConfigError::MultipleValidationErrors(errors)),
        }
    }
}

/// Valuation run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationConfig {
    /// Configuration name.
    #[serde(default = "default_name")]
    pub name: String,

    /// Apply convexity multipliers.
    #[serde(default = "default_apply_convexity")]
    pub apply_convexity: bool,

    /// Fail Jacobians on periods without curve sensitivity instead of skipping them.
    #[serde(default)]
    pub strict_jacobians: bool,

    /// Par price for price-style measures.
    #[serde(default = "default_price_scale")]
    pub price_scale: f64,

    /// Business days from value date to cash settlement.
    #[serde(default)]
    pub cash_settle_lag_days: u32,

    /// Roll applied to the cash settlement date.
    #[serde(default = "default_cash_settle_convention")]
    pub cash_settle_convention: BusinessDayConvention,
}

fn default_name() -> String {
    "default".to_string()
}

fn default_apply_convexity() -> bool {
    true
}

fn default_price_scale() -> f64 {
    100.0
}

fn default_cash_settle_convention() -> BusinessDayConvention {
    BusinessDayConvention::Following
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            apply_convexity: default_apply_convexity(),
            strict_jacobians: false,
            price_scale: default_price_scale(),
            cash_settle_lag_days: 0,
            cash_settle_convention: default_cash_settle_convention(),
        }
    }
}

impl ValuationConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate_or_error()?;
        Ok(config)
    }

    /// Parses and validates a TOML configuration.
    pub fn from_toml(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate_or_error()?;
        Ok(config)
    }

    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialization(e.to_string()))
    }

    /// Pricer switches.
    #[must_use]
    pub fn pricer_params(&self) -> PricerParams {
        PricerParams {
            apply_convexity: self.apply_convexity,
            strict_jacobians: self.strict_jacobians,
        }
    }

    /// Quoting conventions.
    #[must_use]
    pub fn quoting_params(&self) -> QuotingParams {
        QuotingParams {
            price_scale: self.price_scale,
        }
    }

    /// Cash settlement rule.
    #[must_use]
    pub fn cash_settle_params(&self) -> CashSettleParams {
        CashSettleParams::new(self.cash_settle_lag_days, self.cash_settle_convention)
    }

    /// Valuation dates for `value_date` under the configured settlement rule.
    #[must_use]
    pub fn valuation_params(&self, value_date: Date) -> ValuationParams {
        ValuationParams::new(value_date, self.cash_settle_params().settle_date(value_date))
    }
}

impl Validate for ValuationConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.name.is_empty() {
            errors.push(ValidationError::new("name", "Name cannot be empty"));
        }

        if !(self.price_scale.is_finite() && self.price_scale > 0.0) {
            errors.push(ValidationError::with_rule(
                "price_scale",
                format!("Price scale {} must be positive", self.price_scale),
                "positive_price_scale",
            ));
        }

        if self.cash_settle_lag_days > 10 {
            errors.push(ValidationError::with_rule(
                "cash_settle_lag_days",
                format!("Settlement lag {} exceeds maximum of 10", self.cash_settle_lag_days),
                "max_settlement_days",
            ));
        }

        errors
    }
}
