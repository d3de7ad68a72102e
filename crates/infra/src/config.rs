//! Runtime configuration, read from `ESTATE_*` environment variables.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use estate_account::CommissionTerms;
use estate_core::Money;
use estate_property::{AVAILABILITY_OFFSET_MONTHS, DEFAULT_VALIDITY_DAYS};

pub const ENV_COMMISSION_BPS: &str = "ESTATE_COMMISSION_BPS";
pub const ENV_ADMIN_FEE_CENTS: &str = "ESTATE_ADMIN_FEE_CENTS";
pub const ENV_OFFER_VALIDITY_DAYS: &str = "ESTATE_OFFER_VALIDITY_DAYS";
pub const ENV_AVAILABILITY_MONTHS: &str = "ESTATE_AVAILABILITY_MONTHS";
pub const ENV_LOG_FILTER: &str = "ESTATE_LOG_FILTER";
pub const ENV_LOG_JSON: &str = "ESTATE_LOG_JSON";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: cannot parse '{value}'")]
    Unparsable { key: &'static str, value: String },
    #[error("{key}: {reason}")]
    OutOfRange { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstateConfig {
    /// Commission on the selling price, in basis points.
    pub commission_bps: u32,
    /// Flat administrative fee billed on every sale.
    pub admin_fee_cents: i64,
    pub offer_validity_days: u32,
    pub availability_months: u32,
    pub log_filter: String,
    pub log_json: bool,
}

impl Default for EstateConfig {
    fn default() -> Self {
        let terms = CommissionTerms::default();
        Self {
            commission_bps: terms.rate_bps,
            admin_fee_cents: terms.administrative_fee.cents(),
            offer_validity_days: DEFAULT_VALIDITY_DAYS,
            availability_months: AVAILABILITY_OFFSET_MONTHS,
            log_filter: "info".to_string(),
            log_json: true,
        }
    }
}

impl EstateConfig {
    /// Read the process environment. Bad values are logged and replaced by
    /// their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let mut config = defaults.clone();

        macro_rules! lenient {
            ($field:ident, $key:expr, $check:expr) => {
                match read(&lookup, $key, defaults.$field, $check) {
                    Ok(value) => config.$field = value,
                    Err(err) => {
                        tracing::warn!(%err, default = ?defaults.$field, "ignoring invalid configuration value");
                    }
                }
            };
        }

        lenient!(commission_bps, ENV_COMMISSION_BPS, commission_rate);
        lenient!(admin_fee_cents, ENV_ADMIN_FEE_CENTS, strictly_positive);
        lenient!(offer_validity_days, ENV_OFFER_VALIDITY_DAYS, any);
        lenient!(availability_months, ENV_AVAILABILITY_MONTHS, any);
        lenient!(log_json, ENV_LOG_JSON, any);
        if let Some(filter) = lookup(ENV_LOG_FILTER).filter(|f| !f.trim().is_empty()) {
            config.log_filter = filter;
        }

        config
    }

    /// Like [`EstateConfig::from_lookup`] but the first bad value is an error.
    pub fn try_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            commission_bps: read(&lookup, ENV_COMMISSION_BPS, defaults.commission_bps, commission_rate)?,
            admin_fee_cents: read(&lookup, ENV_ADMIN_FEE_CENTS, defaults.admin_fee_cents, strictly_positive)?,
            offer_validity_days: read(&lookup, ENV_OFFER_VALIDITY_DAYS, defaults.offer_validity_days, any)?,
            availability_months: read(&lookup, ENV_AVAILABILITY_MONTHS, defaults.availability_months, any)?,
            log_filter: lookup(ENV_LOG_FILTER).unwrap_or(defaults.log_filter),
            log_json: read(&lookup, ENV_LOG_JSON, defaults.log_json, any)?,
        })
    }

    /// Install the global tracing subscriber with the configured filter and
    /// format. `false` if one was already installed.
    pub fn init_tracing(&self) -> bool {
        estate_observability::init_with(&self.log_filter, self.log_json)
    }

    pub fn commission_terms(&self) -> CommissionTerms {
        CommissionTerms {
            rate_bps: self.commission_bps,
            administrative_fee: Money::from_cents(self.admin_fee_cents),
        }
    }
}

fn read<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
    check: fn(&T) -> Result<(), &'static str>,
) -> Result<T, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let value: T = raw.trim().parse().map_err(|_| ConfigError::Unparsable {
        key,
        value: raw.clone(),
    })?;
    check(&value).map_err(|reason| ConfigError::OutOfRange {
        key,
        reason: reason.to_string(),
    })?;
    Ok(value)
}

fn any<T>(_: &T) -> Result<(), &'static str> {
    Ok(())
}

/// Zero is allowed: the commission line is then left off the invoice.
fn commission_rate(bps: &u32) -> Result<(), &'static str> {
    if *bps > 10_000 {
        return Err("commission cannot exceed 10000 basis points");
    }
    Ok(())
}

fn strictly_positive(cents: &i64) -> Result<(), &'static str> {
    if *cents <= 0 {
        return Err("must be strictly positive");
    }
    Ok(())
}
