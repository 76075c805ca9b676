use std::time::Duration;

use serde::{Deserialize, Serialize};
use tally_types::Amount;

use crate::error::DividendError;

/// Issuance gate parameters for a [`crate::DividendManager`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DividendConfig {
    /// Minimum whole seconds between two issuances.
    pub min_issuance_interval_secs: u64,
    /// Minimum pool size before an issuance may run. Must be at least 1.
    pub min_issuance_amount: Amount,
}

impl Default for DividendConfig {
    fn default() -> Self {
        Self {
            min_issuance_interval_secs: 1,
            min_issuance_amount: 1,
        }
    }
}

impl DividendConfig {
    pub fn new(min_issuance_interval: Duration, min_issuance_amount: Amount) -> Self {
        Self {
            min_issuance_interval_secs: min_issuance_interval.as_secs(),
            min_issuance_amount,
        }
    }

    pub fn min_issuance_interval(&self) -> Duration {
        Duration::from_secs(self.min_issuance_interval_secs)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, DividendError> {
        let config: Self =
            toml::from_str(input).map_err(|e| DividendError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// An empty pool must never be issuable.
    pub fn validate(&self) -> Result<(), DividendError> {
        if self.min_issuance_amount == 0 {
            return Err(DividendError::InvalidConfig(
                "min_issuance_amount must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = DividendConfig::default();
        assert_eq!(c.min_issuance_interval(), Duration::from_secs(1));
        assert_eq!(c.min_issuance_amount, 1);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn parses_toml_with_defaults() {
        let c = DividendConfig::from_toml_str("min_issuance_amount = 50\n").unwrap();
        assert_eq!(c.min_issuance_amount, 50);
        assert_eq!(c.min_issuance_interval_secs, 1);

        let c = DividendConfig::from_toml_str(
            "min_issuance_interval_secs = 86400\nmin_issuance_amount = 10\n",
        )
        .unwrap();
        assert_eq!(c, DividendConfig::new(Duration::from_secs(86_400), 10));
    }

    #[test]
    fn rejects_zero_minimum_and_unknown_keys() {
        assert!(matches!(
            DividendConfig::from_toml_str("min_issuance_amount = 0").unwrap_err(),
            DividendError::InvalidConfig(_)
        ));
        assert!(DividendConfig::from_toml_str("interval = 3").is_err());
    }
}
