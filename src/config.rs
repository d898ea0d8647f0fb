// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Application configuration, read from `EXPENSES_*` environment variables
//! (a `.env` file in the working directory is loaded first).

use serde::Deserialize;

use crate::error::ValidationResult;
use crate::models::Currency;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file. Read from EXPENSES_DB_PATH; defaults to the platform data dir.
    pub db_path: Option<String>,
    /// Who expenses are recorded for when not given explicitly. Read from EXPENSES_USER.
    pub user: Option<String>,
    /// Currency used when an expense does not name one. Read from EXPENSES_DEFAULT_CURRENCY.
    pub default_currency: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        config::Config::builder()
            .add_source(config::Environment::with_prefix("EXPENSES"))
            .build()?
            .try_deserialize()
    }

    pub fn db_path(&self) -> Option<&str> {
        non_blank(self.db_path.as_deref())
    }

    pub fn user(&self) -> Option<&str> {
        non_blank(self.user.as_deref())
    }

    /// Fails if the configured currency is not a supported one.
    pub fn default_currency(&self) -> ValidationResult<Option<Currency>> {
        non_blank(self.default_currency.as_deref())
            .map(|s| s.to_uppercase().parse())
            .transpose()
    }
}

fn non_blank(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = AppConfig {
            db_path: Some("  ".into()),
            user: Some(" ana ".into()),
            default_currency: None,
        };
        assert_eq!(cfg.db_path(), None);
        assert_eq!(cfg.user(), Some("ana"));
        assert_eq!(cfg.default_currency().unwrap(), None);
    }

    #[test]
    fn default_currency_is_case_insensitive() {
        let cfg = AppConfig {
            default_currency: Some("eur".into()),
            ..Default::default()
        };
        assert_eq!(cfg.default_currency().unwrap(), Some(Currency::Eur));
    }

    #[test]
    fn unknown_default_currency_is_an_error() {
        let cfg = AppConfig {
            default_currency: Some("XYZ".into()),
            ..Default::default()
        };
        assert!(cfg.default_currency().is_err());
    }
}
