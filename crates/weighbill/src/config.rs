//! Data home and policies
//!
//! Everything weighbill keeps on disk lives under one home directory:
//!
//! ```text
//! <home>/formulas.json
//! <home>/session.json
//! <home>/exports/
//! <home>/suggestions/<key>_suggestions.json
//! ```

use std::env;
use std::path::{Path, PathBuf};

use weighbill_core::{NumericCheck, ValidationRules};

use crate::error::{Error, Result};
use crate::export::UnresolvedPolicy;

/// Environment variable naming the data home
pub const HOME_ENV: &str = "WEIGHBILL_HOME";
/// Environment variable overriding the numeric validation policy
pub const NUMERIC_CHECK_ENV: &str = "WEIGHBILL_NUMERIC_CHECK";
/// Environment variable overriding the unresolved-reference policy
pub const UNRESOLVED_ENV: &str = "WEIGHBILL_UNRESOLVED";

const APP_DIR: &str = "weighbill";

/// Locations and policies for one entry session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    home: PathBuf,
    /// Which numeric fields validation reports
    pub numeric_check: NumericCheck,
    /// What export does with partially resolved formulas
    pub unresolved: UnresolvedPolicy,
}

impl Config {
    /// Config rooted at `home` with default policies
    pub fn new<P: Into<PathBuf>>(home: P) -> Self {
        Self {
            home: home.into(),
            numeric_check: NumericCheck::default(),
            unresolved: UnresolvedPolicy::default(),
        }
    }

    /// Config from the process environment
    ///
    /// The home is `explicit` if given, then `$WEIGHBILL_HOME`, then the
    /// platform data directory, then the current directory.
    pub fn from_env(explicit: Option<PathBuf>) -> Result<Self> {
        Self::from_lookup(explicit, |name| env::var(name).ok())
    }

    /// Config from an arbitrary variable lookup
    pub fn from_lookup<F>(explicit: Option<PathBuf>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let home = explicit
            .or_else(|| {
                lookup(HOME_ENV)
                    .filter(|v| !v.trim().is_empty())
                    .map(PathBuf::from)
            })
            .or_else(|| dirs::data_dir().map(|d| d.join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from("."));

        let mut config = Self::new(home);

        if let Some(value) = lookup(NUMERIC_CHECK_ENV) {
            config.numeric_check =
                NumericCheck::from_name(&value).ok_or_else(|| Error::InvalidConfig {
                    name: NUMERIC_CHECK_ENV.into(),
                    value: value.clone(),
                })?;
        }
        if let Some(value) = lookup(UNRESOLVED_ENV) {
            config.unresolved =
                UnresolvedPolicy::from_name(&value).ok_or_else(|| Error::InvalidConfig {
                    name: UNRESOLVED_ENV.into(),
                    value: value.clone(),
                })?;
        }

        log::debug!("Using data home {}", config.home.display());
        Ok(config)
    }

    /// Data home directory
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Path of the formula store
    pub fn formulas_path(&self) -> PathBuf {
        self.home.join("formulas.json")
    }

    /// Directory for exported workbooks
    pub fn export_dir(&self) -> PathBuf {
        self.home.join("exports")
    }

    /// Directory holding the suggestion lists
    pub fn suggestions_dir(&self) -> PathBuf {
        self.home.join("suggestions")
    }

    /// Path of the persisted entry session
    pub fn session_path(&self) -> PathBuf {
        self.home.join("session.json")
    }

    /// Validation rules for the bill schema under this config's policy
    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules::bill().with_numeric_check(self.numeric_check)
    }
}
