//! TOML run configuration: an optional scenario plus verification settings.
//!
//! ```toml
//! [reward]
//! price = 7
//! aff_dom_payout = 10
//! term_payout = 3
//! det_payout = 4
//!
//! [protocol]
//! reporting_fee = 2
//! min_term_payout = 2
//! remaining_lifetime = "1/2"
//!
//! [verify]
//! checker = "sampling"
//! samples = 2000
//! ```
//!
//! Amounts are read as signed integers and validated by
//! [`Scenario::try_from_signed`], so a negative price is a parameter error
//! naming the field rather than a TOML type error.

use std::path::{Path, PathBuf};

use rpcheck_engine::{standard_property, CheckerChoice, VerifyOptions};
use rpcheck_model::{ParamError, RemainingLifetime, Scenario};
use serde::Deserialize;
use thiserror::Error;

use crate::cli::ScenarioArgs;

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid scenario: {0}")]
    Param(#[from] ParamError),

    #[error("scenario is missing `{0}` (set it in the config file or pass --{flag})", flag = .0.replace('_', "-"))]
    Missing(&'static str),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RewardSection {
    pub(crate) price: Option<i64>,
    pub(crate) aff_dom_payout: Option<i64>,
    pub(crate) term_payout: Option<i64>,
    pub(crate) det_payout: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ProtocolSection {
    pub(crate) reporting_fee: Option<i64>,
    pub(crate) min_term_payout: Option<i64>,
    pub(crate) remaining_lifetime: Option<RemainingLifetime>,
}

/// `[verify]` table. Every key is optional; unset keys keep the
/// [`VerifyOptions`] defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct VerifySection {
    pub(crate) checker: Option<CheckerChoice>,
    pub(crate) samples: Option<usize>,
    pub(crate) seed: Option<u64>,
    pub(crate) max_amount: Option<u64>,
    pub(crate) max_lifetime_den: Option<u64>,
    pub(crate) timeout_secs: Option<u64>,
    pub(crate) dump_smt: Option<PathBuf>,
    pub(crate) cvc5_command: Option<String>,
    pub(crate) sampling_fallback: Option<bool>,
    #[serde(default)]
    pub(crate) properties: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RunConfig {
    #[serde(default)]
    pub(crate) reward: RewardSection,
    #[serde(default)]
    pub(crate) protocol: ProtocolSection,
    #[serde(default)]
    pub(crate) verify: VerifySection,
}

impl RunConfig {
    pub(crate) fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed, contains unknown keys, or
    /// names a property that does not exist.
    pub(crate) fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        if let Some(unknown) = config
            .verify
            .properties
            .iter()
            .find(|id| standard_property(id).is_none())
        {
            return Err(ConfigError::Validation(format!(
                "unknown property `{unknown}` in [verify].properties"
            )));
        }
        Ok(config)
    }

    /// Loads `path` when given, otherwise an empty configuration.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Merge command-line overrides into the file values and validate.
    pub(crate) fn scenario(&self, overrides: &ScenarioArgs) -> Result<Scenario, ConfigError> {
        fn pick(
            field: &'static str,
            flag: Option<i64>,
            file: Option<i64>,
        ) -> Result<i64, ConfigError> {
            flag.or(file).ok_or(ConfigError::Missing(field))
        }

        let remaining_lifetime = match &overrides.remaining_lifetime {
            Some(text) => text.parse::<RemainingLifetime>()?,
            None => self
                .protocol
                .remaining_lifetime
                .clone()
                .ok_or(ConfigError::Missing("remaining_lifetime"))?,
        };
        let amounts = [
            pick("price", overrides.price, self.reward.price)?,
            pick(
                "aff_dom_payout",
                overrides.aff_dom_payout,
                self.reward.aff_dom_payout,
            )?,
            pick("term_payout", overrides.term_payout, self.reward.term_payout)?,
            pick("det_payout", overrides.det_payout, self.reward.det_payout)?,
            pick(
                "reporting_fee",
                overrides.reporting_fee,
                self.protocol.reporting_fee,
            )?,
            pick(
                "min_term_payout",
                overrides.min_term_payout,
                self.protocol.min_term_payout,
            )?,
        ];
        Ok(Scenario::try_from_signed(amounts, remaining_lifetime)?)
    }
}

impl VerifySection {
    /// Apply the file's settings on top of the defaults.
    pub(crate) fn to_options(&self) -> VerifyOptions {
        let mut options = VerifyOptions::default();
        if let Some(checker) = self.checker {
            options.checker = checker;
        }
        if let Some(samples) = self.samples {
            options.samples = samples;
        }
        if let Some(seed) = self.seed {
            options.seed = seed;
        }
        if let Some(max_amount) = self.max_amount {
            options.max_amount = max_amount;
        }
        if let Some(den) = self.max_lifetime_den {
            options.max_lifetime_den = den;
        }
        if let Some(timeout) = self.timeout_secs {
            options.timeout_secs = timeout;
        }
        if let Some(dir) = &self.dump_smt {
            options.dump_smt = Some(dir.clone());
        }
        if let Some(cmd) = &self.cvc5_command {
            options.cvc5_command = cmd.clone();
        }
        if let Some(fallback) = self.sampling_fallback {
            options.sampling_fallback = fallback;
        }
        options
    }
}
