use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Environment variable consulted by [`ProviderConfig::from_env`].
pub const BACKEND_ENV: &str = "SIMDVEC_BACKEND";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// Fastest backend the CPU supports.
    #[default]
    Auto,
    /// Portable kernels only.
    Scalar,
    /// Same as `Auto`, but a missing accelerated backend is logged.
    Accelerated,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown backend preference {0:?} (expected auto, scalar or accelerated)")]
pub struct ParseBackendError(String);

impl FromStr for BackendPreference {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "scalar" | "portable" => Ok(Self::Scalar),
            "accelerated" | "simd" => Ok(Self::Accelerated),
            _ => Err(ParseBackendError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub backend: BackendPreference,
}

impl ProviderConfig {
    /// Reads [`BACKEND_ENV`]. Unset or unparsable values yield the default;
    /// the latter is logged, never surfaced as an error.
    pub fn from_env() -> Self {
        match std::env::var(BACKEND_ENV) {
            Ok(raw) => Self::from_value(&raw),
            Err(_) => Self::default(),
        }
    }

    fn from_value(raw: &str) -> Self {
        match raw.parse::<BackendPreference>() {
            Ok(backend) => Self { backend },
            Err(err) => {
                tracing::warn!(%err, "ignoring {BACKEND_ENV}");
                Self::default()
            }
        }
    }
}
