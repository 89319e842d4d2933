//! Backend selection.
//!
//! CPU features are probed once per backend and cached; the process-wide
//! default provider is resolved on first use and never changes afterwards.

use std::sync::OnceLock;

use crate::config::{BackendPreference, ProviderConfig};
use crate::support::{SCALAR, VectorUtilSupport};
use crate::vector_util::VectorUtil;

/// The fastest accelerated backend this CPU supports, if any.
pub fn accelerated() -> Option<&'static dyn VectorUtilSupport> {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        use crate::support::Avx2Support;
        static AVX2: OnceLock<Option<Avx2Support>> = OnceLock::new();
        if let Some(support) = AVX2.get_or_init(Avx2Support::detect).as_ref() {
            return Some(support);
        }
    }
    #[cfg(target_arch = "aarch64")]
    {
        use crate::support::NeonSupport;
        static NEON: OnceLock<Option<NeonSupport>> = OnceLock::new();
        if let Some(support) = NEON.get_or_init(NeonSupport::detect).as_ref() {
            return Some(support);
        }
    }
    None
}

pub fn scalar() -> &'static dyn VectorUtilSupport {
    &SCALAR
}

pub fn resolve(config: &ProviderConfig) -> &'static dyn VectorUtilSupport {
    match config.backend {
        BackendPreference::Scalar => scalar(),
        BackendPreference::Auto => accelerated().unwrap_or_else(scalar),
        BackendPreference::Accelerated => accelerated().unwrap_or_else(|| {
            tracing::warn!("no accelerated vector backend on this cpu, using scalar");
            scalar()
        }),
    }
}

/// Process-wide provider, resolved from the environment on first call.
pub fn default_provider() -> VectorUtil {
    static DEFAULT: OnceLock<VectorUtil> = OnceLock::new();
    *DEFAULT.get_or_init(|| {
        let config = ProviderConfig::from_env();
        let util = VectorUtil::from_config(&config);
        tracing::debug!(
            backend = %util.backend(),
            preference = ?config.backend,
            "selected vector kernel backend"
        );
        util
    })
}

/// Every backend usable on this machine, scalar first.
pub fn available() -> Vec<VectorUtil> {
    let mut out = vec![VectorUtil::new(scalar())];
    if let Some(support) = accelerated() {
        out.push(VectorUtil::new(support));
    }
    out
}
