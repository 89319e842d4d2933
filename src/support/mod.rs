//! Kernel backends.
//!
//! [`VectorUtilSupport`] is the capability interface every backend exposes.
//! Default methods are the portable kernels, so a backend only overrides the
//! kernels it accelerates. Methods assume lengths were validated by
//! [`crate::VectorUtil`]; on mismatched input they stay memory-safe but the
//! result is unspecified.

use std::fmt;

pub(crate) mod scalar;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod x86;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use x86::Avx2Support;

#[cfg(target_arch = "aarch64")]
mod neon;
#[cfg(target_arch = "aarch64")]
pub use neon::NeonSupport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Scalar,
    Avx2,
    Neon,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Scalar => "scalar",
            Backend::Avx2 => "avx2",
            Backend::Neon => "neon",
        }
    }

    pub fn is_accelerated(self) -> bool {
        !matches!(self, Backend::Scalar)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait VectorUtilSupport: Send + Sync + fmt::Debug {
    fn backend(&self) -> Backend;

    /// Sum of `query[i]` over set bits of the MSB-first packed `doc`.
    fn ip_byte_bit(&self, query: &[i8], doc: &[u8]) -> i64 {
        scalar::ip_byte_bit(query, doc)
    }

    /// Float variant of [`VectorUtilSupport::ip_byte_bit`].
    fn ip_float_bit(&self, query: &[f32], doc: &[u8]) -> f32 {
        scalar::ip_float_bit(query, doc)
    }

    fn ip_float_byte(&self, query: &[f32], doc: &[i8]) -> f32 {
        scalar::ip_float_byte(query, doc)
    }

    fn ip_byte_byte(&self, query: &[i8], doc: &[i8]) -> f32 {
        scalar::ip_byte_byte(query, doc)
    }

    fn and_bit_count(&self, a: &[u8], b: &[u8]) -> u64 {
        scalar::and_bit_count(a, b)
    }

    /// `query` holds [`crate::B_QUERY`] planes of `doc.len()` bytes each.
    fn ip_byte_bin(&self, query: &[u8], doc: &[u8]) -> u64 {
        scalar::ip_byte_bin(query, doc)
    }
}

/// The always-available portable backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScalarSupport;

impl VectorUtilSupport for ScalarSupport {
    fn backend(&self) -> Backend {
        Backend::Scalar
    }
}

pub(crate) static SCALAR: ScalarSupport = ScalarSupport;
