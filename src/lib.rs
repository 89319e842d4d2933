//! Similarity kernels for quantized and bit-packed vectors.
//!
//! Kernels are reached through a [`VectorUtil`] handle that wraps one backend
//! (portable scalar, AVX2 or NEON). The default handle picks the fastest
//! backend the CPU supports on first use; integer kernels return identical
//! results on every backend.

pub mod bits;
pub mod config;
pub mod error;
pub mod provider;
pub mod support;
mod vector_util;

pub use config::{BackendPreference, ProviderConfig};
pub use error::KernelError;
pub use support::{Backend, ScalarSupport, VectorUtilSupport};
pub use vector_util::{
    VectorUtil, and_bit_count, ip_byte_bin, ip_byte_bit, ip_byte_byte, ip_float_bit,
    ip_float_byte,
};

/// Bits per quantized query component, and so the number of bit-planes a
/// query passed to [`ip_byte_bin`] carries.
pub const B_QUERY: usize = 4;

/// Library version string exposed to the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
