use std::fmt;

use crate::B_QUERY;
use crate::config::ProviderConfig;
use crate::error::{KernelError, Result};
use crate::provider;
use crate::support::{Backend, VectorUtilSupport};

/// Handle to one kernel backend. Every method validates its length contract
/// before touching the backend, so all backends fail identically.
#[derive(Clone, Copy)]
pub struct VectorUtil {
    support: &'static dyn VectorUtilSupport,
}

impl fmt::Debug for VectorUtil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorUtil")
            .field("backend", &self.backend())
            .finish()
    }
}

impl VectorUtil {
    pub fn new(support: &'static dyn VectorUtilSupport) -> Self {
        Self { support }
    }

    /// The process-wide provider, see [`provider::default_provider`].
    pub fn get() -> Self {
        provider::default_provider()
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(provider::resolve(config))
    }

    pub fn backend(&self) -> Backend {
        self.support.backend()
    }

    /// Sum of `query[i]` for every bit `i` set in the packed `doc`.
    ///
    /// Bits are read most significant first: component `8 * k + j` is bit
    /// `7 - j` of `doc[k]`. `doc` needs at least `ceil(query.len() / 8)` bytes;
    /// extra bytes and padding bits are never read.
    pub fn ip_byte_bit(&self, query: &[i8], doc: &[u8]) -> Result<i64> {
        check_bit_vector(query.len(), doc.len())?;
        Ok(self.support.ip_byte_bit(query, doc))
    }

    pub fn ip_float_bit(&self, query: &[f32], doc: &[u8]) -> Result<f32> {
        check_bit_vector(query.len(), doc.len())?;
        Ok(self.support.ip_float_bit(query, doc))
    }

    pub fn ip_float_byte(&self, query: &[f32], doc: &[i8]) -> Result<f32> {
        check_same_len(query.len(), doc.len())?;
        Ok(self.support.ip_float_byte(query, doc))
    }

    /// Dot product of two byte-quantized vectors. Products are summed exactly
    /// and converted to `f32` once, so every backend returns the same bits.
    pub fn ip_byte_byte(&self, query: &[i8], doc: &[i8]) -> Result<f32> {
        check_same_len(query.len(), doc.len())?;
        Ok(self.support.ip_byte_byte(query, doc))
    }

    /// `sum(popcount(a[i] & b[i]))`.
    pub fn and_bit_count(&self, a: &[u8], b: &[u8]) -> Result<u64> {
        check_same_len(a.len(), b.len())?;
        Ok(self.support.and_bit_count(a, b))
    }

    /// Inner product of a [`B_QUERY`]-plane query against a 1-bit document.
    ///
    /// `query` must be exactly `B_QUERY * doc.len()` bytes: plane `i` occupies
    /// `query[i * d..(i + 1) * d]` and contributes `popcount(doc & plane) << i`.
    pub fn ip_byte_bin(&self, query: &[u8], doc: &[u8]) -> Result<u64> {
        let expected = doc.len().checked_mul(B_QUERY);
        if expected != Some(query.len()) {
            return Err(KernelError::QueryLength {
                actual: query.len(),
                doc_len: doc.len(),
                planes: B_QUERY,
            });
        }
        Ok(self.support.ip_byte_bin(query, doc))
    }
}

fn check_same_len(query: usize, doc: usize) -> Result<()> {
    if query != doc {
        return Err(KernelError::LengthMismatch { query, doc });
    }
    Ok(())
}

fn check_bit_vector(dims: usize, actual: usize) -> Result<()> {
    let required = dims.div_ceil(8);
    if actual < required {
        return Err(KernelError::BitVectorTooShort {
            dims,
            required,
            actual,
        });
    }
    Ok(())
}

/// [`VectorUtil::ip_byte_bit`] on the default provider.
pub fn ip_byte_bit(query: &[i8], doc: &[u8]) -> Result<i64> {
    VectorUtil::get().ip_byte_bit(query, doc)
}

/// [`VectorUtil::ip_float_bit`] on the default provider.
pub fn ip_float_bit(query: &[f32], doc: &[u8]) -> Result<f32> {
    VectorUtil::get().ip_float_bit(query, doc)
}

/// [`VectorUtil::ip_float_byte`] on the default provider.
pub fn ip_float_byte(query: &[f32], doc: &[i8]) -> Result<f32> {
    VectorUtil::get().ip_float_byte(query, doc)
}

/// [`VectorUtil::ip_byte_byte`] on the default provider.
pub fn ip_byte_byte(query: &[i8], doc: &[i8]) -> Result<f32> {
    VectorUtil::get().ip_byte_byte(query, doc)
}

/// [`VectorUtil::and_bit_count`] on the default provider.
pub fn and_bit_count(a: &[u8], b: &[u8]) -> Result<u64> {
    VectorUtil::get().and_bit_count(a, b)
}

/// [`VectorUtil::ip_byte_bin`] on the default provider.
pub fn ip_byte_bin(query: &[u8], doc: &[u8]) -> Result<u64> {
    VectorUtil::get().ip_byte_bin(query, doc)
}
