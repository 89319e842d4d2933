use std::arch::aarch64::{vaddlvq_u8, vandq_u8, vcntq_u8, vld1q_u8};

use super::{Backend, VectorUtilSupport, scalar};
use crate::B_QUERY;

/// NEON backend for the popcount kernels. Float and byte dot products fall
/// back to the portable kernels.
#[derive(Debug, Clone, Copy)]
pub struct NeonSupport {
    _private: (),
}

impl NeonSupport {
    pub fn detect() -> Option<Self> {
        if std::arch::is_aarch64_feature_detected!("neon") {
            Some(Self { _private: () })
        } else {
            None
        }
    }
}

impl VectorUtilSupport for NeonSupport {
    fn backend(&self) -> Backend {
        Backend::Neon
    }

    fn and_bit_count(&self, a: &[u8], b: &[u8]) -> u64 {
        // SAFETY: `NeonSupport` only exists when the CPU supports neon.
        unsafe { and_bit_count_neon(a, b) }
    }

    fn ip_byte_bin(&self, query: &[u8], doc: &[u8]) -> u64 {
        // SAFETY: `NeonSupport` only exists when the CPU supports neon.
        unsafe { ip_byte_bin_neon(query, doc) }
    }
}

#[target_feature(enable = "neon")]
unsafe fn and_bit_count_neon(a: &[u8], b: &[u8]) -> u64 {
    let n = a.len().min(b.len());
    let mut i = 0usize;
    let mut out = 0u64;
    while i + 16 <= n {
        // SAFETY: bounds checked by loop guard.
        let va = unsafe { vld1q_u8(a.as_ptr().add(i)) };
        // SAFETY: bounds checked by loop guard.
        let vb = unsafe { vld1q_u8(b.as_ptr().add(i)) };
        // At most 16 * 8 set bits, fits the u16 across-vector sum.
        out += u64::from(vaddlvq_u8(vcntq_u8(vandq_u8(va, vb))));
        i += 16;
    }
    out + scalar::and_bit_count(&a[i..n], &b[i..n])
}

#[target_feature(enable = "neon")]
unsafe fn ip_byte_bin_neon(query: &[u8], doc: &[u8]) -> u64 {
    let d = doc.len().min(query.len() / B_QUERY);
    let mut out = 0u64;
    for plane in 0..B_QUERY {
        let start = plane * d;
        // SAFETY: caller guarantees neon; slices are in bounds by construction of `d`.
        let count = unsafe { and_bit_count_neon(&doc[..d], &query[start..start + d]) };
        out += count << plane;
    }
    out
}
