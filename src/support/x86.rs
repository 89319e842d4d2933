#[cfg(target_arch = "x86")]
use std::arch::x86::{
    __m128i, __m256i, _mm_loadl_epi64, _mm_loadu_si128, _mm256_add_epi8, _mm256_add_epi32,
    _mm256_add_epi64, _mm256_add_ps, _mm256_and_si256, _mm256_cvtepi8_epi16,
    _mm256_cvtepi8_epi32, _mm256_cvtepi32_ps, _mm256_fmadd_ps, _mm256_loadu_ps,
    _mm256_loadu_si256, _mm256_madd_epi16, _mm256_sad_epu8, _mm256_set1_epi8,
    _mm256_setr_epi8, _mm256_setzero_ps, _mm256_setzero_si256, _mm256_shuffle_epi8,
    _mm256_srli_epi16, _mm256_storeu_ps, _mm256_storeu_si256,
};
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{
    __m128i, __m256i, _mm_loadl_epi64, _mm_loadu_si128, _mm256_add_epi8, _mm256_add_epi32,
    _mm256_add_epi64, _mm256_add_ps, _mm256_and_si256, _mm256_cvtepi8_epi16,
    _mm256_cvtepi8_epi32, _mm256_cvtepi32_ps, _mm256_fmadd_ps, _mm256_loadu_ps,
    _mm256_loadu_si256, _mm256_madd_epi16, _mm256_sad_epu8, _mm256_set1_epi8,
    _mm256_setr_epi8, _mm256_setzero_ps, _mm256_setzero_si256, _mm256_shuffle_epi8,
    _mm256_srli_epi16, _mm256_storeu_ps, _mm256_storeu_si256,
};

use super::{Backend, VectorUtilSupport, scalar};
use crate::B_QUERY;

/// Bytes summed into `i32` lanes before they are widened into the `i64`
/// total. `madd` lanes grow by at most 2 * 128 * 128 per 16 input bytes.
const BYTE_BLOCK: usize = 16 * 4096;

/// AVX2 backend. Only constructible through [`Avx2Support::detect`], so every
/// `*_entry` call below runs on a CPU that has the features it enables.
#[derive(Debug, Clone, Copy)]
pub struct Avx2Support {
    fma: bool,
}

impl Avx2Support {
    pub fn detect() -> Option<Self> {
        if !std::is_x86_feature_detected!("avx2") {
            return None;
        }
        Some(Self {
            fma: std::is_x86_feature_detected!("fma"),
        })
    }
}

impl VectorUtilSupport for Avx2Support {
    fn backend(&self) -> Backend {
        Backend::Avx2
    }

    fn ip_float_byte(&self, query: &[f32], doc: &[i8]) -> f32 {
        if self.fma {
            // SAFETY: `fma` is only set when the CPU reports it, and avx2 is a
            // precondition of constructing `Avx2Support`.
            unsafe { ip_float_byte_avx2_fma(query, doc) }
        } else {
            scalar::ip_float_byte(query, doc)
        }
    }

    fn ip_byte_byte(&self, query: &[i8], doc: &[i8]) -> f32 {
        // SAFETY: `Avx2Support` only exists when the CPU supports avx2.
        unsafe { ip_byte_byte_avx2(query, doc) }
    }

    fn and_bit_count(&self, a: &[u8], b: &[u8]) -> u64 {
        // SAFETY: `Avx2Support` only exists when the CPU supports avx2.
        unsafe { and_bit_count_avx2(a, b) }
    }

    fn ip_byte_bin(&self, query: &[u8], doc: &[u8]) -> u64 {
        // SAFETY: `Avx2Support` only exists when the CPU supports avx2.
        unsafe { ip_byte_bin_avx2(query, doc) }
    }
}

/// Per-byte popcount via nibble lookup, folded into four `u64` lanes.
#[target_feature(enable = "avx2")]
#[inline]
fn popcount_lanes(v: __m256i) -> __m256i {
    let low_mask = _mm256_set1_epi8(0x0f);
    let lookup = _mm256_setr_epi8(
        0, 1, 1, 2, 1, 2, 2, 3, 1, 2, 2, 3, 2, 3, 3, 4, 0, 1, 1, 2, 1, 2, 2, 3, 1, 2, 2, 3, 2, 3,
        3, 4,
    );
    let lo = _mm256_and_si256(v, low_mask);
    let hi = _mm256_and_si256(_mm256_srli_epi16(v, 4), low_mask);
    let counts = _mm256_add_epi8(
        _mm256_shuffle_epi8(lookup, lo),
        _mm256_shuffle_epi8(lookup, hi),
    );
    _mm256_sad_epu8(counts, _mm256_setzero_si256())
}

#[target_feature(enable = "avx2")]
#[inline]
fn sum_u64_lanes(v: __m256i) -> u64 {
    let mut lanes = [0u64; 4];
    // SAFETY: writing exactly 4 u64 lanes to a properly sized stack array.
    unsafe { _mm256_storeu_si256(lanes.as_mut_ptr().cast::<__m256i>(), v) };
    lanes.iter().sum::<u64>()
}

#[target_feature(enable = "avx2")]
#[inline]
fn sum_i32_lanes(v: __m256i) -> i64 {
    let mut lanes = [0i32; 8];
    // SAFETY: writing exactly 8 i32 lanes to a properly sized stack array.
    unsafe { _mm256_storeu_si256(lanes.as_mut_ptr().cast::<__m256i>(), v) };
    lanes.iter().map(|&x| i64::from(x)).sum::<i64>()
}

#[target_feature(enable = "avx2")]
unsafe fn and_bit_count_avx2(a: &[u8], b: &[u8]) -> u64 {
    let n = a.len().min(b.len());
    let mut i = 0usize;
    let mut total = _mm256_setzero_si256();
    while i + 32 <= n {
        // SAFETY: bounds checked by loop guard and unaligned loads are permitted.
        let va = unsafe { _mm256_loadu_si256(a.as_ptr().add(i).cast::<__m256i>()) };
        // SAFETY: bounds checked by loop guard and unaligned loads are permitted.
        let vb = unsafe { _mm256_loadu_si256(b.as_ptr().add(i).cast::<__m256i>()) };
        total = _mm256_add_epi64(total, popcount_lanes(_mm256_and_si256(va, vb)));
        i += 32;
    }
    sum_u64_lanes(total) + scalar::and_bit_count(&a[i..n], &b[i..n])
}

/// Loads each 32-byte document block once and ANDs it against the matching
/// block of every query plane.
#[target_feature(enable = "avx2")]
unsafe fn ip_byte_bin_avx2(query: &[u8], doc: &[u8]) -> u64 {
    let d = doc.len().min(query.len() / B_QUERY);
    let mut acc = [_mm256_setzero_si256(); B_QUERY];
    let mut i = 0usize;
    while i + 32 <= d {
        // SAFETY: bounds checked by loop guard and unaligned loads are permitted.
        let vd = unsafe { _mm256_loadu_si256(doc.as_ptr().add(i).cast::<__m256i>()) };
        for (plane, slot) in acc.iter_mut().enumerate() {
            // SAFETY: plane * d + i + 32 <= B_QUERY * d <= query.len().
            let vq =
                unsafe { _mm256_loadu_si256(query.as_ptr().add(plane * d + i).cast::<__m256i>()) };
            *slot = _mm256_add_epi64(*slot, popcount_lanes(_mm256_and_si256(vd, vq)));
        }
        i += 32;
    }

    let mut out = 0u64;
    for (plane, slot) in acc.into_iter().enumerate() {
        let start = plane * d;
        let tail = scalar::and_bit_count(&doc[i..d], &query[start + i..start + d]);
        out += (sum_u64_lanes(slot) + tail) << plane;
    }
    out
}

#[target_feature(enable = "avx2")]
unsafe fn ip_byte_byte_avx2(query: &[i8], doc: &[i8]) -> f32 {
    let n = query.len().min(doc.len());
    let mut i = 0usize;
    let mut total = 0i64;
    while i + 16 <= n {
        let block_end = (i + BYTE_BLOCK).min(n);
        let mut acc = _mm256_setzero_si256();
        while i + 16 <= block_end {
            // SAFETY: bounds checked by loop guard and unaligned loads are permitted.
            let vq = unsafe { _mm_loadu_si128(query.as_ptr().add(i).cast::<__m128i>()) };
            // SAFETY: bounds checked by loop guard and unaligned loads are permitted.
            let vd = unsafe { _mm_loadu_si128(doc.as_ptr().add(i).cast::<__m128i>()) };
            let prod = _mm256_madd_epi16(_mm256_cvtepi8_epi16(vq), _mm256_cvtepi8_epi16(vd));
            acc = _mm256_add_epi32(acc, prod);
            i += 16;
        }
        total += sum_i32_lanes(acc);
    }
    for (&q, &d) in query[i..n].iter().zip(&doc[i..n]) {
        total += i64::from(q) * i64::from(d);
    }
    total as f32
}

#[target_feature(enable = "avx2,fma")]
unsafe fn ip_float_byte_avx2_fma(query: &[f32], doc: &[i8]) -> f32 {
    let n = query.len().min(doc.len());
    let mut i = 0usize;
    let mut sum0 = _mm256_setzero_ps();
    let mut sum1 = _mm256_setzero_ps();
    while i + 16 <= n {
        // SAFETY: bounds checked by loop guard; loads 8 bytes.
        let d0 = unsafe { _mm_loadl_epi64(doc.as_ptr().add(i).cast::<__m128i>()) };
        // SAFETY: bounds checked by loop guard and unaligned loads are permitted.
        let q0 = unsafe { _mm256_loadu_ps(query.as_ptr().add(i)) };
        sum0 = _mm256_fmadd_ps(q0, _mm256_cvtepi32_ps(_mm256_cvtepi8_epi32(d0)), sum0);

        // SAFETY: bounds checked by loop guard; loads 8 bytes.
        let d1 = unsafe { _mm_loadl_epi64(doc.as_ptr().add(i + 8).cast::<__m128i>()) };
        // SAFETY: bounds checked by loop guard and unaligned loads are permitted.
        let q1 = unsafe { _mm256_loadu_ps(query.as_ptr().add(i + 8)) };
        sum1 = _mm256_fmadd_ps(q1, _mm256_cvtepi32_ps(_mm256_cvtepi8_epi32(d1)), sum1);
        i += 16;
    }
    let mut sum = _mm256_add_ps(sum0, sum1);
    while i + 8 <= n {
        // SAFETY: bounds checked by loop guard; loads 8 bytes.
        let dv = unsafe { _mm_loadl_epi64(doc.as_ptr().add(i).cast::<__m128i>()) };
        // SAFETY: bounds checked by loop guard and unaligned loads are permitted.
        let qv = unsafe { _mm256_loadu_ps(query.as_ptr().add(i)) };
        sum = _mm256_fmadd_ps(qv, _mm256_cvtepi32_ps(_mm256_cvtepi8_epi32(dv)), sum);
        i += 8;
    }

    let mut lanes = [0f32; 8];
    // SAFETY: writing exactly 8 f32 lanes to a properly sized stack array.
    unsafe { _mm256_storeu_ps(lanes.as_mut_ptr(), sum) };
    let mut out = lanes.iter().sum::<f32>();
    while i < n {
        out += query[i] * f32::from(doc[i]);
        i += 1;
    }
    out
}
