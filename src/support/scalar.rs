//! Portable kernels. These are the reference every other backend is tested
//! against, and the fallback for kernels a backend does not accelerate.
//!
//! Callers validate lengths; kernels only `debug_assert` them.

use crate::B_QUERY;

/// Bit mask for component `j` (0..8) of a byte, most significant bit first.
#[inline]
fn bit_mask(j: usize) -> u8 {
    0x80u8 >> j
}

#[inline]
pub(crate) fn ip_byte_bit(query: &[i8], doc: &[u8]) -> i64 {
    debug_assert!(doc.len() >= query.len().div_ceil(8));
    let mut out = 0i64;
    for (chunk, &bits) in query.chunks(8).zip(doc) {
        if bits == 0 {
            continue;
        }
        for (j, &value) in chunk.iter().enumerate() {
            if bits & bit_mask(j) != 0 {
                out += i64::from(value);
            }
        }
    }
    out
}

#[inline]
pub(crate) fn ip_float_bit(query: &[f32], doc: &[u8]) -> f32 {
    debug_assert!(doc.len() >= query.len().div_ceil(8));
    let mut out = 0.0f32;
    for (chunk, &bits) in query.chunks(8).zip(doc) {
        if bits == 0 {
            continue;
        }
        for (j, &value) in chunk.iter().enumerate() {
            if bits & bit_mask(j) != 0 {
                out += value;
            }
        }
    }
    out
}

#[inline]
pub(crate) fn ip_float_byte(query: &[f32], doc: &[i8]) -> f32 {
    debug_assert_eq!(query.len(), doc.len());
    let n = query.len().min(doc.len());
    let mut i = 0usize;
    let mut acc0 = 0.0f32;
    let mut acc1 = 0.0f32;
    let mut acc2 = 0.0f32;
    let mut acc3 = 0.0f32;
    while i + 4 <= n {
        acc0 += query[i] * f32::from(doc[i]);
        acc1 += query[i + 1] * f32::from(doc[i + 1]);
        acc2 += query[i + 2] * f32::from(doc[i + 2]);
        acc3 += query[i + 3] * f32::from(doc[i + 3]);
        i += 4;
    }
    let mut out = (acc0 + acc1) + (acc2 + acc3);
    while i < n {
        out += query[i] * f32::from(doc[i]);
        i += 1;
    }
    out
}

/// Integer dot product of two byte-quantized vectors.
///
/// Products are summed exactly in `i64` so that any backend accumulating in
/// wider-than-product lanes lands on the same value before the final cast.
#[inline]
pub(crate) fn ip_byte_byte(query: &[i8], doc: &[i8]) -> f32 {
    debug_assert_eq!(query.len(), doc.len());
    let mut out = 0i64;
    for (&q, &d) in query.iter().zip(doc) {
        out += i64::from(q) * i64::from(d);
    }
    out as f32
}

#[inline]
pub(crate) fn and_bit_count(a: &[u8], b: &[u8]) -> u64 {
    debug_assert_eq!(a.len(), b.len());
    let n = a.len().min(b.len());
    let mut i = 0usize;
    let mut out = 0u64;
    while i + 8 <= n {
        let wa = u64::from_ne_bytes([
            a[i],
            a[i + 1],
            a[i + 2],
            a[i + 3],
            a[i + 4],
            a[i + 5],
            a[i + 6],
            a[i + 7],
        ]);
        let wb = u64::from_ne_bytes([
            b[i],
            b[i + 1],
            b[i + 2],
            b[i + 3],
            b[i + 4],
            b[i + 5],
            b[i + 6],
            b[i + 7],
        ]);
        out += u64::from((wa & wb).count_ones());
        i += 8;
    }
    while i < n {
        out += u64::from((a[i] & b[i]).count_ones());
        i += 1;
    }
    out
}

#[inline]
pub(crate) fn ip_byte_bin(query: &[u8], doc: &[u8]) -> u64 {
    debug_assert_eq!(query.len(), doc.len() * B_QUERY);
    let d = doc.len();
    let mut out = 0u64;
    for (plane, bits) in query.chunks_exact(d.max(1)).take(B_QUERY).enumerate() {
        out += and_bit_count(doc, bits) << plane;
    }
    out
}
