//! Encoders for the packed layouts the kernels consume.

use crate::B_QUERY;
use crate::error::{KernelError, Result};

/// Bytes needed to pack `dims` one-bit components.
#[inline]
pub fn packed_len(dims: usize) -> usize {
    dims.div_ceil(8)
}

/// Packs one-bit components (any non-zero byte is a set bit) MSB first.
/// Padding bits in the last byte are left zero.
pub fn pack_bits(components: &[u8], out: &mut [u8]) -> Result<()> {
    let expected = packed_len(components.len());
    if out.len() != expected {
        return Err(KernelError::PackedLength {
            expected,
            actual: out.len(),
        });
    }
    out.fill(0);
    for (i, &c) in components.iter().enumerate() {
        if c != 0 {
            out[i >> 3] |= 0x80 >> (i & 7);
        }
    }
    Ok(())
}

/// Splits 4-bit quantized components into [`B_QUERY`] packed bit-planes.
///
/// Plane `p` holds bit `p` of every component and starts at
/// `p * packed_len(query.len())`. Bits above `B_QUERY` are ignored.
pub fn transpose_half_byte(query: &[u8], out: &mut [u8]) -> Result<()> {
    let stride = packed_len(query.len());
    let expected = stride * B_QUERY;
    if out.len() != expected {
        return Err(KernelError::PackedLength {
            expected,
            actual: out.len(),
        });
    }
    out.fill(0);
    for (i, &value) in query.iter().enumerate() {
        let mask = 0x80u8 >> (i & 7);
        for plane in 0..B_QUERY {
            if (value >> plane) & 1 != 0 {
                out[plane * stride + (i >> 3)] |= mask;
            }
        }
    }
    Ok(())
}
