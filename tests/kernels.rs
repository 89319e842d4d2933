use rand::{Rng, SeedableRng, rngs::StdRng};

use simdvec::bits::{pack_bits, packed_len, transpose_half_byte};
use simdvec::{B_QUERY, KernelError, VectorUtil, provider};

fn brute_force_ip_byte_bin(query: &[u8], doc: &[u8]) -> u64 {
    let d = doc.len();
    let mut out = 0u64;
    for plane in 0..B_QUERY {
        let mut count = 0u64;
        for j in 0..d {
            let value = query[plane * d + j] & doc[j];
            for bit in 0..8 {
                if value & (1 << bit) != 0 {
                    count += 1;
                }
            }
        }
        out += count << plane;
    }
    out
}

fn random_bytes(rng: &mut StdRng, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    rng.fill(out.as_mut_slice());
    out
}

#[test]
fn ip_byte_bin_literal_scenarios() -> anyhow::Result<()> {
    for util in provider::available() {
        assert_eq!(util.ip_byte_bin(&[1, 1, 1, 1], &[1])?, 15);
        assert_eq!(util.ip_byte_bin(&[1, 2, 1, 2, 1, 2, 1, 2], &[1, 2])?, 30);

        let cases: [(&[u8], u64); 7] = [
            (&[1, 2, 3], 60),
            (&[1, 2, 3, 4], 75),
            (&[1, 2, 3, 4, 5], 105),
            (&[1, 2, 3, 4, 5, 6], 135),
            (&[1, 2, 3, 4, 5, 6, 7], 180),
            (&[1, 2, 3, 4, 5, 6, 7, 8], 195),
            (&[1, 2, 3, 4, 5, 6, 7, 8, 9], 225),
        ];
        for (doc, expected) in cases {
            let query = doc.repeat(B_QUERY);
            assert_eq!(brute_force_ip_byte_bin(&query, doc), expected);
            assert_eq!(
                util.ip_byte_bin(&query, doc)?,
                expected,
                "backend={} doc={doc:?}",
                util.backend()
            );
        }
    }
    Ok(())
}

#[test]
fn ip_byte_bin_matches_brute_force() -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(0xb1a5);
    for util in provider::available() {
        for _ in 0..50 {
            let size = rng.gen_range(0..5000);
            let mut doc = random_bytes(&mut rng, size);
            let mut query = random_bytes(&mut rng, size * B_QUERY);
            assert_eq!(
                util.ip_byte_bin(&query, &doc)?,
                brute_force_ip_byte_bin(&query, &doc)
            );

            doc.fill(i8::MAX as u8);
            query.fill(i8::MAX as u8);
            assert_eq!(
                util.ip_byte_bin(&query, &doc)?,
                brute_force_ip_byte_bin(&query, &doc)
            );

            doc.fill(i8::MIN as u8);
            query.fill(i8::MIN as u8);
            assert_eq!(
                util.ip_byte_bin(&query, &doc)?,
                brute_force_ip_byte_bin(&query, &doc)
            );

            doc.fill(u8::MAX);
            query.fill(u8::MAX);
            let all_ones = util.ip_byte_bin(&query, &doc)?;
            assert_eq!(all_ones, 8 * size as u64 * ((1 << B_QUERY) - 1));
        }
    }
    Ok(())
}

#[test]
fn ip_byte_bin_rejects_short_query() {
    let mut rng = StdRng::seed_from_u64(7);
    for util in provider::available() {
        for _ in 0..10 {
            let size = rng.gen_range(1..=10);
            let doc = vec![0u8; size];
            let query = vec![0u8; size * B_QUERY - 1];
            let err = util.ip_byte_bin(&query, &doc).unwrap_err();
            assert_eq!(
                err,
                KernelError::QueryLength {
                    actual: size * B_QUERY - 1,
                    doc_len: size,
                    planes: B_QUERY,
                }
            );
        }
    }
}

#[test]
fn and_bit_count_basics() -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(31);
    for util in provider::available() {
        assert_eq!(util.and_bit_count(&[0], &[0])?, 0);
        assert_eq!(util.and_bit_count(&[1], &[0])?, 0);
        assert_eq!(util.and_bit_count(&[0], &[1])?, 0);
        assert_eq!(util.and_bit_count(&[1], &[1])?, 1);

        let a = random_bytes(&mut rng, 31);
        let b = random_bytes(&mut rng, 31);
        let expected = a
            .iter()
            .zip(&b)
            .map(|(x, y)| u64::from((x & y).count_ones()))
            .sum::<u64>();
        assert_eq!(util.and_bit_count(&a, &b)?, expected);
    }
    Ok(())
}

#[test]
fn bit_vector_kernels_read_msb_first() -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(16);
    let doc = [0b0110_0010u8, 0b1010_0111];
    let set = [1usize, 2, 6, 8, 10, 13, 14, 15];

    let q_bytes = (0..16).map(|_| rng.r#gen::<i8>()).collect::<Vec<_>>();
    let q_floats = (0..16).map(|_| rng.r#gen::<f32>()).collect::<Vec<_>>();
    let want_bytes = set.iter().map(|&i| i64::from(q_bytes[i])).sum::<i64>();
    let want_floats = set.iter().map(|&i| q_floats[i]).sum::<f32>();

    for util in provider::available() {
        assert_eq!(util.ip_byte_bit(&q_bytes, &doc)?, want_bytes);
        assert!((util.ip_float_bit(&q_floats, &doc)? - want_floats).abs() < 1e-6);
    }
    Ok(())
}

#[test]
fn bit_vector_kernels_handle_extreme_fills() -> anyhow::Result<()> {
    for util in provider::available() {
        for dims in [1usize, 9, 1000] {
            let doc = vec![u8::MAX; packed_len(dims)];
            let n = dims as i64;
            assert_eq!(util.ip_byte_bit(&vec![i8::MAX; dims], &doc)?, 127 * n);
            assert_eq!(util.ip_byte_bit(&vec![i8::MIN; dims], &doc)?, -128 * n);
            assert_eq!(util.ip_float_bit(&vec![1.0; dims], &doc)?, dims as f32);
            assert_eq!(util.ip_float_bit(&vec![-1.0; dims], &doc)?, -(dims as f32));
        }

        // Past i32::MAX / 127 components the sum no longer fits in 32 bits.
        let dims = 17_000_000usize;
        let doc = vec![u8::MAX; dims / 8];
        assert_eq!(
            util.ip_byte_bit(&vec![i8::MAX; dims], &doc)?,
            17_000_000i64 * 127
        );
        assert_eq!(
            util.ip_byte_bit(&vec![i8::MIN; dims], &doc)?,
            17_000_000i64 * -128
        );
    }
    Ok(())
}

#[test]
fn all_zero_inputs_score_zero() -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(0);
    let q_bytes = (0..33).map(|_| rng.r#gen::<i8>()).collect::<Vec<_>>();
    let q_floats = (0..33).map(|_| rng.r#gen::<f32>()).collect::<Vec<_>>();
    let doc_bits = [0u8; 5];

    for util in provider::available() {
        assert_eq!(util.ip_byte_byte(&[0; 33], &[0; 33])?, 0.0);
        assert_eq!(util.ip_byte_byte(&q_bytes, &[0; 33])?, 0.0);
        assert_eq!(util.ip_float_byte(&[0.0; 33], &[0; 33])?, 0.0);
        assert_eq!(util.ip_float_byte(&q_floats, &[0; 33])?, 0.0);
        assert_eq!(util.ip_byte_bit(&[0; 33], &doc_bits)?, 0);
        assert_eq!(util.ip_byte_bit(&q_bytes, &doc_bits)?, 0);
        assert_eq!(util.ip_float_bit(&[0.0; 33], &doc_bits)?, 0.0);
        assert_eq!(util.ip_float_bit(&q_floats, &doc_bits)?, 0.0);
        assert_eq!(util.and_bit_count(&[0; 33], &[0xff; 33])?, 0);
        assert_eq!(util.ip_byte_bin(&[0xff; 20], &doc_bits)?, 0);
    }
    Ok(())
}

#[test]
fn ip_float_byte_matches_sequential_reference() -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(0xf10a7);
    for util in provider::available() {
        for _ in 0..20 {
            let size = rng.gen_range(1..=1024);
            let q = (0..size).map(|_| rng.r#gen::<f32>()).collect::<Vec<_>>();
            let d = (0..size).map(|_| rng.r#gen::<i8>()).collect::<Vec<_>>();
            let mut expected = 0.0f32;
            let mut magnitude = 0.0f32;
            for i in 0..size {
                expected += q[i] * f32::from(d[i]);
                magnitude += (q[i] * f32::from(d[i])).abs();
            }
            // Summation error grows with both length and the summed magnitude.
            let delta = 1e-6 * size as f32 * magnitude.max(1.0);
            let got = util.ip_float_byte(&q, &d)?;
            assert!(
                (got - expected).abs() <= delta,
                "backend={} size={size} got={got} expected={expected}",
                util.backend()
            );
        }
    }
    Ok(())
}

#[test]
fn quantized_query_against_packed_document() -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(4);
    for util in provider::available() {
        for dims in [1usize, 7, 8, 63, 130, 1000] {
            let query = (0..dims).map(|_| rng.gen_range(0..16u8)).collect::<Vec<_>>();
            let doc = (0..dims).map(|_| rng.gen_range(0..2u8)).collect::<Vec<_>>();

            let mut planes = vec![0u8; packed_len(dims) * B_QUERY];
            transpose_half_byte(&query, &mut planes)?;
            let mut packed = vec![0u8; packed_len(dims)];
            pack_bits(&doc, &mut packed)?;

            let expected = query
                .iter()
                .zip(&doc)
                .map(|(&q, &d)| u64::from(q) * u64::from(d))
                .sum::<u64>();
            assert_eq!(util.ip_byte_bin(&planes, &packed)?, expected, "dims={dims}");
        }
    }
    Ok(())
}

#[test]
fn facade_uses_default_provider() -> anyhow::Result<()> {
    let util = VectorUtil::get();
    assert_eq!(
        simdvec::ip_byte_bin(&[1, 2, 1, 2, 1, 2, 1, 2], &[1, 2])?,
        util.ip_byte_bin(&[1, 2, 1, 2, 1, 2, 1, 2], &[1, 2])?
    );
    assert_eq!(simdvec::and_bit_count(&[0xff], &[0x0f])?, 4);
    assert_eq!(simdvec::ip_byte_byte(&[2, -3], &[4, 5])?, -7.0);
    assert!(simdvec::ip_float_byte(&[1.0], &[]).is_err());
    Ok(())
}
