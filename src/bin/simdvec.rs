use clap::{Parser, Subcommand};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing_subscriber::EnvFilter;

use simdvec::{B_QUERY, VectorUtil, provider};

#[derive(Debug, Parser)]
#[command(name = "simdvec")]
#[command(version = simdvec::VERSION)]
#[command(about = "Vector kernel backend tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print detected CPU features and the selected backend.
    Probe,
    /// Compare every available backend against the scalar kernels.
    SelfTest {
        #[arg(long, default_value_t = 1024)]
        dims: usize,
        #[arg(long, default_value_t = 100)]
        iterations: usize,
        #[arg(long, default_value_t = 0x5eed)]
        seed: u64,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Probe => probe(),
        Command::SelfTest {
            dims,
            iterations,
            seed,
        } => self_test(dims, iterations, seed),
    }
}

fn probe() -> anyhow::Result<()> {
    for (name, present) in cpu_features() {
        println!("feature.{name}={present}");
    }
    let available = provider::available()
        .iter()
        .map(|p| p.backend().as_str())
        .collect::<Vec<_>>();
    println!("available={}", available.join(","));
    println!("selected={}", VectorUtil::get().backend());
    Ok(())
}

#[allow(unused_mut)]
fn cpu_features() -> Vec<(&'static str, bool)> {
    let mut out = Vec::new();
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        out.push(("avx2", std::is_x86_feature_detected!("avx2")));
        out.push(("fma", std::is_x86_feature_detected!("fma")));
        out.push(("popcnt", std::is_x86_feature_detected!("popcnt")));
    }
    #[cfg(target_arch = "aarch64")]
    {
        out.push(("neon", std::arch::is_aarch64_feature_detected!("neon")));
    }
    out
}

fn self_test(dims: usize, iterations: usize, seed: u64) -> anyhow::Result<()> {
    let scalar = VectorUtil::new(provider::scalar());
    let mut rng = StdRng::seed_from_u64(seed);
    let mut failures = 0usize;

    for candidate in provider::available().into_iter().skip(1) {
        for iter in 0..iterations {
            let len = rng.gen_range(0..=dims);
            let doc_bits = random_bytes(&mut rng, len);
            let other_bits = random_bytes(&mut rng, len);
            let planes = random_bytes(&mut rng, len * B_QUERY);
            let q_bytes = random_bytes(&mut rng, len)
                .into_iter()
                .map(|b| b as i8)
                .collect::<Vec<_>>();
            let d_bytes = random_bytes(&mut rng, len)
                .into_iter()
                .map(|b| b as i8)
                .collect::<Vec<_>>();
            let q_floats = (0..len).map(|_| rng.r#gen::<f32>()).collect::<Vec<_>>();

            let mut check = |kernel: &str, agrees: bool| {
                if !agrees {
                    failures += 1;
                    eprintln!(
                        "self-test mismatch: backend={} kernel={kernel} iter={iter} len={len}",
                        candidate.backend()
                    );
                }
            };

            check(
                "and_bit_count",
                candidate.and_bit_count(&doc_bits, &other_bits)?
                    == scalar.and_bit_count(&doc_bits, &other_bits)?,
            );
            check(
                "ip_byte_bin",
                candidate.ip_byte_bin(&planes, &doc_bits)?
                    == scalar.ip_byte_bin(&planes, &doc_bits)?,
            );
            check(
                "ip_byte_byte",
                candidate.ip_byte_byte(&q_bytes, &d_bytes)?
                    == scalar.ip_byte_byte(&q_bytes, &d_bytes)?,
            );
            let got = candidate.ip_float_byte(&q_floats, &d_bytes)?;
            let want = scalar.ip_float_byte(&q_floats, &d_bytes)?;
            let magnitude = q_floats
                .iter()
                .zip(&d_bytes)
                .map(|(q, d)| (q * f32::from(*d)).abs())
                .sum::<f32>();
            let tolerance = 1e-6 * (len.max(1) as f32) * magnitude.max(1.0);
            check("ip_float_byte", (got - want).abs() <= tolerance);
        }
        println!(
            "backend={} iterations={iterations} dims<={dims}",
            candidate.backend()
        );
    }

    if failures > 0 {
        anyhow::bail!("{failures} kernel mismatches against scalar");
    }
    println!("ok");
    Ok(())
}

fn random_bytes(rng: &mut StdRng, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    rng.fill(out.as_mut_slice());
    out
}
