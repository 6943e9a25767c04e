//! `lanebench` demo driver: fills seeded random buffers, runs each kernel in
//! its scalar, SIMD and SIMD+parallel variants and prints the speedups.

use std::path::PathBuf;

use anyhow::{ensure, Context};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lanebench::parallel::{
    available_cores, par_batched_dot_product_with, par_cosine_similarity_with,
    par_dot_product_with, par_elementwise_transform_with, par_root_product_with, par_saxpy_with,
};
use lanebench::simd::standard_widths;
use lanebench::{
    batched_dot_product_with, cosine_similarity_with, dot_product_with,
    elementwise_transform_with, preferred_width, rank_by_similarity_with, root_product_with,
    saxpy_with,
    simd_level, within_tolerance, Backend, Comparison, ElementKind, Harness, HarnessConfig,
    WidthDescriptor, DEFAULT_TOLERANCE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Demo {
    Capabilities,
    Dot,
    Cosine,
    Transform,
    RootProduct,
    Hashing,
    Saxpy,
    Recommend,
    All,
}

/// Scalar vs SIMD vs parallel-SIMD kernel benchmarks
#[derive(Parser, Debug)]
#[command(name = "lanebench")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Demo to run
    #[arg(value_enum, default_value = "all")]
    demo: Demo,

    /// Elements per buffer for the vector kernels
    #[arg(short, long, default_value = "1000000", env = "LANEBENCH_SIZE")]
    size: usize,

    /// Rows of the hashing and recommend batches
    #[arg(long, default_value = "1000", env = "LANEBENCH_ROWS")]
    rows: usize,

    /// Columns (embedding dimension) of the hashing and recommend batches
    #[arg(long, default_value = "512", env = "LANEBENCH_DIM")]
    dim: usize,

    /// Warm-up calls before timing, overrides the config file
    #[arg(long, env = "LANEBENCH_WARMUP")]
    warmup: Option<u32>,

    /// Timed calls per variant, overrides the config file
    #[arg(long, env = "LANEBENCH_ITERATIONS")]
    iterations: Option<u32>,

    /// Lane count of the SIMD variants instead of the detected width
    #[arg(long, env = "LANEBENCH_LANES")]
    lanes: Option<usize>,

    /// Seed of the input buffers
    #[arg(long, default_value = "42", env = "LANEBENCH_SEED")]
    seed: u64,

    /// TOML file with a harness configuration
    #[arg(long, env = "LANEBENCH_CONFIG")]
    config: Option<PathBuf>,
}

/// Everything a demo needs: the harness, both widths and the input generator.
struct Session {
    harness: Harness,
    scalar: WidthDescriptor,
    simd: WidthDescriptor,
    cores: usize,
    rng: StdRng,
}

impl Session {
    fn buffer(&mut self, len: usize) -> Vec<f32> {
        (0..len).map(|_| self.rng.random_range(-1.0f32..1.0)).collect()
    }

    fn batch(&mut self, rows: usize, dim: usize) -> Vec<Vec<f32>> {
        (0..rows).map(|_| self.buffer(dim)).collect()
    }
}

fn harness_config(args: &Args) -> anyhow::Result<HarnessConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            HarnessConfig::from_toml_str(&source)?
        }
        None => HarnessConfig::default(),
    };
    if let Some(warmup) = args.warmup {
        config = config.with_warmup_iterations(warmup);
    }
    if let Some(iterations) = args.iterations {
        config = config.with_measured_iterations(iterations);
    }
    config.validate()?;
    Ok(config)
}

/// Reductions over long random buffers accumulate rounding differently per
/// width, so a disagreement is reported but does not abort the run.
fn check_agreement(name: &str, scalar: f32, others: &[f32]) {
    let disagreeing: Vec<f32> = others
        .iter()
        .copied()
        .filter(|&value| !within_tolerance(value, scalar, DEFAULT_TOLERANCE))
        .collect();
    if disagreeing.is_empty() {
        tracing::info!(name, result = scalar, "variants agree");
    } else {
        tracing::warn!(name, scalar, ?disagreeing, "variants outside tolerance");
    }
}

fn capabilities(ctx: &Session) {
    println!("SIMD level:      {}", simd_level());
    println!("Preferred f32:   {}", preferred_width(ElementKind::Float));
    println!("SIMD variant:    {}", ctx.simd);
    println!("Rayon cores:     {}", ctx.cores);
    println!(
        "Backends:        {}",
        Backend::available()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!();
    println!("{:<8} {:>20} {:>10}", "type", "preferred", "max gain");
    for kind in ElementKind::ALL {
        let width = preferred_width(kind);
        println!(
            "{:<8} {:>20} {:>9.0}x",
            kind.name(),
            width.to_string(),
            width.theoretical_speedup()
        );
    }
    println!();
    for kind in [ElementKind::Float, ElementKind::Double] {
        let shapes: Vec<String> = standard_widths(kind).iter().map(ToString::to_string).collect();
        println!("{:<8} {}", kind.name(), shapes.join(" | "));
    }
}

fn dot(ctx: &mut Session, size: usize) -> anyhow::Result<Comparison> {
    let a = ctx.buffer(size);
    let b = ctx.buffer(size);
    let (scalar, simd, cores) = (ctx.scalar, ctx.simd, ctx.cores);

    let expected = dot_product_with(scalar, &a, &b)?;
    check_agreement(
        "dot",
        expected,
        &[
            dot_product_with(simd, &a, &b)?,
            par_dot_product_with(simd, cores, &a, &b)?,
        ],
    );

    Ok(Comparison::new(format!("dot product, {size} elements"))
        .with_sample(ctx.harness.measure("scalar", || dot_product_with(scalar, &a, &b)))
        .with_sample(ctx.harness.measure("simd", || dot_product_with(simd, &a, &b)))
        .with_sample(ctx.harness.measure("simd+parallel", || {
            par_dot_product_with(simd, cores, &a, &b)
        })))
}

fn cosine(ctx: &mut Session, size: usize) -> anyhow::Result<Comparison> {
    let a = ctx.buffer(size);
    let b = ctx.buffer(size);
    let (scalar, simd, cores) = (ctx.scalar, ctx.simd, ctx.cores);

    let expected = cosine_similarity_with(scalar, &a, &b)?;
    check_agreement(
        "cosine",
        expected,
        &[
            cosine_similarity_with(simd, &a, &b)?,
            par_cosine_similarity_with(simd, cores, &a, &b)?,
        ],
    );

    Ok(Comparison::new(format!("cosine similarity, {size} elements"))
        .with_sample(ctx.harness.measure("scalar", || cosine_similarity_with(scalar, &a, &b)))
        .with_sample(ctx.harness.measure("simd", || cosine_similarity_with(simd, &a, &b)))
        .with_sample(ctx.harness.measure("simd+parallel", || {
            par_cosine_similarity_with(simd, cores, &a, &b)
        })))
}

fn transform(ctx: &mut Session, size: usize) -> anyhow::Result<Comparison> {
    let a = ctx.buffer(size);
    let b = ctx.buffer(size);
    let (scalar, simd, cores) = (ctx.scalar, ctx.simd, ctx.cores);

    let expected = elementwise_transform_with(scalar, &a, &b)?;
    let vector = elementwise_transform_with(simd, &a, &b)?;
    let parallel = par_elementwise_transform_with(simd, cores, &a, &b)?;
    let same = |x: &f32, y: &f32| x == y || (x.is_nan() && y.is_nan());
    ensure!(
        expected.iter().zip(&vector).all(|(x, y)| same(x, y))
            && expected.iter().zip(&parallel).all(|(x, y)| same(x, y)),
        "transform: vector output differs from scalar output"
    );
    tracing::info!(
        nan = expected.iter().filter(|x| x.is_nan()).count(),
        "transform variants agree"
    );

    Ok(Comparison::new(format!("sqrt(sin(a * b)), {size} elements"))
        .with_sample(ctx.harness.measure("scalar", || elementwise_transform_with(scalar, &a, &b)))
        .with_sample(ctx.harness.measure("simd", || elementwise_transform_with(simd, &a, &b)))
        .with_sample(ctx.harness.measure("simd+parallel", || {
            par_elementwise_transform_with(simd, cores, &a, &b)
        })))
}

fn root_product(ctx: &mut Session, size: usize) -> anyhow::Result<Comparison> {
    // non-negative inputs, so no lane produces NaN
    let a: Vec<f32> = ctx.buffer(size).iter().map(|x| x.abs()).collect();
    let b: Vec<f32> = ctx.buffer(size).iter().map(|x| x.abs()).collect();
    let (scalar, simd, cores) = (ctx.scalar, ctx.simd, ctx.cores);

    let expected = root_product_with(scalar, &a, &b)?;
    ensure!(
        root_product_with(simd, &a, &b)? == expected
            && par_root_product_with(simd, cores, &a, &b)? == expected,
        "root product: vector output differs from scalar output"
    );

    Ok(Comparison::new(format!("sqrt(sqrt(a) * sqrt(b) + a * b), {size} elements"))
        .with_sample(ctx.harness.measure("scalar", || root_product_with(scalar, &a, &b)))
        .with_sample(ctx.harness.measure("simd", || root_product_with(simd, &a, &b)))
        .with_sample(ctx.harness.measure("simd+parallel", || {
            par_root_product_with(simd, cores, &a, &b)
        })))
}

fn saxpy(ctx: &mut Session, size: usize) -> anyhow::Result<Comparison> {
    let a = ctx.buffer(size);
    let b = ctx.buffer(size);
    let scale = ctx.rng.random_range(-2.0f32..2.0);
    let (scalar, simd, cores) = (ctx.scalar, ctx.simd, ctx.cores);

    let expected = saxpy_with(scalar, scale, &a, &b)?;
    ensure!(
        saxpy_with(simd, scale, &a, &b)? == expected
            && par_saxpy_with(simd, cores, scale, &a, &b)? == expected,
        "saxpy: vector output differs from scalar output"
    );

    Ok(Comparison::new(format!("saxpy, {size} elements"))
        .with_sample(ctx.harness.measure("scalar", || saxpy_with(scalar, scale, &a, &b)))
        .with_sample(ctx.harness.measure("simd", || saxpy_with(simd, scale, &a, &b)))
        .with_sample(ctx.harness.measure("simd+parallel", || {
            par_saxpy_with(simd, cores, scale, &a, &b)
        })))
}

fn hashing(ctx: &mut Session, rows: usize, dim: usize) -> anyhow::Result<Comparison> {
    let batch = ctx.batch(rows, dim);
    let weights = ctx.buffer(dim);
    let (scalar, simd, cores) = (ctx.scalar, ctx.simd, ctx.cores);

    let expected = batched_dot_product_with(scalar, &batch, &weights)?;
    check_agreement(
        "hashing",
        expected,
        &[
            batched_dot_product_with(simd, &batch, &weights)?,
            par_batched_dot_product_with(simd, cores, &batch, &weights)?,
        ],
    );

    Ok(Comparison::new(format!("batched dot product, {rows} x {dim}"))
        .with_sample(ctx.harness.measure("scalar", || {
            batched_dot_product_with(scalar, &batch, &weights)
        }))
        .with_sample(ctx.harness.measure("simd", || {
            batched_dot_product_with(simd, &batch, &weights)
        }))
        .with_sample(ctx.harness.measure("simd+parallel", || {
            par_batched_dot_product_with(simd, cores, &batch, &weights)
        })))
}

fn recommend(ctx: &mut Session, rows: usize, dim: usize) -> anyhow::Result<Comparison> {
    let items = ctx.batch(rows, dim);
    let query = ctx.buffer(dim);
    let (scalar, simd) = (ctx.scalar, ctx.simd);

    let top = rank_by_similarity_with(simd, &query, &items, Some(5))?;
    for (rank, entry) in top.iter().enumerate() {
        println!("#{:<2} item {:>6}  similarity {:+.4}", rank + 1, entry.index, entry.similarity);
    }

    Ok(Comparison::new(format!("rank {rows} items of dimension {dim}"))
        .with_sample(ctx.harness.measure("scalar", || {
            rank_by_similarity_with(scalar, &query, &items, Some(5))
        }))
        .with_sample(ctx.harness.measure("simd", || {
            rank_by_similarity_with(simd, &query, &items, Some(5))
        })))
}

fn run(demo: Demo, ctx: &mut Session, args: &Args) -> anyhow::Result<()> {
    let report = match demo {
        Demo::Capabilities => {
            capabilities(ctx);
            return Ok(());
        }
        Demo::Dot => dot(ctx, args.size)?,
        Demo::Cosine => cosine(ctx, args.size)?,
        Demo::Transform => transform(ctx, args.size)?,
        Demo::RootProduct => root_product(ctx, args.size)?,
        Demo::Saxpy => saxpy(ctx, args.size)?,
        Demo::Hashing => hashing(ctx, args.rows, args.dim)?,
        Demo::Recommend => recommend(ctx, args.rows, args.dim)?,
        Demo::All => {
            for demo in [
                Demo::Capabilities,
                Demo::Dot,
                Demo::Cosine,
                Demo::Transform,
                Demo::RootProduct,
                Demo::Saxpy,
                Demo::Hashing,
                Demo::Recommend,
            ] {
                run(demo, ctx, args)?;
                println!();
            }
            return Ok(());
        }
    };
    print!("{report}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    ensure!(args.size > 0, "--size must be positive");
    ensure!(args.rows > 0 && args.dim > 0, "--rows and --dim must be positive");

    let simd = match args.lanes {
        Some(lanes) => WidthDescriptor::new(lanes, lanes * ElementKind::Float.bits())?,
        None => preferred_width(ElementKind::Float),
    };
    Backend::select(simd).with_context(|| format!("--lanes {}", simd.lanes()))?;

    let config = harness_config(&args)?;
    tracing::info!(?config, %simd, seed = args.seed, "starting lanebench");

    let mut ctx = Session {
        harness: Harness::new(config),
        scalar: WidthDescriptor::scalar(ElementKind::Float),
        simd,
        cores: available_cores(),
        rng: StdRng::seed_from_u64(args.seed),
    };
    run(args.demo, &mut ctx, &args)
}
