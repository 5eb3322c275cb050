use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const PIPELINE_BINARIES: [&str; 2] = ["generate_bank_data", "bank_pipeline"];
const SMOKE_ROOT: &str = "target/bank_smoke";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the banking data pipeline workspace",
    long_about = "A unified CLI for generating data, running the pipeline locally,\n\
                  benchmarks, CI checks and release packaging."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and publish a dataset into the local store
    Generate {
        #[arg(long, default_value_t = 50)]
        count: usize,
        #[arg(long)]
        seed: Option<u64>,
        /// YYYY-MM-DD; today when omitted
        #[arg(long)]
        run_date: Option<String>,
    },
    /// Run the pipeline once against the local store
    RunPipeline {
        #[arg(long)]
        run_date: Option<String>,
    },
    /// Generate then load into a scratch store under target/
    Smoke,
    /// Run Criterion benchmarks
    Bench,
    /// Run CI checks (fmt, clippy, tests, smoke run, benchmarks)
    Ci {
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build both binaries and zip them for deployment
    Package {
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// End-to-end run against a scratch local store
    Smoke,
    /// Run benchmarks
    Bench,
    /// Run check + smoke + bench
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn run_cargo(args: &[&str]) -> anyhow::Result<()> {
    eprintln!("+ cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(args)
        .status()
        .context("failed to execute cargo")?;
    if !status.success() {
        bail!("cargo {} exited with {status}", args.join(" "));
    }
    Ok(())
}

fn run_binary(bin: &str, args: &[&str]) -> anyhow::Result<()> {
    let mut cargo_args = vec!["run", "-q", "-p", "bank_pipeline", "--bin", bin, "--"];
    cargo_args.extend_from_slice(args);
    run_cargo(&cargo_args)
}

fn generate(local_root: &str, count: usize, seed: Option<u64>, run_date: Option<&str>) -> anyhow::Result<()> {
    let count = count.to_string();
    let seed = seed.map(|seed| seed.to_string());
    let mut args = vec!["--local-root", local_root, "--count", count.as_str()];
    if let Some(seed) = &seed {
        args.extend(["--seed", seed.as_str()]);
    }
    if let Some(run_date) = run_date {
        args.extend(["--run-date", run_date]);
    }
    run_binary("generate_bank_data", &args)
}

fn run_pipeline(local_root: &str, run_date: Option<&str>) -> anyhow::Result<()> {
    let mut args = vec!["--local-root", local_root, "run-once"];
    if let Some(run_date) = run_date {
        args.extend(["--run-date", run_date]);
    }
    run_binary("bank_pipeline", &args)
}

fn smoke() -> anyhow::Result<()> {
    let root = Path::new(SMOKE_ROOT);
    if root.exists() {
        fs::remove_dir_all(root).with_context(|| format!("failed to clear {SMOKE_ROOT}"))?;
    }

    step("Generate smoke dataset");
    generate(SMOKE_ROOT, 25, Some(42), Some("2026-02-14"))?;

    step("Run pipeline against smoke dataset");
    run_pipeline(SMOKE_ROOT, Some("2026-02-14"))?;

    step("Export joined table");
    let output = root.join("cust_acc.csv");
    let output_arg = output.to_string_lossy().into_owned();
    run_binary(
        "bank_pipeline",
        &[
            "--local-root",
            SMOKE_ROOT,
            "export-table",
            "--table",
            "bank-data.Transformed_dataset.cust_acc",
            "--output",
            &output_arg,
        ],
    )?;

    let exported = fs::read_to_string(&output)
        .with_context(|| format!("failed to read {}", output.display()))?;
    let rows = exported.lines().count().saturating_sub(1);
    if rows != 25 {
        bail!("expected 25 joined rows, found {rows}");
    }
    eprintln!("Smoke run produced {rows} joined rows.");
    Ok(())
}

fn binary_name(bin_name: &str, target: &str) -> String {
    if target.contains("windows") {
        format!("{bin_name}.exe")
    } else {
        bin_name.to_string()
    }
}

fn package(target: &str, profile: BuildProfile) -> anyhow::Result<()> {
    step("Build pipeline binaries");
    let mut cargo_args = vec!["build", "-p", "bank_pipeline", "--target", target];
    for bin in PIPELINE_BINARIES {
        cargo_args.extend(["--bin", bin]);
    }
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args)?;

    step("Package release archive");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    let dist_dir = Path::new("dist");
    fs::create_dir_all(dist_dir).context("failed to create dist directory")?;

    let binaries: Vec<(String, PathBuf)> = PIPELINE_BINARIES
        .iter()
        .map(|bin| {
            let name = binary_name(bin, target);
            let path = target_dir.join(&name);
            (name, path)
        })
        .collect();
    let zip_path = dist_dir.join(format!("bank_pipeline-{target}.zip"));
    write_zip(&binaries, &zip_path)?;

    eprintln!("\nPackaged artifact:\n- {}", zip_path.display());
    Ok(())
}

fn write_zip(entries: &[(String, PathBuf)], zip_path: &Path) -> anyhow::Result<()> {
    let file = fs::File::create(zip_path)
        .with_context(|| format!("failed to create {}", zip_path.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);

    for (name, path) in entries {
        if !path.exists() {
            bail!("expected binary at '{}'", path.display());
        }
        let binary = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        zip.start_file(name.as_str(), options)
            .with_context(|| format!("failed to start zip entry {name}"))?;
        zip.write_all(&binary)
            .with_context(|| format!("failed to write zip entry {name}"))?;
    }

    zip.finish().context("failed to finish zip archive")?;
    Ok(())
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() -> anyhow::Result<()> {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"])?;

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ])?;

    for package in ["bank_core", "bank_datagen", "bank_pipeline"] {
        step(&format!("Test {package}"));
        run_cargo(&["test", "-p", package])?;
    }
    Ok(())
}

fn ci_bench() -> anyhow::Result<()> {
    step("Run benchmarks");
    run_cargo(&["bench", "--package", "bank_datagen", "--bench", "generation"])
}

// ── main ───────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let local_root = ".bank_store";

    match cli.command {
        Commands::Generate {
            count,
            seed,
            run_date,
        } => generate(local_root, count, seed, run_date.as_deref())?,
        Commands::RunPipeline { run_date } => run_pipeline(local_root, run_date.as_deref())?,
        Commands::Smoke => smoke()?,
        Commands::Bench => ci_bench()?,
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check()?,
                CiJob::Smoke => smoke()?,
                CiJob::Bench => ci_bench()?,
                CiJob::All => {
                    ci_check()?;
                    smoke()?;
                    ci_bench()?;
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::Package { target, profile } => package(&target, profile)?,
    }
    Ok(())
}
