use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_PACKAGE: &str = "cloud_sweep_lambda";

/// Every scheduled handler shipped as its own Lambda function.
const LAMBDA_BINARIES: [&str; 4] = [
    "instance_scheduler",
    "encryption_audit",
    "snapshot_lifecycle",
    "object_expiry",
];

const WORKSPACE_CRATES: [&str; 2] = ["cloud_sweep_core", "cloud_sweep_lambda"];

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the cloud sweep workspace",
    long_about = "A unified CLI for CI checks and Lambda packaging in the\n\
                  cloud sweep workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build the handler binaries and zip each one as a Lambda `bootstrap`
    ServerlessPackage {
        /// Compilation target triple for Lambda binaries
        #[arg(long, env = "LAMBDA_TARGET", default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for binaries
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Directory receiving one `<handler>.zip` per binary
        #[arg(long, default_value = "dist")]
        dist_dir: PathBuf,
        /// Package only this handler (repeatable); all handlers by default
        #[arg(long = "bin", value_parser = clap::builder::PossibleValuesParser::new(LAMBDA_BINARIES))]
        bins: Vec<String>,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Tests only
    Test,
    /// Release build of every handler binary
    Build,
    /// Run check + build
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

fn fail(message: impl AsRef<str>) -> ! {
    eprintln!("error: {}", message.as_ref());
    exit(1);
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .unwrap_or_else(|error| fail(format!("failed to execute cargo: {error}")))
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn selected_binaries(bins: &[String]) -> Vec<&str> {
    if bins.is_empty() {
        return LAMBDA_BINARIES.to_vec();
    }
    LAMBDA_BINARIES
        .into_iter()
        .filter(|name| bins.iter().any(|bin| bin == name))
        .collect()
}

fn build_lambda_binaries(target: Option<&str>, profile: BuildProfile, bins: &[&str]) {
    let mut cargo_args = vec!["build", "-p", LAMBDA_PACKAGE];
    if let Some(target) = target {
        cargo_args.extend(["--target", target]);
    }
    for bin in bins {
        cargo_args.extend(["--bin", *bin]);
    }
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);
}

fn package_serverless_lambdas(
    target: &str,
    profile: BuildProfile,
    dist_dir: &Path,
    bins: &[String],
) {
    ensure_rust_target_installed(target);

    let bins = selected_binaries(bins);
    step("Build handler binaries");
    build_lambda_binaries(Some(target), profile, &bins);

    step("Package Lambda zip artifacts");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    fs::create_dir_all(dist_dir).unwrap_or_else(|error| {
        fail(format!(
            "failed to create dist directory '{}': {error}",
            dist_dir.display()
        ))
    });

    let mut packaged = Vec::with_capacity(bins.len());
    for bin in bins {
        let zip_path = dist_dir.join(format!("{bin}.zip"));
        package_lambda_zip(&target_dir.join(binary_name(bin, target)), &zip_path);
        packaged.push(zip_path);
    }

    eprintln!("\nPackaged artifacts:");
    for path in packaged {
        eprintln!("- {}", path.display());
    }
}

fn ensure_rust_target_installed(target: &str) {
    let output = match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(value) => value,
        Err(error) => {
            eprintln!(
                "warning: failed to run `rustup target list --installed` ({error}); continuing without target preflight"
            );
            return;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        fail(format!(
            "failed to list installed rust targets: {}",
            stderr.trim()
        ));
    }

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        fail(format!(
            "rust target `{target}` is not installed. run `rustup target add {target}` and retry `cargo run -p xtask -- serverless-package`"
        ));
    }
}

fn binary_name(bin_name: &str, target: &str) -> String {
    if target.contains("windows") {
        format!("{bin_name}.exe")
    } else {
        bin_name.to_string()
    }
}

/// Lambda's custom runtime executes a file named `bootstrap` at the archive root.
fn package_lambda_zip(binary_path: &Path, zip_path: &Path) {
    if !binary_path.exists() {
        fail(format!(
            "expected lambda binary at '{}'",
            binary_path.display()
        ));
    }

    let result = (|| -> Result<(), Box<dyn std::error::Error>> {
        let binary = fs::read(binary_path)?;
        let mut zip = ZipWriter::new(fs::File::create(zip_path)?);
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o755);
        zip.start_file("bootstrap", options)?;
        zip.write_all(&binary)?;
        zip.finish()?;
        Ok(())
    })();

    if let Err(error) = result {
        fail(format!(
            "failed to package '{}' into '{}': {error}",
            binary_path.display(),
            zip_path.display()
        ));
    }
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    ci_test();
}

fn ci_test() {
    for crate_name in WORKSPACE_CRATES {
        step(&format!("Test {crate_name}"));
        run_cargo(&["test", "-p", crate_name]);
    }
}

fn ci_build() {
    step("Build handler binaries");
    build_lambda_binaries(None, BuildProfile::Release, &LAMBDA_BINARIES);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Test => ci_test(),
                CiJob::Build => ci_build(),
                CiJob::All => {
                    ci_check();
                    ci_build();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::ServerlessPackage {
            target,
            profile,
            dist_dir,
            bins,
        } => {
            package_serverless_lambdas(&target, profile, &dist_dir, &bins);
        }
    }
}
