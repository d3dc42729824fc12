use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the serverless inventory workspace",
    long_about = "A unified CLI for packaging the Lambda functions and running\n\
                  CI checks in the serverless inventory workspace."
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
    /// Build the Lambda binaries and package them as provided.al2023 zips
    LambdaPackage {
        /// Compilation target triple for Lambda binaries
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for binaries
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Directory receiving the zip artifacts
        #[arg(long, default_value = DIST_DIR)]
        dist_dir: String,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Package the Lambda zips
    Package,
    /// Run check + package
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

const LAMBDA_PACKAGE: &str = "inventory_lambda";
const DIST_DIR: &str = "infra/dist";
const DEFAULT_TARGET: &str = "x86_64-unknown-linux-gnu";

/// Lambda binary name and the artifact `inventory deploy` expects for it.
const LAMBDA_ARTIFACTS: [(&str, &str); 3] = [
    ("load_inventory", "load_inventory.zip"),
    ("inventory_api", "get_inventory_api.zip"),
    ("notify_low_stock", "notify_low_stock.zip"),
];

const TESTED_PACKAGES: [&str; 3] = ["inventory_core", "inventory_lambda", "inventory_ops"];

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn package_lambdas(target: &str, profile: BuildProfile, dist_dir: &Path) {
    ensure_rust_target_installed(target);

    step("Build lambda binaries");

    let mut cargo_args = vec!["build", "-p", LAMBDA_PACKAGE, "--target", target];
    for (bin, _) in LAMBDA_ARTIFACTS {
        cargo_args.extend(["--bin", bin]);
    }
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Package lambda zip artifacts");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    fs::create_dir_all(dist_dir).expect("failed to create lambda dist directory");

    let mut packaged = Vec::new();
    for (bin, artifact) in LAMBDA_ARTIFACTS {
        let zip_path = dist_dir.join(artifact);
        package_lambda_zip(&target_dir.join(bin), &zip_path);
        packaged.push(zip_path);
    }

    eprintln!("\nPackaged artifacts:");
    for path in packaged {
        eprintln!("- {}", path.display());
    }
}

fn ensure_rust_target_installed(target: &str) {
    let output = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output();

    let output = match output {
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
        panic!(
            "failed to list installed rust targets; run `rustup target list --installed` manually. details: {}",
            stderr.trim()
        );
    }

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        panic!(
            "required rust target `{target}` is not installed. install it with `rustup target add {target}` and re-run `cargo run -p xtask -- lambda-package`"
        );
    }
}

/// Writes `binary_path` into `zip_path` as the executable `bootstrap` entry
/// the custom runtime looks for.
fn package_lambda_zip(binary_path: &Path, zip_path: &Path) {
    if !binary_path.exists() {
        panic!("expected lambda binary at '{}'", binary_path.display());
    }

    let binary = fs::read(binary_path).expect("failed to read lambda binary");
    let file = fs::File::create(zip_path).expect("failed to create lambda zip");
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)
        .expect("failed to start bootstrap entry in lambda zip");
    zip.write_all(&binary)
        .expect("failed to write bootstrap entry");
    zip.finish().expect("failed to finish lambda zip");
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

    for package in TESTED_PACKAGES {
        step(&format!("Test {package}"));
        run_cargo(&["test", "-p", package]);
    }
}

fn ci_package() {
    package_lambdas(DEFAULT_TARGET, BuildProfile::Release, Path::new(DIST_DIR));
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { job } => match job {
            CiJob::Check => ci_check(),
            CiJob::Package => ci_package(),
            CiJob::All => {
                ci_check();
                ci_package();
            }
        },
        Commands::LambdaPackage {
            target,
            profile,
            dist_dir,
        } => {
            package_lambdas(&target, profile, Path::new(&dist_dir));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn artifacts_match_deploy_expectations() {
        let artifacts: Vec<&str> = LAMBDA_ARTIFACTS.iter().map(|(_, zip)| *zip).collect();
        assert_eq!(
            artifacts,
            vec![
                "load_inventory.zip",
                "get_inventory_api.zip",
                "notify_low_stock.zip"
            ]
        );
    }

    #[test]
    fn zip_contains_executable_bootstrap() {
        let dir = tempfile::tempdir().expect("temp dir");
        let binary_path = dir.path().join("load_inventory");
        let zip_path = dir.path().join("load_inventory.zip");
        fs::write(&binary_path, b"\x7fELF fake binary").expect("write binary");

        package_lambda_zip(&binary_path, &zip_path);

        let file = fs::File::open(&zip_path).expect("open zip");
        let mut archive = zip::ZipArchive::new(file).expect("read zip");
        assert_eq!(archive.len(), 1);

        let mut entry = archive.by_name("bootstrap").expect("bootstrap entry");
        assert_eq!(entry.unix_mode().map(|mode| mode & 0o777), Some(0o755));

        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).expect("read bootstrap");
        assert_eq!(contents, b"\x7fELF fake binary");
    }

    #[test]
    #[should_panic(expected = "expected lambda binary")]
    fn missing_binary_panics() {
        let dir = tempfile::tempdir().expect("temp dir");
        package_lambda_zip(&dir.path().join("missing"), &dir.path().join("out.zip"));
    }
}
