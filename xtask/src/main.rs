use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_PACKAGE: &str = "stack_log_tags_lambda";
const LAMBDA_BIN: &str = "tag_stack_log_groups_lambda";
const CLI_BIN: &str = "tag_stack_log_groups";
const DIST_DIR: &str = "dist";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the stack log-group tagging workspace",
    long_about = "A unified CLI for running the tagger, CI checks and packaging\n\
                  the Lambda artifact."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tagging CLI, forwarding every argument after `--`
    Tag {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build and package the Lambda `bootstrap` zip
    LambdaPackage {
        /// Compilation target triple for the Lambda binary
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for the binary
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting and clippy
    Lint,
    /// Workspace tests
    Test,
    /// Lint + test
    Check,
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

fn package_lambda(target: &str, profile: BuildProfile) {
    if !target.ends_with("-linux-gnu") && !target.ends_with("-linux-musl") {
        fail(&format!("Lambda runs Linux binaries; `{target}` is not a Linux target"));
    }
    check_target_installed(target);

    step("Build lambda binary");
    let mut cargo_args = vec![
        "build",
        "-p",
        LAMBDA_PACKAGE,
        "--target",
        target,
        "--bin",
        LAMBDA_BIN,
    ];
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Package lambda zip artifact");
    let binary = Path::new("target")
        .join(target)
        .join(profile.dir_name())
        .join(LAMBDA_BIN);
    let zip_path = Path::new(DIST_DIR).join(format!("{LAMBDA_BIN}.zip"));
    if let Err(error) = write_bootstrap_zip(&binary, &zip_path) {
        fail(&format!("failed to package '{}': {error}", binary.display()));
    }

    eprintln!("\nPackaged artifact:\n- {}", zip_path.display());
}

fn fail(message: &str) -> ! {
    eprintln!("error: {message}");
    exit(1);
}

/// Skipped with a warning when rustup itself is unavailable.
fn check_target_installed(target: &str) {
    let installed = match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(output) if output.status.success() => output.stdout,
        Ok(_) | Err(_) => {
            eprintln!("warning: could not query rustup targets; building `{target}` anyway");
            return;
        }
    };

    if !String::from_utf8_lossy(&installed)
        .lines()
        .any(|line| line.trim() == target)
    {
        fail(&format!(
            "rust target `{target}` is missing; run `rustup target add {target}`"
        ));
    }
}

/// Lambda's custom runtime expects an executable named `bootstrap` at the zip root.
fn write_bootstrap_zip(binary: &Path, zip_path: &Path) -> std::io::Result<()> {
    let bytes = fs::read(binary)?;
    if let Some(parent) = zip_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut archive = ZipWriter::new(fs::File::create(zip_path)?);
    archive.start_file(
        "bootstrap",
        FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o755),
    )?;
    archive.write_all(&bytes)?;
    archive.finish()?;
    Ok(())
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_lint() {
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
}

fn ci_test() {
    step("Test stack_log_tags_core");
    run_cargo(&["test", "-p", "stack_log_tags_core"]);

    step("Test stack_log_tags_lambda");
    run_cargo(&["test", "-p", LAMBDA_PACKAGE]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Tag { args } => {
            let mut cargo_args = vec!["run", "-p", LAMBDA_PACKAGE, "--bin", CLI_BIN, "--"];
            cargo_args.extend(args.iter().map(String::as_str));
            run_cargo(&cargo_args);
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Lint => ci_lint(),
                CiJob::Test => ci_test(),
                CiJob::Check => {
                    ci_lint();
                    ci_test();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::LambdaPackage { target, profile } => {
            package_lambda(&target, profile);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn bootstrap_zip_holds_the_binary_at_the_root() {
        let dir = tempfile::tempdir().expect("temp dir");
        let binary = dir.path().join(LAMBDA_BIN);
        fs::write(&binary, b"\x7fELF-lambda").expect("write binary");
        let zip_path = dir.path().join("dist").join("lambda.zip");

        write_bootstrap_zip(&binary, &zip_path).expect("zip should be written");

        let mut archive =
            zip::ZipArchive::new(fs::File::open(&zip_path).expect("open zip")).expect("read zip");
        assert_eq!(archive.len(), 1);
        let mut entry = archive.by_name("bootstrap").expect("bootstrap entry");
        assert_eq!(entry.unix_mode().map(|mode| mode & 0o777), Some(0o755));
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).expect("read entry");
        assert_eq!(contents, b"\x7fELF-lambda");
    }

    #[test]
    fn missing_binary_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = write_bootstrap_zip(&dir.path().join("absent"), &dir.path().join("out.zip"));
        assert!(result.is_err());
    }
}
