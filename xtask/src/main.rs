//! Build automation tasks for the rust-kv-driver workspace.
//!
//! Run with `cargo xtask <command>`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use xshell::{Shell, cmd};

/// Library packages, leaf first.
const PACKAGES: &[&str] = &["mcbp-protocol", "kv-codec", "kv-driver-pool"];

/// Fuzz targets defined in `fuzz/Cargo.toml`.
const FUZZ_TARGETS: &[&str] = &["decode_frame", "parse_response"];

#[derive(Parser)]
#[command(name = "xtask", about = "Build automation for rust-kv-driver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all checks (format, lint, test)
    Ci,
    /// Run cargo fmt --check
    Fmt,
    /// Run clippy with all features
    Clippy,
    /// Run tests, for one package or the whole workspace
    Test {
        /// Package to test
        #[arg(short, long)]
        package: Option<String>,
    },
    /// Generate documentation
    Doc,
    /// Run the protocol benchmarks
    Bench,
    /// Run fuzz targets (requires cargo-fuzz and a nightly toolchain)
    Fuzz {
        /// Single target to run; all targets when omitted
        target: Option<String>,
        /// Seconds to spend on each target
        #[arg(long, default_value_t = 60)]
        seconds: u64,
    },
    /// Clean build artifacts
    Clean,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;

    let workspace_root = workspace_root()?;
    sh.change_dir(&workspace_root);

    match cli.command {
        Command::Ci => {
            println!("Running CI checks...");
            fmt(&sh)?;
            clippy(&sh)?;
            test(&sh, None)?;
            doc(&sh)?;
            println!("All CI checks passed!");
        }
        Command::Fmt => fmt(&sh)?,
        Command::Clippy => clippy(&sh)?,
        Command::Test { package } => test(&sh, package.as_deref())?,
        Command::Doc => doc(&sh)?,
        Command::Bench => bench(&sh)?,
        Command::Fuzz { target, seconds } => fuzz(&sh, target.as_deref(), seconds)?,
        Command::Clean => clean(&sh)?,
    }

    Ok(())
}

fn workspace_root() -> Result<PathBuf> {
    let output = std::process::Command::new("cargo")
        .args(["locate-project", "--workspace", "--message-format=plain"])
        .output()
        .context("failed to run cargo locate-project")?;

    let path = String::from_utf8(output.stdout)
        .context("invalid UTF-8 in cargo output")?
        .trim()
        .to_string();

    Ok(PathBuf::from(path)
        .parent()
        .context("failed to get workspace root")?
        .to_path_buf())
}

fn fmt(sh: &Shell) -> Result<()> {
    println!("Checking formatting...");
    cmd!(sh, "cargo fmt --all -- --check").run()?;
    Ok(())
}

fn clippy(sh: &Shell) -> Result<()> {
    println!("Running clippy...");
    cmd!(sh, "cargo clippy --workspace --all-features --all-targets -- -D warnings").run()?;
    Ok(())
}

fn test(sh: &Shell, package: Option<&str>) -> Result<()> {
    let packages = select(PACKAGES, package, "package")?;
    for package in packages {
        println!("Testing {package}...");
        cmd!(sh, "cargo test -p {package} --all-features").run()?;
    }
    Ok(())
}

fn doc(sh: &Shell) -> Result<()> {
    println!("Generating documentation...");
    cmd!(sh, "cargo doc --workspace --all-features --no-deps").run()?;
    Ok(())
}

fn bench(sh: &Shell) -> Result<()> {
    println!("Running benchmarks...");
    cmd!(sh, "cargo bench -p mcbp-protocol").run()?;
    Ok(())
}

fn fuzz(sh: &Shell, target: Option<&str>, seconds: u64) -> Result<()> {
    let targets = select(FUZZ_TARGETS, target, "fuzz target")?;

    let _dir = sh.push_dir("fuzz");
    let max_time = format!("-max_total_time={seconds}");
    for target in targets {
        println!("Fuzzing {target} for {seconds}s...");
        cmd!(sh, "cargo +nightly fuzz run {target} -- {max_time}").run()?;
    }
    Ok(())
}

/// Pick one known name, or all of them when none is given.
fn select<'a>(known: &[&'a str], wanted: Option<&str>, kind: &str) -> Result<Vec<&'a str>> {
    match wanted {
        Some(name) => known
            .iter()
            .find(|k| **k == name)
            .map(|k| vec![*k])
            .with_context(|| format!("unknown {kind}: {name} (expected one of {known:?})")),
        None => Ok(known.to_vec()),
    }
}

fn clean(sh: &Shell) -> Result<()> {
    println!("Cleaning build artifacts...");
    cmd!(sh, "cargo clean").run()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_all_when_unspecified() {
        assert_eq!(select(PACKAGES, None, "package").unwrap(), PACKAGES.to_vec());
    }

    #[test]
    fn test_select_one() {
        assert_eq!(
            select(FUZZ_TARGETS, Some("decode_frame"), "fuzz target").unwrap(),
            vec!["decode_frame"]
        );
    }

    #[test]
    fn test_select_unknown_is_error() {
        let err = select(PACKAGES, Some("kv-client"), "package").unwrap_err();
        assert!(err.to_string().contains("unknown package"));
    }
}
