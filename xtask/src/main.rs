//! Workspace maintenance and developer workflow commands (`cargo xtask`).
//!
//! Wraps the wasm target checks and the verification pipeline so the
//! repository exposes stable entrypoints regardless of local tooling.

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

const WEB_CRATE: &str = "lms_bridge_web";
const WASM_TARGET: &str = "wasm32-unknown-unknown";

fn main() -> ExitCode {
    let root = workspace_root();
    let mut args = env::args().skip(1);

    let Some(cmd) = args.next() else {
        print_usage();
        return ExitCode::from(2);
    };

    let result = match cmd.as_str() {
        "setup-web" => setup_web(&root),
        "check-web" => check_web(&root),
        "verify" => verify(&root),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => Err(format!("unknown xtask command: {other}")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("xtask lives under workspace root")
        .to_path_buf()
}

fn print_usage() {
    eprintln!(
        "Usage: cargo xtask <command>\n\
         \n\
         Commands:\n\
           setup-web    Install the wasm32 target (if missing)\n\
           check-web    Compile-check the browser crate natively and for wasm32\n\
           verify       Run fmt, clippy, and the native test suite\n"
    );
}

fn setup_web(root: &Path) -> Result<(), String> {
    run(root, "rustup", &["target", "add", WASM_TARGET])
}

fn check_web(root: &Path) -> Result<(), String> {
    run(root, "cargo", &["check", "-p", WEB_CRATE])?;
    run(
        root,
        "cargo",
        &["check", "-p", WEB_CRATE, "--target", WASM_TARGET],
    )
}

fn verify(root: &Path) -> Result<(), String> {
    run(root, "cargo", &["fmt", "--all", "--check"])?;
    run(
        root,
        "cargo",
        &["clippy", "--workspace", "--", "-D", "warnings"],
    )?;
    run(root, "cargo", &["test", "--workspace"])
}

fn run(root: &Path, program: &str, args: &[&str]) -> Result<(), String> {
    let status = Command::new(program)
        .args(args)
        .current_dir(root)
        .status()
        .map_err(|err| format!("spawning {program}: {err}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("{program} {} failed", args.join(" ")))
    }
}
