use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the device relay workspace",
    long_about = "A unified CLI for CI checks and local invocations of the\n\
                  state reporter and call dispatcher functions."
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
        #[arg(value_enum, default_value_t = CiJob::All)]
        job: CiJob,
    },
    /// Run the state reporter once outside Lambda
    InvokeReporter {
        /// JSON event; defaults to the built-in g88_pi sample
        #[arg(long, env = "RELAY_EVENT")]
        event: Option<String>,
    },
    /// Place one call through the call dispatcher outside Lambda
    InvokeCall {
        /// Destination phone number
        #[arg(long)]
        phone: String,
        /// Message to be spoken
        #[arg(long)]
        message: String,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting and clippy
    Lint,
    /// Tests for both crates
    Test,
    /// Run lint + test
    All,
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    match Command::new("cargo").args(args).status() {
        Ok(status) => status,
        Err(error) => {
            eprintln!("failed to execute cargo: {error}");
            exit(1);
        }
    }
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

/// Arguments for `cargo run` of one of the Lambda binaries, which run a
/// single local invocation when `AWS_LAMBDA_FUNCTION_NAME` is unset.
fn local_invocation_args<'a>(bin: &'a str, event: Option<&'a str>) -> Vec<&'a str> {
    let mut args = vec!["run", "-p", "device_relay_lambda", "--bin", bin];
    if let Some(event) = event {
        args.push("--");
        args.push(event);
    }
    args
}

fn call_event(phone: &str, message: &str) -> String {
    serde_json::json!({ "phone": phone, "message": message }).to_string()
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
    step("Test device_relay_core");
    run_cargo(&["test", "-p", "device_relay_core"]);

    step("Test device_relay_lambda");
    run_cargo(&["test", "-p", "device_relay_lambda"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { job } => match job {
            CiJob::Lint => ci_lint(),
            CiJob::Test => ci_test(),
            CiJob::All => {
                ci_lint();
                ci_test();
            }
        },
        Commands::InvokeReporter { event } => {
            step("Invoke state reporter locally");
            run_cargo(&local_invocation_args(
                "state_reporter_lambda",
                event.as_deref(),
            ));
        }
        Commands::InvokeCall { phone, message } => {
            step("Invoke call dispatcher locally");
            let event = call_event(&phone, &message);
            run_cargo(&local_invocation_args(
                "call_dispatcher_lambda",
                Some(event.as_str()),
            ));
        }
    }
}
