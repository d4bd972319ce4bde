use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cmdgraph::cli::{Cli, route};
use cmdgraph::config::{ConfigLoader, DefaultConfigLoader};
use cmdgraph::shell::Shell;
use cmdgraph::shell::repl::ReplOptions;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let mut loader = DefaultConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_explicit_path(path.clone());
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = match loader.load(&cwd) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("cmdgraph: config error: {e}");
            return ExitCode::from(2);
        }
    };

    let options = ReplOptions {
        prompt: config.prompt().to_string(),
        preview_timeout: config.preview_timeout(),
    };
    let shell = config
        .into_registry()
        .and_then(|registry| Shell::new(registry).map_err(Into::into));
    let mut shell = match shell {
        Ok(shell) => shell,
        Err(e) => {
            eprintln!("cmdgraph: config error: {e}");
            return ExitCode::from(2);
        }
    };

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    match route(&cli.command, &mut shell, &options, stdin.lock(), stdout.lock()) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("cmdgraph: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// `CMDGRAPH_LOG` takes precedence over `--log-level`. Logs go to stderr so
/// command output on stdout stays clean.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_env("CMDGRAPH_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
