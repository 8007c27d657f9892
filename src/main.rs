use bulk_renamer::cli::{Cli, run_cli};
use bulk_renamer::output::OutputFormatter;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "bulk_renamer=debug"
    } else {
        "bulk_renamer=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run_cli(cli) {
        OutputFormatter::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
