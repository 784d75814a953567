//! IWFM CLI - match observation wells to model layers and score simulated heads.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "iwfm-cli",
    version,
    about = "IWFM groundwater well calibration toolkit"
)]
struct Cli {
    /// Increase logging verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: iwfm_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    iwfm_cmd::run(cli.command)
}
