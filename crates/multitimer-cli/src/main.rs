use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "multitimer-cli", version, about = "Multitimer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer authoring and control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Category listing and bulk control
    Category {
        #[command(subcommand)]
        action: commands::category::CategoryAction,
    },
    /// Completion history
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Drive running timers in the foreground, printing events as JSON lines
    Run(commands::run::RunArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("MULTITIMER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Category { action } => commands::category::run(action),
        Commands::History { action } => commands::history::run(action),
        Commands::Run(args) => commands::run::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
