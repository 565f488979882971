use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "kairos-cli", version, about = "Kairos calendar CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calendar conversions
    Cal {
        #[command(subcommand)]
        action: commands::cal::CalAction,
    },
    /// Group management
    Group {
        #[command(subcommand)]
        action: commands::group::GroupAction,
    },
    /// Event management
    Event {
        #[command(subcommand)]
        action: commands::event::EventAction,
    },
    /// Occurrence queries over a group
    Occur(commands::occur::OccurArgs),
    /// ICS export
    Export(commands::export::ExportArgs),
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

fn main() {
    // The handle must stay alive for the duration of the process.
    let _logger = flexi_logger::Logger::try_with_env_or_str("warn")
        .and_then(|logger| logger.start())
        .map_err(|e| eprintln!("warning: logger init failed: {e}"))
        .ok();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Cal { action } => commands::cal::run(action),
        Commands::Group { action } => commands::group::run(action),
        Commands::Event { action } => commands::event::run(action),
        Commands::Occur(args) => commands::occur::run(args),
        Commands::Export(args) => commands::export::run(args),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "kairos-cli",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
