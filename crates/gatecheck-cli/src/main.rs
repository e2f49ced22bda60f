use clap::{Parser, Subcommand};

use gatecheck_cli::commands;

/// Gatecheck -- Pre-Signoff Design Bundle Audit Tool.
#[derive(Parser)]
#[command(name = "gatecheck", about = "Gatecheck -- Pre-Signoff Design Bundle Audit Tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit every bundle under the input root against the golden spec.
    Audit(commands::audit::AuditArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Audit(args) => commands::audit::execute(args),
    };

    match result {
        Ok(code) => gatecheck_cli::terminate(code),
        Err(err) => {
            eprintln!("gatecheck: error: {err:#}");
            gatecheck_cli::terminate(gatecheck_cli::ExitCode::EngineError)
        }
    }
}
