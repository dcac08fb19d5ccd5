mod cmd_doctor;
mod cmd_gate;
mod cmd_hook;
mod cmd_serve;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "skald", version, about = "Session transcript relay for coding agents")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Hook entrypoint (called by the host tool, reads stdin JSON)
    Hook,
    /// Run the ingestion endpoint
    Serve {
        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port
        #[arg(long, default_value_t = 8787)]
        port: u16,
    },
    /// Opt the current project in to transcript uploads
    Enable,
    /// Opt the current project out of transcript uploads
    Disable,
    /// Check hook and server configuration
    Doctor,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Hook => cmd_hook::execute(),
        Command::Serve { bind, port } => cmd_serve::execute(&bind, port),
        Command::Enable => cmd_gate::enable(),
        Command::Disable => cmd_gate::disable(),
        Command::Doctor => cmd_doctor::execute(),
    }
}
