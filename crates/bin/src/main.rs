mod cli;
mod commands;
mod output;
mod session;
mod store;
mod templates;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The chat client owns the terminal, so it only logs warnings.
    let default_directive = match cli.command {
        Some(Commands::Chat(_)) | Some(Commands::List(_)) => "intentions=warn",
        _ => "intentions=info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_directive.parse()?))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Serve(args)) => commands::serve::run(&args).await,
        Some(Commands::Health(args)) => commands::health::run(&args).await,
        Some(Commands::Chat(args)) => commands::chat::run(&args).await,
        Some(Commands::List(args)) => commands::list::run(&args).await,
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}
