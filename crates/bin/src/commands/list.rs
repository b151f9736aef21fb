//! List command - prints the working day's intentions from a running server.

use intentions::widget::HttpChatBackend;

use crate::cli::{ClientArgs, ListArgs};
use crate::output::{OutputFormat, print_intentions};

/// Connect and log in with the shared client arguments.
pub async fn connect(args: &ClientArgs) -> Result<HttpChatBackend, Box<dyn std::error::Error>> {
    let backend = HttpChatBackend::new(&args.url)?;
    backend.login(&args.user, args.password.as_deref()).await?;
    Ok(backend)
}

/// Run the list command
pub async fn run(args: &ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let backend = connect(&args.client).await?;
    let intentions = backend.intentions_today().await?;
    print_intentions(&intentions, OutputFormat::from_json_flag(args.json))
}
