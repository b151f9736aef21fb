//! CLI argument definitions for the Intentions binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use intentions::chat::ChatConfig;
use intentions::llm::{LlmConfig, ProviderKind};

/// Language model used first for chat replies
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Provider {
    /// Anthropic Claude (default)
    Claude,
    /// OpenAI chat completions
    Openai,
    /// Offline echo provider, for trying the UI without API keys
    Scripted,
}

impl From<Provider> for ProviderKind {
    fn from(provider: Provider) -> Self {
        match provider {
            Provider::Claude => ProviderKind::Claude,
            Provider::Openai => ProviderKind::OpenAi,
            Provider::Scripted => ProviderKind::Scripted,
        }
    }
}

/// Daily intentions tracker with an AI chat sidebar
#[derive(Parser, Debug)]
#[command(name = "intentions")]
#[command(about = "Intentions: daily intentions tracker with an AI chat sidebar")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the Intentions web server
    Serve(ServeArgs),
    /// Check health of a running Intentions server
    Health(HealthArgs),
    /// Chat with the assistant from the terminal
    Chat(ChatArgs),
    /// Show today's intentions from a running server
    List(ListArgs),
}

/// Arguments for the serve command
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000, env = "INTENTIONS_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "INTENTIONS_HOST")]
    pub host: String,

    /// Data directory; the database is stored as intentions.db inside it
    #[arg(short = 'D', long, env = "INTENTIONS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(flatten)]
    pub llm: LlmArgs,
}

/// Language model settings
#[derive(clap::Args, Debug)]
pub struct LlmArgs {
    /// Provider tried first
    #[arg(long, default_value = "claude", env = "LLM_PRIMARY_PROVIDER")]
    pub primary_provider: Provider,

    /// Fall back to the other configured provider when the primary fails
    #[arg(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        env = "LLM_FALLBACK_ENABLED"
    )]
    pub fallback_enabled: bool,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Maximum tokens per completion request
    #[arg(long, default_value_t = 1024, env = "LLM_MAX_TOKENS_PER_REQUEST")]
    pub max_tokens_per_request: u32,

    /// Maximum chat messages a user may send per UTC day
    #[arg(long, default_value_t = 50, env = "LLM_MAX_MESSAGES_PER_DAY")]
    pub max_messages_per_day: usize,
}

impl LlmArgs {
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            primary: self.primary_provider.into(),
            fallback_enabled: self.fallback_enabled,
            anthropic_api_key: self.anthropic_api_key.clone(),
            openai_api_key: self.openai_api_key.clone(),
            max_tokens: self.max_tokens_per_request,
            ..LlmConfig::default()
        }
    }

    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            max_messages_per_day: self.max_messages_per_day,
            ..ChatConfig::default()
        }
    }
}

/// Arguments for the health command
#[derive(clap::Args, Debug)]
pub struct HealthArgs {
    /// URL of the server to check
    #[arg(default_value = "http://127.0.0.1:3000")]
    pub url: String,

    /// Timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,
}

/// Connection settings shared by the client commands
#[derive(clap::Args, Debug)]
pub struct ClientArgs {
    /// URL of the server
    #[arg(long, default_value = "http://127.0.0.1:3000", env = "INTENTIONS_URL")]
    pub url: String,

    /// Username to log in as
    #[arg(short, long, env = "INTENTIONS_USER")]
    pub user: String,

    /// Password, omitted for passwordless accounts
    #[arg(long, env = "INTENTIONS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Arguments for the chat command
#[derive(clap::Args, Debug)]
pub struct ChatArgs {
    #[command(flatten)]
    pub client: ClientArgs,

    /// Directory for client state such as the sidebar flag
    #[arg(long, env = "INTENTIONS_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Do not send today's intentions to the assistant
    #[arg(long)]
    pub no_context: bool,
}

/// Arguments for the list command
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub client: ClientArgs,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
