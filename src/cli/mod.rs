pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::client::Client;

#[derive(Parser)]
#[command(name = "orgkeep")]
#[command(about = "OrgKeep CLI - Command-line client for the OrgKeep API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, env = "ORGKEEP_HOST", default_value = "http://127.0.0.1:3000", help = "Server base URL")]
    pub host: String,

    #[arg(long, global = true, env = "ORGKEEP_ID", default_value = "", help = "Caller user id")]
    pub id: String,

    #[arg(long, global = true, env = "ORGKEEP_API_SECRET", default_value = "", hide_env_values = true, help = "Caller api secret")]
    pub secret: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Check the server is up")]
    Ok,

    #[command(about = "Obtain a bearer token")]
    Token,

    #[command(about = "Show caller identity and privilege level")]
    Whoami,

    #[command(about = "Show server uptime")]
    Status,

    #[command(about = "Org management")]
    Org {
        #[command(subcommand)]
        cmd: commands::org::OrgCommands,
    },

    #[command(about = "User management")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(name = "self", about = "Update your own account")]
    SelfService {
        #[command(subcommand)]
        cmd: commands::user::SelfCommands,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let client = Client::new(cli.host, cli.id, cli.secret);

    match cli.command {
        Commands::Ok => commands::session::ok(&client, output_format).await,
        Commands::Token => commands::session::token(&client, output_format).await,
        Commands::Whoami => commands::session::whoami(&client, output_format).await,
        Commands::Status => commands::session::status(&client, output_format).await,
        Commands::Org { cmd } => commands::org::handle(cmd, &client, output_format).await,
        Commands::User { cmd } => commands::user::handle(cmd, &client, output_format).await,
        Commands::SelfService { cmd } => {
            commands::user::handle_self(cmd, &client, output_format).await
        }
    }
}
