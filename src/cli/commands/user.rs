use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_record, output_success, parse_status};
use crate::cli::OutputFormat;
use crate::client::Client;
use crate::database::Status;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user in an org")]
    Create {
        #[arg(help = "Display name")]
        display_name: String,
        #[arg(help = "Email")]
        email: String,
        #[arg(help = "Org id")]
        org: String,
        #[arg(long, env = "ORGKEEP_NEW_PASSWORD", hide_env_values = true, help = "Initial password")]
        password: String,
    },

    #[command(about = "Show a user")]
    Read {
        #[arg(help = "User id")]
        id: String,
    },

    #[command(name = "display-name", about = "Change a user's display name")]
    DisplayName {
        #[arg(help = "User id")]
        id: String,
        #[arg(help = "New display name")]
        display_name: String,
    },

    #[command(about = "Change a user's password")]
    Password {
        #[arg(help = "User id")]
        id: String,
        #[arg(long, env = "ORGKEEP_NEW_PASSWORD", hide_env_values = true, help = "New password")]
        password: String,
    },

    #[command(about = "Change a user's status")]
    Status {
        #[arg(help = "User id")]
        id: String,
        #[arg(value_parser = parse_status, help = "unconfirmed, active or inactive")]
        status: Status,
    },
}

#[derive(Subcommand)]
pub enum SelfCommands {
    #[command(name = "display-name", about = "Change your display name")]
    DisplayName {
        #[arg(help = "New display name")]
        display_name: String,
    },

    #[command(about = "Change your password")]
    Password {
        #[arg(long, env = "ORGKEEP_NEW_PASSWORD", hide_env_values = true, help = "New password")]
        password: String,
    },
}

pub async fn handle(cmd: UserCommands, client: &Client, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Create {
            display_name,
            email,
            org,
            password,
        } => {
            let id = client.user_create(&display_name, &email, &org, &password).await?;
            output_success(output_format, &format!("Created user {id}"), Some(json!({ "id": id })))
        }
        UserCommands::Read { id } => {
            let user = client.user_read(&id).await?;
            output_record(output_format, &user)
        }
        UserCommands::DisplayName { id, display_name } => {
            client.user_update_display_name(&id, &display_name).await?;
            output_success(output_format, &format!("Updated display name of {id}"), None)
        }
        UserCommands::Password { id, password } => {
            client.user_update_password(&id, &password).await?;
            output_success(output_format, &format!("Updated password of {id}"), None)
        }
        UserCommands::Status { id, status } => {
            client.user_update_status(&id, status).await?;
            output_success(output_format, &format!("User {id} status set to {}", status.as_i64()), None)
        }
    }
}

pub async fn handle_self(cmd: SelfCommands, client: &Client, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        SelfCommands::DisplayName { display_name } => {
            client.self_update_display_name(&display_name).await?;
            output_success(output_format, "Updated your display name", None)
        }
        SelfCommands::Password { password } => {
            client.self_update_password(&password).await?;
            output_success(output_format, "Updated your password", None)
        }
    }
}
