use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_record, output_success, parse_status};
use crate::cli::OutputFormat;
use crate::client::Client;
use crate::database::Status;

#[derive(Subcommand)]
pub enum OrgCommands {
    #[command(about = "Create an org (root only)")]
    Create {
        #[arg(help = "Org name")]
        name: String,
    },

    #[command(about = "Show an org")]
    Read {
        #[arg(help = "Org id")]
        id: String,
    },

    #[command(about = "Change an org's owner (root only)")]
    Owner {
        #[arg(help = "Org id")]
        id: String,
        #[arg(help = "New owner user id")]
        owner: String,
    },

    #[command(about = "Change an org's status (root only)")]
    Status {
        #[arg(help = "Org id")]
        id: String,
        #[arg(value_parser = parse_status, help = "unconfirmed, active or inactive")]
        status: Status,
    },
}

pub async fn handle(cmd: OrgCommands, client: &Client, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        OrgCommands::Create { name } => {
            let id = client.org_create(&name).await?;
            output_success(output_format, &format!("Created org {id}"), Some(json!({ "id": id })))
        }
        OrgCommands::Read { id } => {
            let org = client.org_read(&id).await?;
            output_record(output_format, &org)
        }
        OrgCommands::Owner { id, owner } => {
            client.org_update_owner(&id, &owner).await?;
            output_success(output_format, &format!("Org {id} now owned by {owner}"), None)
        }
        OrgCommands::Status { id, status } => {
            client.org_update_status(&id, status).await?;
            output_success(output_format, &format!("Org {id} status set to {}", status.as_i64()), None)
        }
    }
}
