use serde_json::json;

use crate::cli::utils::{output_record, output_success};
use crate::cli::OutputFormat;
use crate::client::Client;

pub async fn ok(client: &Client, output_format: OutputFormat) -> anyhow::Result<()> {
    client.ok().await?;
    output_success(output_format, "Server is up", None)
}

pub async fn token(client: &Client, output_format: OutputFormat) -> anyhow::Result<()> {
    let token = client.request_token().await?;
    match output_format {
        OutputFormat::Json => output_success(
            output_format,
            "Token issued",
            Some(json!({ "bearer": token.bearer, "expires": token.expires })),
        ),
        OutputFormat::Text => {
            println!("{}", token.bearer);
            Ok(())
        }
    }
}

pub async fn whoami(client: &Client, output_format: OutputFormat) -> anyhow::Result<()> {
    let me = client.whoami().await?;
    output_record(
        output_format,
        &json!({ "user": me.user, "org": me.org, "privilege": me.privilege, "expires": me.expires }),
    )
}

pub async fn status(client: &Client, output_format: OutputFormat) -> anyhow::Result<()> {
    let status = client.status().await?;
    output_record(
        output_format,
        &json!({ "started": status.started, "uptime_secs": status.uptime_secs }),
    )
}
