use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::database::Status;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let Some(data) = data {
                response["data"] = data;
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output a record as pretty JSON, or as `key: value` lines for text
pub fn output_record<T: Serialize>(output_format: OutputFormat, record: &T) -> anyhow::Result<()> {
    let value = serde_json::to_value(record)?;
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
        OutputFormat::Text => print_fields("", &value),
    }
    Ok(())
}

fn print_fields(prefix: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                print_fields(&name, v);
            }
        }
        Value::String(s) => println!("{prefix}: {s}"),
        other => println!("{prefix}: {other}"),
    }
}

/// Parse a status name or its numeric code
pub fn parse_status(s: &str) -> Result<Status, String> {
    match s.to_ascii_lowercase().as_str() {
        "unconfirmed" | "0" => Ok(Status::Unconfirmed),
        "active" | "1" => Ok(Status::Active),
        "inactive" | "2" => Ok(Status::Inactive),
        other => Err(format!("unknown status '{other}' (expected unconfirmed, active, inactive)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_names_and_codes() {
        assert_eq!(parse_status("Active").unwrap(), Status::Active);
        assert_eq!(parse_status("2").unwrap(), Status::Inactive);
        assert_eq!(parse_status("unconfirmed").unwrap(), Status::Unconfirmed);
        assert!(parse_status("-1").is_err());
        assert!(parse_status("none").is_err());
    }
}
