//! info command - Show response headers of a HEAD request

use std::collections::BTreeMap;

use clap::Args;
use mt_core::types::is_directory;
use serde::Serialize;

use super::{ConnectionArgs, expand_path, get_client, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Show object or directory metadata
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to inspect
    pub path: String,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    #[serde(rename = "type")]
    entry_type: &'static str,
    headers: BTreeMap<String, String>,
}

/// Execute the info command
pub async fn execute(
    args: InfoArgs,
    connection: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let client = match get_client(connection, &formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let path = expand_path(&client, &args.path);
    let response = match client.head(&path).await {
        Ok(r) => r,
        Err(e) => return report(&formatter, &format!("Failed to inspect {path}"), &e),
    };

    let output = InfoOutput {
        path,
        entry_type: if is_directory(response.headers()) {
            "directory"
        } else {
            "object"
        },
        headers: header_map(response.headers()),
    };

    if formatter.is_json() {
        formatter.json(&output);
        return ExitCode::Success;
    }

    let mut table = formatter.table();
    table.add_row(vec![formatter.style_key("path"), output.path.clone()]);
    table.add_row(vec![formatter.style_key("type"), output.entry_type.to_string()]);
    for (name, value) in &output.headers {
        table.add_row(vec![formatter.style_key(name), value.clone()]);
    }
    formatter.print_table(&table);

    ExitCode::Success
}

/// Printable headers, sorted by name
fn header_map(headers: &http::HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}
