//! get command - Download an object

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::Serialize;

use super::{ConnectionArgs, expand_path, get_client, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Download an object
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Object to download
    pub path: String,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct GetOutput {
    path: String,
    file: String,
    size_bytes: usize,
    size_human: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
}

/// Execute the get command
pub async fn execute(
    args: GetArgs,
    connection: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let client = match get_client(connection, &formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let path = expand_path(&client, &args.path);
    let response = match client.get_object(&path).await {
        Ok(r) => r,
        Err(e) => return report(&formatter, &format!("Failed to download {path}"), &e),
    };
    let request_id = response.request_id().map(str::to_string);
    let data = response.into_payload();

    let Some(file) = args.output else {
        // Raw bytes go to stdout untouched, even in JSON mode
        if let Err(e) = std::io::stdout().lock().write_all(&data) {
            formatter.error(&format!("Failed to write to stdout: {e}"));
            return ExitCode::GeneralError;
        }
        return ExitCode::Success;
    };

    if let Err(e) = write_file(&file, &data) {
        formatter.error(&format!("{e:#}"));
        return ExitCode::GeneralError;
    }

    let size_human = humansize::format_size(data.len(), humansize::BINARY);
    if formatter.is_json() {
        formatter.json(&GetOutput {
            path,
            file: file.display().to_string(),
            size_bytes: data.len(),
            size_human,
            request_id,
        });
    } else {
        formatter.success(&format!(
            "{path} -> {} ({})",
            file.display(),
            formatter.style_size(&size_human)
        ));
    }

    ExitCode::Success
}

fn write_file(file: &Path, data: &[u8]) -> anyhow::Result<()> {
    std::fs::write(file, data).with_context(|| format!("Failed to write {}", file.display()))
}
