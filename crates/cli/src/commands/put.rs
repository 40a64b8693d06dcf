//! put command - Upload a local file

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use mt_core::RemotePath;
use serde::Serialize;

use super::{ConnectionArgs, expand_path, get_client, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Upload a local file
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Local file
    pub file: PathBuf,

    /// Destination object; a trailing `/` appends the file name
    pub path: String,

    /// Content type; guessed from the file extension by default
    #[arg(long)]
    pub content_type: Option<String>,

    /// Create missing parent directories first
    #[arg(short, long)]
    pub parents: bool,
}

#[derive(Debug, Serialize)]
struct PutOutput {
    path: String,
    size_bytes: usize,
    content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
}

/// Execute the put command
pub async fn execute(
    args: PutArgs,
    connection: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let data = match read_file(&args.file) {
        Ok(d) => d,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            return ExitCode::UsageError;
        }
    };

    let client = match get_client(connection, &formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let path = destination(&expand_path(&client, &args.path), &args.file);
    let content_type = args
        .content_type
        .clone()
        .unwrap_or_else(|| guess_content_type(&args.file));

    if args.parents {
        if let Some(parent) = RemotePath::parse(&path).parent() {
            if let Err(e) = client.create_with_ancestors(parent.to_string()).await {
                return report(&formatter, &format!("Failed to create {parent}"), &e);
            }
        }
    }

    let size = data.len();
    let response = match client.put_object(&path, data, Some(&content_type)).await {
        Ok(r) => r,
        Err(e) => return report(&formatter, &format!("Failed to upload {path}"), &e),
    };

    if formatter.is_json() {
        formatter.json(&PutOutput {
            path,
            size_bytes: size,
            content_type,
            request_id: response.request_id().map(str::to_string),
        });
    } else {
        let size_human = humansize::format_size(size, humansize::BINARY);
        formatter.success(&format!(
            "{} -> {path} ({})",
            args.file.display(),
            formatter.style_size(&size_human)
        ));
    }

    ExitCode::Success
}

fn read_file(file: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))
}

/// Append the local file name when the destination names a directory
fn destination(path: &str, file: &Path) -> String {
    match (path.ends_with('/'), file.file_name()) {
        (true, Some(name)) => format!("{path}{}", name.to_string_lossy()),
        _ => path.to_string(),
    }
}

fn guess_content_type(file: &Path) -> String {
    mime_guess::from_path(file)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination() {
        let file = Path::new("/tmp/report.csv");
        assert_eq!(destination("/acct/stor/in/", file), "/acct/stor/in/report.csv");
        assert_eq!(destination("/acct/stor/x.csv", file), "/acct/stor/x.csv");
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a.json")), "application/json");
        assert_eq!(guess_content_type(Path::new("a.txt")), "text/plain");
        assert_eq!(
            guess_content_type(Path::new("no-extension")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("in.txt");
        std::fs::write(&file, "hello").unwrap();
        assert_eq!(read_file(&file).unwrap(), b"hello");

        let err = read_file(&dir.path().join("nope")).unwrap_err();
        assert!(format!("{err:#}").contains("nope"));
    }
}
