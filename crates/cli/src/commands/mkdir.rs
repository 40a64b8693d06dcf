//! mkdir command - Create directories

use clap::Args;
use serde::Serialize;

use super::{ConnectionArgs, expand_path, get_client, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Create a directory
#[derive(Args, Debug)]
pub struct MkdirArgs {
    /// Directories to create
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Create missing parent directories as well
    #[arg(short, long)]
    pub parents: bool,
}

#[derive(Debug, Serialize)]
struct MkdirOutput {
    path: String,
    /// Directory PUTs issued, parents included
    requests: usize,
}

/// Execute the mkdir command
pub async fn execute(
    args: MkdirArgs,
    connection: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let client = match get_client(connection, &formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let mut created = Vec::with_capacity(args.paths.len());
    for raw in &args.paths {
        let path = expand_path(&client, raw);

        let requests = if args.parents {
            client.create_with_ancestors(&path).await.map(|r| r.steps())
        } else {
            client.put_directory(&path).await.map(|_| 1)
        };

        match requests {
            Ok(requests) => {
                formatter.success(&format!("Created {path}"));
                created.push(MkdirOutput { path, requests });
            }
            Err(e) => return report(&formatter, &format!("Failed to create {path}"), &e),
        }
    }

    if formatter.is_json() {
        formatter.json(&created);
    }

    ExitCode::Success
}
