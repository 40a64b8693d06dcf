//! rm command - Remove objects and directories

use std::time::Duration;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use super::{ConnectionArgs, expand_path, get_client, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Remove an object or directory
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Paths to remove
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Remove directories and everything below them
    #[arg(short, long)]
    pub recursive: bool,

    /// Succeed when a path does not exist
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    path: String,
    /// Entries deleted, the path itself included
    deleted: usize,
}

/// Execute the rm command
pub async fn execute(
    args: RmArgs,
    connection: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let client = match get_client(connection, &formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let mut removed = Vec::with_capacity(args.paths.len());
    for raw in &args.paths {
        let path = expand_path(&client, raw);

        let spinner = (args.recursive && formatter.show_progress()).then(|| spinner(&path));
        let result = client.delete_recursive(&path, args.recursive).await;
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        match result {
            Ok(result) => {
                let deleted = result.steps();
                formatter.success(&format!("Removed {path} ({deleted} entries)"));
                removed.push(RmOutput { path, deleted });
            }
            Err(e) if args.force && e.is_not_found() => {
                tracing::debug!(path = %path, "Nothing to remove");
            }
            Err(e) => return report(&formatter, &format!("Failed to remove {path}"), &e),
        }
    }

    if formatter.is_json() {
        formatter.json(&removed);
    }

    ExitCode::Success
}

fn spinner(path: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let template = "{spinner:.green} {msg} [{elapsed}]";
    if let Ok(style) = ProgressStyle::default_spinner().template(template) {
        pb.set_style(style);
    }
    pb.set_message(format!("Removing {path}"));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
