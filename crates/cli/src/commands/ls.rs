//! ls command - List a directory
//!
//! Pages through the whole listing; `--pattern` filters entry names.

use clap::Args;
use jiff::Timestamp;
use mt_core::DirEntry;
use serde::Serialize;

use super::{ConnectionArgs, expand_path, get_client, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// List directory contents
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Directory to list (`~~` expands to the account root)
    #[arg(default_value = "~~/stor")]
    pub path: String,

    /// Long format with type, size and modification time
    #[arg(short, long)]
    pub long: bool,

    /// Only list names matching a glob pattern
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// List directories only
    #[arg(short, long)]
    pub dirs_only: bool,
}

#[derive(Debug, Serialize)]
struct LsOutput {
    path: String,
    entries: Vec<DirEntry>,
    dirs: usize,
    objects: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_size_bytes: Option<u64>,
}

/// Execute the ls command
pub async fn execute(
    args: LsArgs,
    connection: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let pattern = match args.pattern.as_deref().map(glob::Pattern::new).transpose() {
        Ok(p) => p,
        Err(e) => {
            formatter.error(&format!("Invalid pattern: {e}"));
            return ExitCode::UsageError;
        }
    };

    let client = match get_client(connection, &formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let path = expand_path(&client, &args.path);
    let entries = match client.list_directory(&path).await {
        Ok(e) => e,
        Err(e) => return report(&formatter, &format!("Failed to list {path}"), &e),
    };

    let entries = filter_entries(entries, pattern.as_ref(), args.dirs_only);
    let output = summarize(path, entries);

    if formatter.is_json() {
        formatter.json(&output);
        return ExitCode::Success;
    }

    if args.long {
        print_long(&formatter, &output.entries);
    } else {
        for entry in &output.entries {
            formatter.println(&display_name(&formatter, entry));
        }
    }

    ExitCode::Success
}

fn filter_entries(
    entries: Vec<DirEntry>,
    pattern: Option<&glob::Pattern>,
    dirs_only: bool,
) -> Vec<DirEntry> {
    entries
        .into_iter()
        .filter(|e| !dirs_only || e.is_dir())
        .filter(|e| pattern.is_none_or(|p| p.matches(&e.name)))
        .collect()
}

fn summarize(path: String, entries: Vec<DirEntry>) -> LsOutput {
    let dirs = entries.iter().filter(|e| e.is_dir()).count();
    let sizes: Vec<u64> = entries.iter().filter_map(|e| e.size).collect();
    LsOutput {
        path,
        dirs,
        objects: entries.len() - dirs,
        total_size_bytes: (!sizes.is_empty()).then(|| sizes.iter().sum()),
        entries,
    }
}

fn display_name(formatter: &Formatter, entry: &DirEntry) -> String {
    if entry.is_dir() {
        formatter.style_dir(&format!("{}/", entry.name))
    } else {
        formatter.style_file(&entry.name)
    }
}

fn format_mtime(mtime: Option<Timestamp>) -> String {
    mtime
        .map(|t| t.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn print_long(formatter: &Formatter, entries: &[DirEntry]) {
    let mut table = formatter.table();
    for entry in entries {
        let kind = if entry.is_dir() { "d" } else { "-" };
        let size = entry
            .size
            .map(|s| humansize::format_size(s, humansize::BINARY))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            kind.to_string(),
            formatter.style_size(&size),
            formatter.style_date(&format_mtime(entry.mtime)),
            display_name(formatter, entry),
        ]);
    }
    formatter.print_table(&table);
}
