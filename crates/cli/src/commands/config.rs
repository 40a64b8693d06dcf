//! config command - Inspect and edit the profile file
//!
//! The profile is the lowest configuration layer, below the environment
//! and command-line flags.

use clap::Subcommand;
use mt_core::{ConfigLayer, ConfigManager};
use serde::Serialize;

use super::ConnectionArgs;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Profile subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the stored profile
    Show,

    /// Store the connection flags given on this command line
    ///
    /// Fields not given keep their stored value.
    Set,
}

#[derive(Serialize)]
struct ConfigOutput {
    path: String,
    profile: ConfigLayer,
}

/// Execute a config subcommand
pub async fn execute(
    cmd: ConfigCommands,
    connection: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let manager = match ConfigManager::new() {
        Ok(m) => m,
        Err(e) => {
            formatter.error(&format!("Failed to locate profile: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    match cmd {
        ConfigCommands::Show => execute_show(&manager, &formatter),
        ConfigCommands::Set => execute_set(&manager, connection, &formatter),
    }
}

fn execute_show(manager: &ConfigManager, formatter: &Formatter) -> ExitCode {
    let profile = match manager.load() {
        Ok(p) => redacted(p),
        Err(e) => {
            formatter.error(&format!("Failed to load profile: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let output = ConfigOutput {
        path: manager.config_path().display().to_string(),
        profile,
    };

    if formatter.is_json() {
        formatter.json(&output);
        return ExitCode::Success;
    }

    formatter.println(&formatter.style_date(&output.path));
    let fields = match serde_json::to_value(&output.profile) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    if fields.is_empty() {
        formatter.println("No profile settings stored.");
        return ExitCode::Success;
    }

    let mut table = formatter.table();
    for (name, value) in &fields {
        let value = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        table.add_row(vec![formatter.style_key(name), value]);
    }
    formatter.print_table(&table);

    ExitCode::Success
}

fn execute_set(
    manager: &ConfigManager,
    connection: &ConnectionArgs,
    formatter: &Formatter,
) -> ExitCode {
    let update = connection.to_layer();
    if update == ConfigLayer::default() {
        formatter.error("Nothing to store; pass connection flags such as --url or --user");
        return ExitCode::UsageError;
    }

    match apply(manager, update) {
        Ok(profile) => {
            if formatter.is_json() {
                formatter.json(&ConfigOutput {
                    path: manager.config_path().display().to_string(),
                    profile: redacted(profile),
                });
            } else {
                formatter.success(&format!(
                    "Profile saved to {}",
                    manager.config_path().display()
                ));
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to save profile: {e}"));
            ExitCode::from_error(&e)
        }
    }
}

/// Merge `update` over the stored profile and write it back
fn apply(manager: &ConfigManager, update: ConfigLayer) -> mt_core::Result<ConfigLayer> {
    let profile = update.or(manager.load()?);
    manager.save(&profile)?;
    Ok(profile)
}

fn redacted(mut profile: ConfigLayer) -> ConfigLayer {
    if profile.key_content.is_some() {
        profile.key_content = Some("<redacted>".to_string());
    }
    profile
}
