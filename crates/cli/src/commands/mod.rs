//! Subcommands
//!
//! Each command exposes `execute(args, ..) -> ExitCode` and reports errors
//! through the shared [`Formatter`].

pub mod completions;
pub mod config;
pub mod get;
pub mod info;
pub mod ls;
pub mod mkdir;
pub mod put;
pub mod rm;

use std::path::PathBuf;

use clap::Args;
use mt_client::MantaClient;
use mt_core::{ConfigLayer, Error, resolve};

use crate::Commands;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Connection overrides; anything left out falls back to `MANTA_*` and the profile file
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    /// Service endpoint
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Account login
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Sub-user login under the account
    #[arg(long, global = true)]
    pub subuser: Option<String>,

    /// Key fingerprint used in the signature keyId
    #[arg(long, global = true)]
    pub key_id: Option<String>,

    /// Private key file (PEM)
    #[arg(long, global = true)]
    pub key_path: Option<PathBuf>,

    /// Signature algorithm (RSA-SHA256 or RSA-SHA512)
    #[arg(long, global = true)]
    pub algorithm: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Retries after connection failures and 5xx responses
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,
}

impl ConnectionArgs {
    /// Explicit layer for the config resolver
    pub fn to_layer(&self) -> ConfigLayer {
        ConfigLayer {
            url: self.url.clone(),
            user: self.user.clone(),
            subuser: self.subuser.clone(),
            key_id: self.key_id.clone(),
            key_path: self.key_path.clone(),
            signature_algorithm: self.algorithm.clone(),
            timeout_ms: self.timeout,
            retries: self.retries,
            tls_insecure: self.insecure.then_some(true),
            ..Default::default()
        }
    }
}

/// Dispatch a parsed subcommand
pub async fn execute(
    command: Commands,
    connection: ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    match command {
        Commands::Ls(args) => ls::execute(args, &connection, output_config).await,
        Commands::Mkdir(args) => mkdir::execute(args, &connection, output_config).await,
        Commands::Rm(args) => rm::execute(args, &connection, output_config).await,
        Commands::Get(args) => get::execute(args, &connection, output_config).await,
        Commands::Put(args) => put::execute(args, &connection, output_config).await,
        Commands::Info(args) => info::execute(args, &connection, output_config).await,
        Commands::Config(cmd) => config::execute(cmd, &connection, output_config).await,
        Commands::Completions(args) => completions::execute(args),
    }
}

/// Resolve configuration and build a client
pub fn get_client(
    connection: &ConnectionArgs,
    formatter: &Formatter,
) -> Result<MantaClient, ExitCode> {
    let config = match resolve(connection.to_layer()) {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return Err(ExitCode::from_error(&e));
        }
    };

    match MantaClient::new(config) {
        Ok(client) => Ok(client),
        Err(e) => {
            formatter.error(&format!("Failed to create client: {e}"));
            Err(ExitCode::from_error(&e))
        }
    }
}

/// Expand a leading `~~` to `/<account>`
///
/// Relative paths are taken under the account's `stor` directory.
pub fn expand_path(client: &MantaClient, path: &str) -> String {
    let account = client
        .home()
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default();

    if let Some(rest) = path.strip_prefix("~~") {
        format!("/{account}{rest}")
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{}/{path}", client.home())
    }
}

/// Report a library error and pick the exit code
pub fn report(formatter: &Formatter, context: &str, error: &Error) -> ExitCode {
    formatter.error(&format!("{context}: {error}"));
    ExitCode::from_error(error)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use super::ConnectionArgs;

    /// Connection args with inline fixture credentials
    pub fn connection(key_path: PathBuf) -> ConnectionArgs {
        ConnectionArgs {
            url: Some("https://manta.test".to_string()),
            user: Some("acct".to_string()),
            key_id: Some("0a:e2:99:db:00:25:3d:37:ce:78:3c:2e:a3:56:6f:04".to_string()),
            key_path: Some(key_path),
            ..Default::default()
        }
    }

    pub fn fixture_key() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../client/tests/fixtures/id_rsa.pem")
    }
}
