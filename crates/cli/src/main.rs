// guidesync - mirror a local HTML corpus into external content records

mod commands;
mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use guidesync_client::ClientError;
use guidesync_content::ContentError;
use guidesync_recon::{ConfigError, ConfigInputs, FailurePolicy, ReconError};
use tracing_subscriber::EnvFilter;

use exit_codes::{
    client_exit_code, config_exit_code, content_exit_code, recon_exit_code, EXIT_ERROR,
    EXIT_SUCCESS,
};

#[derive(Parser)]
#[command(name = "guidesync")]
#[command(about = "Mirror a directory of HTML documents into external content records")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug logging (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, update and delete remote records until they match the content directory
    #[command(after_help = "\
Examples:
  guidesync sync --config guidesync.toml
  guidesync sync --dry-run --json
  ON_ERROR=continue guidesync sync")]
    Sync {
        #[command(flatten)]
        config: ConfigArgs,

        /// Validate and print the plan without changing anything
        #[arg(long)]
        dry_run: bool,

        /// Print the report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Load the content directory and print each document's identity (no network)
    Scan {
        #[command(flatten)]
        config: ConfigArgs,

        #[arg(long)]
        json: bool,
    },

    /// List remote records of the managed type
    List {
        #[command(flatten)]
        config: ConfigArgs,

        #[arg(long)]
        json: bool,
    },
}

/// Configuration flags. Each one can also come from its environment variable
/// or from the `--config` file; flags win over env, env wins over the file.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// TOML config file
    #[arg(long, short = 'c', env = "GUIDESYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// API host, e.g. https://example.zendesk.com
    #[arg(long, env = "ZENDESK_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Basic credential, already base64-encoded
    #[arg(long, env = "ZENDESK_AUTH", hide_env_values = true)]
    pub credential: Option<String>,

    /// Record type every managed record belongs to
    #[arg(long, env = "EXTERNAL_CONTENT_TYPE_ID")]
    pub type_id: Option<String>,

    /// Content source; also namespaces identity keys
    #[arg(long, env = "EXTERNAL_CONTENT_SOURCE_ID")]
    pub source_id: Option<String>,

    /// Root of the HTML corpus
    #[arg(long, env = "CONTENT_DIR")]
    pub content_dir: Option<PathBuf>,

    /// Public URL the corpus is served under
    #[arg(long, env = "TARGET_BASE_URL")]
    pub target_base_url: Option<String>,

    /// Base for a relative --content-dir
    #[arg(long, env = "WORKING_DIR")]
    pub working_dir: Option<PathBuf>,

    /// Element whose text becomes the record body (tag, #id, .class) [default: body]
    #[arg(long, env = "CONTENT_ELEMENT")]
    pub content_element: Option<String>,

    /// [default: en-us]
    #[arg(long, env = "CONTENT_LOCALE")]
    pub locale: Option<String>,

    /// Bodies are cut to this many characters [default: 9000]
    #[arg(long, env = "MAX_BODY_LENGTH")]
    pub max_body_len: Option<usize>,

    /// abort or continue after a failed create/update/delete [default: abort]
    #[arg(long, env = "ON_ERROR")]
    pub on_error: Option<FailurePolicy>,

    /// Records per list page
    #[arg(long, env = "PAGE_SIZE")]
    pub page_size: Option<u32>,

    /// HTTP timeout in seconds [default: 60]
    #[arg(long, env = "HTTP_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

impl ConfigArgs {
    /// File layer, then env and flags on top.
    pub fn inputs(&self) -> Result<ConfigInputs, CliError> {
        let file = match &self.config {
            Some(path) => ConfigInputs::from_file(path).map_err(CliError::config)?,
            None => ConfigInputs::default(),
        };

        let flags = ConfigInputs {
            api_base_url: self.api_base_url.clone(),
            credential: self.credential.clone(),
            type_id: self.type_id.clone(),
            source_id: self.source_id.clone(),
            content_dir: self.content_dir.clone(),
            target_base_url: self.target_base_url.clone(),
            working_dir: self.working_dir.clone(),
            content_element: self.content_element.clone(),
            locale: self.locale.clone(),
            max_body_len: self.max_body_len,
            on_error: self.on_error,
            page_size: self.page_size,
            timeout_secs: self.timeout_secs,
        };

        Ok(file.merge(flags))
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Sync { config, dry_run, json } => commands::cmd_sync(&config, dry_run, json),
        Commands::Scan { config, json } => commands::cmd_scan(&config, json),
        Commands::List { config, json } => commands::cmd_list(&config, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    pub fn config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::Missing { .. } => Some("see `guidesync sync --help` for every option and its variable".to_string()),
            _ => None,
        };
        Self { code: config_exit_code(&err), message: err.to_string(), hint }
    }

    pub fn content(err: ContentError) -> Self {
        let hint = match &err {
            ContentError::Parse { .. } => {
                Some("every document needs a non-empty <title> and the content element".to_string())
            }
            _ => None,
        };
        Self { code: content_exit_code(&err), message: err.to_string(), hint }
    }

    pub fn client(err: ClientError) -> Self {
        Self::new(client_exit_code(&err), err.to_string())
    }

    pub fn recon(err: ReconError) -> Self {
        let code = recon_exit_code(&err);
        match err {
            ReconError::Content(e) => Self::content(e),
            ReconError::Config(e) => Self::config(e),
            ReconError::DuplicateIdentity { .. } => Self {
                code,
                message: err.to_string(),
                hint: Some("no remote call was made; rename or remove the colliding files".to_string()),
            },
            other => Self::new(code, other.to_string()),
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
