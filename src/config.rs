//! Startup configuration
//!
//! Every tunable is a command line flag backed by an environment variable.
//! [`AppConfig::from_args`] validates the raw arguments once at startup and the
//! resulting typed configuration is threaded into each client.

use crate::error::{Error, Result};
use clap::{Parser, ValueEnum};
use secrecy::SecretString;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TABLE_NAME: &str = "ResearchPapers";
pub const DEFAULT_COMPLETION_ENDPOINT: &str = "https://api.openai.com/v1/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-instruct";
pub const DEFAULT_MAX_TOKENS: u32 = 100;
pub const DEFAULT_PROMPT_PREFIX: &str = "Summarize the following text: ";
pub const DEFAULT_FIXED_ID: &str = "some-unique-id";

/// How the handler derives the key a document is stored under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum IdPolicy {
    /// SHA-256 of the uploaded bytes
    #[default]
    ContentHash,
    /// Platform request id, or a random UUID when the platform supplies none
    RequestId,
    /// A single configured key shared by every request
    Fixed,
}

/// Durable store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StoreBackend {
    #[default]
    Dynamodb,
    /// Process-local map, for local runs without AWS
    Memory,
}

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Args {
    /// Address the HTTP boundary listens on
    #[arg(long, env = "SUMMARIZER_LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: SocketAddr,

    /// Maximum accepted request body in bytes
    #[arg(long, env = "SUMMARIZER_MAX_BODY_BYTES", default_value_t = 100 * 1024 * 1024)]
    pub max_body_bytes: usize,

    /// Directory for scratch files (defaults to the OS temp dir)
    #[arg(long, env = "SUMMARIZER_SCRATCH_DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Directory containing the PDFium shared library
    #[arg(long, env = "PDFIUM_LIB_DIR")]
    pub pdfium_lib_dir: Option<PathBuf>,

    /// Durable store backend
    #[arg(long, env = "SUMMARIZER_STORE", value_enum, default_value_t = StoreBackend::default())]
    pub store: StoreBackend,

    /// Table extracted text is written to
    #[arg(long, env = "SUMMARIZER_TABLE_NAME", default_value = DEFAULT_TABLE_NAME)]
    pub table_name: String,

    /// AWS region of the table (defaults to the AWS provider chain)
    #[arg(long, env = "SUMMARIZER_STORE_REGION")]
    pub store_region: Option<String>,

    /// Override the DynamoDB endpoint, e.g. for DynamoDB Local
    #[arg(long, env = "SUMMARIZER_STORE_ENDPOINT_URL")]
    pub store_endpoint_url: Option<String>,

    /// Completion endpoint URL
    #[arg(long, env = "SUMMARIZER_COMPLETION_ENDPOINT", default_value = DEFAULT_COMPLETION_ENDPOINT)]
    pub completion_endpoint: String,

    /// Model identifier sent with each completion request
    #[arg(long, env = "SUMMARIZER_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Upper bound on generated summary tokens
    #[arg(long, env = "SUMMARIZER_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    /// Instruction prepended to the extracted text
    #[arg(long, env = "SUMMARIZER_PROMPT_PREFIX", default_value = DEFAULT_PROMPT_PREFIX)]
    pub prompt_prefix: String,

    /// Timeout for the completion request
    #[arg(long, env = "SUMMARIZER_REQUEST_TIMEOUT_SECS", default_value_t = 60)]
    pub request_timeout_secs: u64,

    /// Bearer token for the completion endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Identifier policy for stored documents
    #[arg(long, env = "SUMMARIZER_ID_POLICY", value_enum, default_value_t = IdPolicy::default())]
    pub id_policy: IdPolicy,

    /// Key used by `--id-policy fixed`
    #[arg(long, env = "SUMMARIZER_FIXED_ID", default_value = DEFAULT_FIXED_ID)]
    pub fixed_id: String,
}

/// Completion client configuration
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub endpoint: Url,
    pub api_key: SecretString,
    pub model: String,
    pub max_tokens: u32,
    pub prompt_prefix: String,
    pub timeout: Duration,
}

impl CompletionConfig {
    /// Configuration with the default model settings against `endpoint`
    pub fn new(endpoint: Url, api_key: SecretString) -> Self {
        Self {
            endpoint,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            prompt_prefix: DEFAULT_PROMPT_PREFIX.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Durable store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub table_name: String,
    pub region: Option<String>,
    pub endpoint_url: Option<Url>,
}

/// Identifier configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdConfig {
    pub policy: IdPolicy,
    pub fixed_id: String,
}

impl IdConfig {
    pub fn with_policy(mut self, policy: IdPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            policy: IdPolicy::default(),
            fixed_id: DEFAULT_FIXED_ID.to_string(),
        }
    }
}

/// Validated application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub max_body_bytes: usize,
    pub scratch_dir: PathBuf,
    pub pdfium_lib_dir: Option<PathBuf>,
    pub store: StoreConfig,
    pub completion: CompletionConfig,
    pub ids: IdConfig,
}

impl AppConfig {
    pub fn from_args(args: Args) -> Result<Self> {
        let api_key = args
            .openai_api_key
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from)
            .ok_or_else(|| config_error("OPENAI_API_KEY must be set"))?;

        let endpoint = parse_http_url(&args.completion_endpoint, "completion endpoint")?;

        let endpoint_url = args
            .store_endpoint_url
            .as_deref()
            .map(|url| parse_http_url(url, "store endpoint"))
            .transpose()?;

        if args.max_tokens == 0 {
            return Err(config_error("max_tokens must be greater than 0"));
        }
        if args.request_timeout_secs == 0 {
            return Err(config_error("request_timeout_secs must be greater than 0"));
        }
        if args.max_body_bytes == 0 {
            return Err(config_error("max_body_bytes must be greater than 0"));
        }
        if args.table_name.trim().is_empty() {
            return Err(config_error("table_name must not be empty"));
        }
        if args.id_policy == IdPolicy::Fixed && args.fixed_id.is_empty() {
            return Err(config_error("fixed_id must not be empty with --id-policy fixed"));
        }

        Ok(Self {
            listen_addr: args.listen_addr,
            max_body_bytes: args.max_body_bytes,
            scratch_dir: args.scratch_dir.unwrap_or_else(std::env::temp_dir),
            pdfium_lib_dir: args.pdfium_lib_dir,
            store: StoreConfig {
                backend: args.store,
                table_name: args.table_name,
                region: args.store_region,
                endpoint_url,
            },
            completion: CompletionConfig {
                endpoint,
                api_key,
                model: args.model,
                max_tokens: args.max_tokens,
                prompt_prefix: args.prompt_prefix,
                timeout: Duration::from_secs(args.request_timeout_secs),
            },
            ids: IdConfig {
                policy: args.id_policy,
                fixed_id: args.fixed_id,
            },
        })
    }
}

fn config_error(reason: &str) -> Error {
    Error::Config {
        reason: reason.to_string(),
    }
}

fn parse_http_url(raw: &str, what: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::Config {
        reason: format!("Invalid {} URL `{}`: {}", what, raw, e),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::Config {
            reason: format!("Unsupported {} URL scheme `{}`", what, scheme),
        }),
    }
}
