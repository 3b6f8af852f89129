use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::demo::DemoApp;
use crate::dispatcher::IncomingRequest;
use crate::security::{Claims, SystemClock, TokenService};

/// Command-line interface for tollgate
///
/// Every command runs against the bundled demo application, configured from `--config`
/// and the `TOLLGATE_*` environment variables.
#[derive(Parser, Debug)]
#[command(name = "tollgate")]
#[command(about = "tollgate request-dispatch core CLI", long_about = None)]
pub struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true, env = "TOLLGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the route table
    Routes,
    /// Issue or verify tokens
    Token {
        #[command(subcommand)]
        action: TokenCommand,
    },
    /// Dispatch one request and print the response as JSON
    Dispatch {
        /// Request method (case-insensitive)
        method: String,

        /// Request URI, including any query string
        uri: String,

        /// Request header as `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// JSON request body
        #[arg(long)]
        body: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Issue a token for a user
    Issue {
        #[arg(long)]
        user_id: String,

        #[arg(long, default_value = "user")]
        role: String,

        /// Extra claim as `key=value` (repeatable; values are parsed as JSON when possible)
        #[arg(long = "claim")]
        claims: Vec<String>,
    },
    /// Verify a token and print its claims
    Verify {
        token: String,
    },
}

/// Parse a `Name: value` header argument.
pub fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("header must be 'Name: value', got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("header name is empty in '{raw}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_claim(raw: &str) -> Result<(String, serde_json::Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("claim must be 'key=value', got '{raw}'"))?;
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.trim().to_string(), value))
}

fn token_service(config: &AppConfig) -> Result<TokenService> {
    TokenService::new(config.token_config()?, Arc::new(SystemClock))
        .context("invalid token settings")
}

/// Execute a parsed command, returning what should be printed to stdout.
pub fn execute(cli: &Cli) -> Result<String> {
    let config = AppConfig::resolve(cli.config.as_deref())?;

    match &cli.command {
        Commands::Routes => Ok(DemoApp::route_listing(&config)?.join("\n")),
        Commands::Token { action } => match action {
            TokenCommand::Issue {
                user_id,
                role,
                claims,
            } => {
                let mut payload = Claims::for_user(user_id, role);
                for raw in claims {
                    let (key, value) = parse_claim(raw)?;
                    payload = payload.with(&key, value);
                }
                token_service(&config)?
                    .issue(payload)
                    .context("failed to issue token")
            }
            TokenCommand::Verify { token } => {
                let claims = token_service(&config)?
                    .verify(token.trim())
                    .context("token rejected")?;
                serde_json::to_string_pretty(&claims).context("failed to render claims")
            }
        },
        Commands::Dispatch {
            method,
            uri,
            headers,
            body,
        } => {
            let app = DemoApp::build(&config)?;
            let mut request = IncomingRequest::new(method.as_str(), uri.as_str());
            for raw in headers {
                let (name, value) = parse_header(raw)?;
                request = request.header(&name, value);
            }
            if let Some(body) = body {
                let json = serde_json::from_str(body).context("--body is not valid JSON")?;
                request = request.body(json);
            }
            let response = app.dispatcher.dispatch(request);
            let headers: serde_json::Map<String, serde_json::Value> = response
                .headers
                .iter()
                .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
                .collect();
            serde_json::to_string_pretty(&serde_json::json!({
                "status": response.status,
                "headers": headers,
                "body": response.body,
            }))
            .context("failed to render response")
        }
    }
}

/// Parse process arguments, run the command, print its output.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let output = execute(&cli)?;
    println!("{output}");
    Ok(())
}
