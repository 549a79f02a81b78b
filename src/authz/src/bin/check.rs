//! # Token Permission Checker
//!
//! Verifies an access token with an ES256 or Ed25519 public key and decides one query.
//!
//! ```text
//! iam-authz-check --token @token.txt --public-key @issuer.pem \
//!     --resource hrn:acme::invoice/42 --action 'hrn:acme::invoice$read'
//! ```
//!
//! Prints `ALLOW` or `DENY` (the JSON decision with `--explain`).
//! Exit status: 0 allow, 1 deny, 2 error.
//!
//! Environment variables:
//! - `IAM_AUTHZ_TOKEN`, `IAM_AUTHZ_PUBLIC_KEY`, `IAM_AUTHZ_LEEWAY_SECS`, ...
//! - `RUST_LOG` - Log level (default: warn), written to stderr

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use clap::Parser;
use iam_authz::{
    Decision, Ed25519Verifier, EngineConfig, EnforcementQuery, Es256Verifier, SignatureVerifier,
    TokenAuthorizer, TokenVerifier, VerifierConfig,
};
use std::process::ExitCode;
use tracing::info;

/// Check a permission against a signed access token
#[derive(Parser, Debug)]
#[command(name = "iam-authz-check")]
#[command(about = "Decide a permission from a signed access token")]
#[command(version)]
struct Cli {
    /// Token, or @path to read it from a file
    #[arg(long, env = "IAM_AUTHZ_TOKEN")]
    token: String,

    /// Public key, or @path to read it from a file: a PEM EC (P-256) key, a base64
    /// uncompressed P-256 point, or a base64 32-byte Ed25519 key
    #[arg(long, env = "IAM_AUTHZ_PUBLIC_KEY")]
    public_key: String,

    /// Resource HRN to check
    #[arg(long, env = "IAM_AUTHZ_RESOURCE")]
    resource: String,

    /// Action HRN to check
    #[arg(long, env = "IAM_AUTHZ_ACTION")]
    action: String,

    /// Subject to check instead of the token principal
    #[arg(long, env = "IAM_AUTHZ_SUBJECT")]
    subject: Option<String>,

    /// Clock-skew tolerance in seconds
    #[arg(long, default_value_t = 0, env = "IAM_AUTHZ_LEEWAY_SECS")]
    leeway_secs: u64,

    /// Reject tokens issued in the future
    #[arg(long, env = "IAM_AUTHZ_VALIDATE_ISSUED_AT")]
    validate_issued_at: bool,

    /// Required token issuer
    #[arg(long, env = "IAM_AUTHZ_ISSUER")]
    issuer: Option<String>,

    /// Print the full decision as JSON
    #[arg(long)]
    explain: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    match run(&cli) {
        Ok(decision) if decision.allowed => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<Decision> {
    let token = read_arg(&cli.token, "token")?;
    let verifier = TokenVerifier::with_config(
        parse_public_key(&read_arg(&cli.public_key, "public key")?)?,
        VerifierConfig {
            leeway_secs: cli.leeway_secs,
            validate_issued_at: cli.validate_issued_at,
            expected_issuer: cli.issuer.clone(),
            ..Default::default()
        },
    );

    let authorizer = TokenAuthorizer::from_token(&token, &verifier, EngineConfig::default())
        .context("token rejected")?;

    let subject = cli.subject.as_deref().unwrap_or(authorizer.principal());
    let decision = authorizer.enforcer().decide(&EnforcementQuery::new(
        subject,
        cli.resource.as_str(),
        cli.action.as_str(),
    ));

    info!(subject, allowed = decision.allowed, "Decision");

    if cli.explain {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else {
        println!("{}", if decision.allowed { "ALLOW" } else { "DENY" });
    }

    Ok(decision)
}

fn read_arg(arg: &str, what: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {} file {}", what, path))
            .map(|s| s.trim().to_string()),
        None => Ok(arg.trim().to_string()),
    }
}

/// Uncompressed SEC1 point: `0x04 || x || y`
const P256_POINT_LEN: usize = 65;

fn parse_public_key(encoded: &str) -> Result<Box<dyn SignatureVerifier>> {
    if encoded.contains("-----BEGIN") {
        return Es256Verifier::from_pem(encoded.as_bytes())
            .map(|v| Box::new(v) as Box<dyn SignatureVerifier>)
            .ok_or_else(|| anyhow!("public key PEM is not a valid EC key"));
    }

    let bytes = STANDARD
        .decode(encoded)
        .or_else(|_| URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('=')))
        .context("public key is not valid base64")?;

    match bytes.len() {
        P256_POINT_LEN if bytes[0] == 0x04 => {
            let x = URL_SAFE_NO_PAD.encode(&bytes[1..33]);
            let y = URL_SAFE_NO_PAD.encode(&bytes[33..]);
            Es256Verifier::from_components(&x, &y)
                .map(|v| Box::new(v) as Box<dyn SignatureVerifier>)
                .ok_or_else(|| anyhow!("public key is not a valid P-256 point"))
        }
        _ => Ed25519Verifier::from_bytes(&bytes)
            .map(|v| Box::new(v) as Box<dyn SignatureVerifier>)
            .ok_or_else(|| {
                anyhow!("public key must be a P-256 point or a valid 32-byte Ed25519 key")
            }),
    }
}
