//! Single request command

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use is_terminal::IsTerminal;
use log::{debug, info};
use odata_cli::api::{Credentials, ODataRequest, RequestError, RequestRunner, RestVerb, preference_applied};
use odata_cli::config::{ConfigError, ServiceConnection, Settings};
use reqwest::Url;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Args)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, MERGE, DELETE)
    pub method: RestVerb,
    /// Path relative to ODATA_SERVICE_URL, or an absolute URL
    pub target: String,
    /// Accepted media type (repeatable, overrides configured defaults)
    #[arg(short, long)]
    pub accept: Vec<String>,
    /// Extra request header as NAME:VALUE (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,
    /// JSON request body
    #[arg(short, long)]
    pub json: Option<String>,
    /// Ask the server to echo the entity back
    #[arg(long, conflicts_with = "no_return_content")]
    pub return_content: bool,
    /// Ask the server not to echo the entity back
    #[arg(long)]
    pub no_return_content: bool,
    /// Send If-Match: * on update, merge and delete
    #[arg(long)]
    pub check_concurrency: bool,
    /// Basic auth username (overrides ODATA_USERNAME)
    #[arg(short, long, conflicts_with = "token")]
    pub user: Option<String>,
    /// Basic auth password; prompted for when omitted on a terminal
    #[arg(short, long, requires = "user")]
    pub password: Option<String>,
    /// Bearer token (overrides ODATA_BEARER_TOKEN)
    #[arg(short, long)]
    pub token: Option<String>,
    /// Print response headers
    #[arg(short, long)]
    pub include: bool,
}

fn resolve_target(target: &str) -> Result<(Url, Option<Credentials>)> {
    match ServiceConnection::from_env() {
        Ok(connection) => {
            let url = connection.url_for(target)?;
            Ok((url, connection.credentials))
        }
        Err(ConfigError::MissingServiceUrl) => {
            let url = Url::parse(target).with_context(|| {
                format!(
                    "'{}' is not an absolute URL and ODATA_SERVICE_URL is not set",
                    target
                )
            })?;
            Ok((url, None))
        }
        Err(err) => Err(err.into()),
    }
}

fn credentials_from_args(args: &RequestArgs) -> Result<Option<Credentials>> {
    if let Some(token) = &args.token {
        return Ok(Some(Credentials::bearer(token.clone())));
    }

    let Some(username) = &args.user else {
        return Ok(None);
    };

    let password = match &args.password {
        Some(password) => Some(password.clone()),
        None if std::io::stdin().is_terminal() => Some(
            rpassword::prompt_password(format!("Password for {}: ", username))
                .context("Failed to read password")?,
        ),
        None => None,
    };

    Ok(Some(Credentials::Basic {
        username: username.clone(),
        password,
    }))
}

fn build_request(args: &RequestArgs, settings: &Settings) -> Result<ODataRequest> {
    let (url, env_credentials) = resolve_target(&args.target)?;
    let mut request = ODataRequest::new(args.method, url);

    for media_type in &args.accept {
        request = request.with_accept(media_type.clone());
    }
    if args.check_concurrency {
        request = request.with_optimistic_concurrency(true);
    }
    if args.return_content {
        request = request.with_return_content(true);
    } else if args.no_return_content {
        request = request.with_return_content(false);
    }
    request = settings.request.apply(request);

    for header in &args.headers {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("Header '{}' must look like NAME:VALUE", header))?;
        request = request.with_header(name.trim(), value.trim());
    }

    if let Some(json) = &args.json {
        let body: serde_json::Value =
            serde_json::from_str(json).context("Request body is not valid JSON")?;
        request = request.with_json(&body)?;
    }

    if let Some(credentials) = credentials_from_args(args)?.or(env_credentials) {
        request = request.with_credentials(credentials);
    }

    Ok(request)
}

pub async fn handle_request_command(
    args: RequestArgs,
    settings: &Settings,
    cancel: CancellationToken,
) -> Result<()> {
    let request = build_request(&args, settings)?;
    debug!("Prepared {:?}", request);

    println!("{} {}", request.method().to_string().bold(), request.uri().as_str().cyan());

    let runner = RequestRunner::new(settings.transport_config());
    let started = Instant::now();

    let response = match runner.execute(request, &cancel).await {
        Ok(response) => response,
        Err(RequestError::Cancelled) => {
            println!("{}", "Request cancelled".yellow());
            return Ok(());
        }
        Err(RequestError::Failure(failure)) => {
            match failure.status_code() {
                Some(code) => println!("{} {}", code.to_string().red().bold(), failure.reason_phrase().red()),
                None => println!("{} {}", "transport failure:".red().bold(), failure.reason_phrase()),
            }
            return Err(failure.into());
        }
        Err(err) => return Err(err.into()),
    };

    let status = response.status();
    info!("Request completed with {} in {:?}", status, started.elapsed());
    println!(
        "{} {}",
        status.as_u16().to_string().green().bold(),
        status.canonical_reason().unwrap_or("").green()
    );

    if let Some(applied) = preference_applied(&response) {
        println!("{} {}", "Preference-Applied:".dimmed(), applied);
    }

    if args.include {
        for (name, value) in response.headers() {
            println!("{}: {}", name.as_str().dimmed(), value.to_str().unwrap_or("<binary>"));
        }
        println!();
    }

    let body = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            println!("{}", "Cancelled while reading the response body".yellow());
            return Ok(());
        }
        body = response.text() => body.context("Failed to read response body")?,
    };

    if body.is_empty() {
        return Ok(());
    }

    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) => println!("{}", body),
    }

    Ok(())
}
