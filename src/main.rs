// src/main.rs

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use marzban_client::{
    Credentials, ExpiredUsersParams, ListAdminsParams, ListUsersParams, MarzbanApi, Session,
};
use reqwest::Client as ReqwestClient;
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

/// Command-line client for the Marzban panel API.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the Marzban panel
    #[arg(
        short,
        long,
        env = "MARZBAN_BASE_URL",
        default_value = "http://127.0.0.1:8000"
    )]
    base_url: Url,

    /// Admin username
    #[arg(short, long, env = "MARZBAN_USERNAME")]
    username: String,

    /// Admin password
    #[arg(short, long, env = "MARZBAN_PASSWORD", hide_env_values = true)]
    password: String,

    /// Accept self-signed TLS certificates
    #[arg(long, default_value_t = false)]
    insecure: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show panel statistics
    System,
    /// Show hosts grouped by inbound tag
    Hosts,
    /// List admins
    Admins {
        #[arg(long)]
        limit: Option<u64>,
        #[arg(long)]
        offset: Option<u64>,
    },
    /// List users
    Users {
        #[arg(long)]
        limit: Option<u64>,
        #[arg(long)]
        offset: Option<u64>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        sort: Option<String>,
        /// Filter by username; may be given multiple times
        #[arg(long = "username")]
        usernames: Vec<String>,
    },
    /// Show one user
    User { username: String },
    /// List expired users
    Expired {
        /// Only users expired before this time (e.g. 2024-01-01T00:00:00)
        #[arg(long)]
        before: Option<String>,
        /// Only users expired after this time
        #[arg(long)]
        after: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "marzban_client=info".into());
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let args = Args::parse();
    tracing::info!(base_url = %args.base_url, "connecting to Marzban panel");

    let http = ReqwestClient::builder()
        .danger_accept_invalid_certs(args.insecure)
        .build()
        .context("Failed to build reqwest client")?;

    let credentials = Credentials::new(args.username, args.password);
    let session = Session::connect(http, args.base_url, credentials)
        .await
        .context("Login failed")?;

    match args.command {
        Command::System => print_json(&session.system_stats().await?)?,
        Command::Hosts => print_json(&session.hosts().await?)?,
        Command::Admins { limit, offset } => {
            let params = ListAdminsParams {
                limit,
                offset,
                ..Default::default()
            };
            print_json(&session.admins(&params).await?)?;
        }
        Command::Users {
            limit,
            offset,
            status,
            sort,
            usernames,
        } => {
            let params = ListUsersParams {
                limit,
                offset,
                status,
                sort,
                username: usernames,
            };
            print_json(&session.users(&params).await?)?;
        }
        Command::User { username } => print_json(&session.user(&username).await?)?,
        Command::Expired { before, after } => {
            let params = ExpiredUsersParams {
                before: before.as_deref().map(parse_timestamp).transpose()?,
                after: after.as_deref().map(parse_timestamp).transpose()?,
            };
            print_json(&session.expired_users(&params).await?)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to format output")?
    );
    Ok(())
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let parsed = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .with_context(|| format!("Invalid timestamp '{value}', expected YYYY-MM-DDTHH:MM:SS"))?;
    Ok(parsed.and_utc())
}
