use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gapwatch-cli")]
#[command(about = "Management CLI for the coverage gap engine", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check engine status and pool occupancy
    Status,
    /// Show the active retention policy
    Retention,
    /// Query stored call records
    Pool {
        /// Window start (RFC 3339); default: 24h ago
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// Window end (RFC 3339); default: now
        #[arg(long)]
        to: Option<DateTime<Utc>>,
        /// Only records from this pod
        #[arg(long)]
        pod: Option<String>,
        /// Only records with this HTTP method
        #[arg(long)]
        method: Option<String>,
        /// Only endpoints starting with this prefix
        #[arg(long)]
        endpoint_prefix: Option<String>,
        /// Maximum records to return
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Run a gap analysis over a time window
    Analyze {
        /// Window start (RFC 3339); default: 24h ago
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// Window end (RFC 3339); default: now
        #[arg(long)]
        to: Option<DateTime<Utc>>,
        /// Service whose threshold overrides and metric scope apply
        #[arg(long)]
        service: Option<String>,
        /// Team whose alerts to correlate; repeatable
        #[arg(long = "team")]
        teams: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/status", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Retention => {
            let res = client.get(format!("{}/retention", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Pool {
            from,
            to,
            pod,
            method,
            endpoint_prefix,
            limit,
        } => {
            let (from, to) = window(from, to);
            let mut query: Vec<(&str, String)> = vec![
                ("from", from.to_rfc3339()),
                ("to", to.to_rfc3339()),
            ];
            if let Some(pod) = pod {
                query.push(("pod", pod));
            }
            if let Some(method) = method {
                query.push(("method", method));
            }
            if let Some(prefix) = endpoint_prefix {
                query.push(("endpoint_prefix", prefix));
            }
            if let Some(limit) = limit {
                query.push(("limit", limit.to_string()));
            }

            let res = client
                .get(format!("{}/pool", cli.url))
                .query(&query)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Analyze {
            from,
            to,
            service,
            teams,
        } => {
            let (from, to) = window(from, to);
            let body = serde_json::json!({
                "from": from.to_rfc3339(),
                "to": to.to_rfc3339(),
                "service": service,
                "teams": teams,
            });

            let res = client
                .post(format!("{}/analysis", cli.url))
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

/// Fill in the default window: the last 24 hours.
fn window(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> (DateTime<Utc>, DateTime<Utc>) {
    let to = to.unwrap_or_else(Utc::now);
    let from = from.unwrap_or_else(|| to - Duration::hours(24));
    (from, to)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
