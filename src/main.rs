use event_tally::config::Config;
use event_tally::db::Database;
use event_tally::report;
use event_tally::results::load_event_results;
use log::{error, info};
use std::env;
use std::process::ExitCode;

const USAGE: &str = "Usage: event-tally <event-id> [--json]";

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let as_json = args.iter().any(|arg| arg == "--json");
    let Some(event_id) = args.iter().find(|arg| !arg.starts_with("--")) else {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    };

    match run(event_id, as_json).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to load results for event {}: {}", event_id, e);
            ExitCode::FAILURE
        }
    }
}

async fn run(event_id: &str, as_json: bool) -> event_tally::Result<String> {
    let config = Config::from_env()?;
    let database = Database::connect(&config).await?;

    info!("Loading results for event {}", event_id);
    let event_results = load_event_results(&database, event_id).await?;

    if as_json {
        Ok(serde_json::to_string_pretty(&event_results)?)
    } else {
        Ok(report::render_event(&event_results))
    }
}
