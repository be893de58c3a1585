use std::path::PathBuf;
use std::process::exit;

use corkboard::canvas::CanvasClient;
use corkboard::config::Config;
use corkboard::gcal::GoogleCalendarClient;
use corkboard::Provider;

fn usage() -> ! {
    eprintln!("usage: corkboard [--dry-run] [config.json] [course_id...]");
    eprintln!();
    eprintln!("Runs one sync of upcoming assignment due-dates into the calendar.");
    eprintln!("With course IDs given, only those tracked courses are synced.");
    exit(2);
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let mut dry_run = false;
    let mut config_path: Option<PathBuf> = None;
    let mut restrict: Vec<u64> = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--dry-run" => dry_run = true,
            "--help" | "-h" => usage(),
            other => match other.parse::<u64>() {
                Ok(course_id) => restrict.push(course_id),
                Err(_) if config_path.is_none() => config_path = Some(PathBuf::from(other)),
                Err(_) => usage(),
            },
        }
    }
    let config_path = config_path.unwrap_or_else(|| PathBuf::from("corkboard.json"));

    let summary = match run(&config_path, dry_run, restrict).await {
        Ok(summary) => summary,
        Err(err) => {
            eprintln!("Sync aborted: {}", err);
            exit(1);
        }
    };

    print!("{}", summary);
    if summary.is_success() == false {
        eprintln!("Some items failed, see above. You can safely start a new sync.");
        exit(1);
    }
}

async fn run(
    config_path: &std::path::Path,
    dry_run: bool,
    restrict: Vec<u64>,
) -> Result<corkboard::RunSummary, corkboard::Error> {
    let config = Config::from_file(config_path)?;
    let tracked = config.tracked_courses()?;

    let courses = CanvasClient::new(
        config.course_service_url.clone(),
        config.course_token()?,
        config.timezone()?,
        config.request_timeout(),
    )?;
    let calendar = GoogleCalendarClient::new(
        &config.calendar_credential_file,
        &config.calendar_id,
        config.request_timeout(),
    )?;

    let mut provider = Provider::new(courses, calendar, tracked).dry_run(dry_run);
    if restrict.is_empty() == false {
        provider = provider.restricted_to(restrict);
    }

    provider.sync().await
}
