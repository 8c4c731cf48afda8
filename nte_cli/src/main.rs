use std::{fs::write, path::PathBuf};

use anyhow::{bail, Result};
use chrono::Datelike;
use clap::Parser;
use nte_core::{
    date_formatter::format_event,
    event_client,
    event_client::{Event, URL},
    ical::generator::Emitter,
};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

static DEFAULT_OUTPUT: &str = "nuernberg_top_events.ical";

#[derive(Debug, Parser)]
#[command(about = "Parse Nürnberg's top events into a calendar")]
pub struct Arguments {
    /// print the parsed events without generating a calendar file
    #[arg(long, env = "NTE_DRY_RUN")]
    pub dry_run: bool,
    /// generate a calendar file
    #[arg(long, env = "NTE_ICAL")]
    pub ical: bool,
    /// the minimum number of events required
    #[arg(long, env = "NTE_MIN_EVENTS", default_value_t = 10)]
    pub min_events: usize,
    /// the calendar file to write
    #[arg(long, env = "NTE_OUTPUT", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,
    /// the page listing the top events
    #[arg(long, env = "NTE_URL", default_value = URL)]
    pub url: String,
    /// log debug messages
    #[arg(short, long, env = "NTE_VERBOSE")]
    pub verbose: bool,
}

impl Arguments {
    /// Without any output selected, the events are printed.
    fn dry_run(&self) -> bool {
        self.dry_run || !self.ical
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Fetch the events of the current and the next year.
async fn get_all_events(url: &str) -> Result<Vec<Event>> {
    let current_year = chrono::Local::now().year();
    let mut events: Vec<Event> = vec![];
    for year in [current_year, current_year + 1] {
        events.extend(event_client::get_events(url, year).await?);
    }
    Ok(events)
}

/// Refuse to continue with suspiciously few events.
fn check_min_events(events: &[Event], min_events: usize) -> Result<()> {
    if events.len() < min_events {
        bail!(
            "only found {} events (minimum: {min_events}), the website may be unavailable or its format changed, not updating the calendar",
            events.len()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Arguments::parse();
    init_tracing(args.verbose);
    let events = get_all_events(&args.url).await?;
    check_min_events(&events, args.min_events)?;
    if args.dry_run() {
        for event in &events {
            println!("{}", format_event(&event.title, &event.date));
        }
    }
    if args.ical {
        let calendar = event_client::get_calendar(&events, &args.url);
        write(&args.output, calendar.generate())?;
        info!(path = %args.output.display(), "wrote calendar");
        println!(
            "Generated {} with {} events",
            args.output.display(),
            events.len()
        );
    }
    Ok(())
}
