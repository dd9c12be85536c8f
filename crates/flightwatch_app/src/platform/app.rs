use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use engine_logging::{engine_info, engine_warn};
use flightwatch_core::{Phase, SearchCriteria, TrackerView};
use flightwatch_engine::{
    ChannelSink, JobStatusTracker, ReqwestSubmitter, SearchSubmitter, TrackerEvent,
    TungsteniteConnector,
};
use serde_json::Value;
use tokio::sync::mpsc;

use super::cli::CliArgs;
use super::config::AppConfig;
use super::render::{progress_line, render_results, search_summary};

const EXIT_FAILED: u8 = 1;
const EXIT_INTERRUPTED: u8 = 130;

enum Ending {
    Delivered(Value),
    Failed(String),
    Interrupted,
    Cancelled,
}

pub(crate) async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let config = AppConfig::load(&args.config)?;
    let criteria = args.criteria();
    criteria.validate().context("invalid search")?;

    print!("{}", search_summary(&criteria));
    let submitter = ReqwestSubmitter::new(&config.submit_settings())?;
    let job_id = submitter.submit(&criteria).await?;
    println!("Search job {job_id} accepted\n");

    let connector = match &config.origin {
        Some(origin) => TungsteniteConnector::with_origin(origin.clone()),
        None => TungsteniteConnector::new(),
    };
    let (sink, mut events) = ChannelSink::channel();
    let handle = JobStatusTracker::spawn(
        job_id,
        criteria.clone(),
        config.tracker_settings(),
        Arc::new(connector),
        Arc::new(sink),
    )?;

    let ending = follow(&mut events).await?;
    println!();

    match ending {
        Ending::Delivered(payload) => {
            handle.shutdown().await;
            print!("\n{}", render_results(&payload, &criteria));
            Ok(ExitCode::SUCCESS)
        }
        Ending::Failed(message) => {
            handle.shutdown().await;
            eprintln!("Error: {message}");
            Ok(ExitCode::from(EXIT_FAILED))
        }
        Ending::Interrupted => {
            handle.cancel().await;
            // The tracker has torn down; whatever it queued is all there is.
            while let Some(event) = events.recv().await {
                if event == TrackerEvent::CancelRequested {
                    report_cancelled(&criteria);
                }
            }
            Ok(ExitCode::from(EXIT_INTERRUPTED))
        }
        Ending::Cancelled => {
            report_cancelled(&criteria);
            Ok(ExitCode::from(EXIT_INTERRUPTED))
        }
    }
}

async fn follow(events: &mut mpsc::UnboundedReceiver<TrackerEvent>) -> anyhow::Result<Ending> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(TrackerEvent::View(view)) => {
                    show(&view);
                    if let Some(error) = view.error {
                        return Ok(Ending::Failed(error));
                    }
                }
                Some(TrackerEvent::TerminalResult(payload)) => {
                    return Ok(Ending::Delivered(payload));
                }
                Some(TrackerEvent::CancelRequested) => return Ok(Ending::Cancelled),
                None => bail!("tracker stopped without a result"),
            },
            signal = &mut ctrl_c => {
                if let Err(err) = signal {
                    engine_warn!("Failed to listen for Ctrl-C: {}", err);
                }
                engine_info!("Cancel requested from the terminal");
                return Ok(Ending::Interrupted);
            }
        }
    }
}

fn show(view: &TrackerView) {
    let mut stdout = io::stdout().lock();
    let _ = write!(stdout, "\r{}\x1b[K", progress_line(view));
    if view.phase == Phase::Closed {
        let _ = write!(stdout, "\nPress Ctrl-C to cancel the search.");
    }
    let _ = stdout.flush();
}

fn report_cancelled(criteria: &SearchCriteria) {
    engine_info!(
        "Search {} -> {} cancelled",
        criteria.origin,
        criteria.destination
    );
    println!("Search cancelled");
}
