//! `fanout` command implementation.

use anyhow::{Context, Result};
use tracing::{info, warn};

use handle_write::{create_dispatcher, Dispatcher};
use observability::metrics::{record_bytes_written, record_dispatch, record_write_failure};
use observability::DispatchStats;

use crate::cli::FanoutArgs;
use crate::error::CliError;
use crate::input::{for_each_chunk, text_payload};

use super::load_config;

/// Execute the `fanout` command
pub fn run_fanout(args: &FanoutArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    info!(
        config = %args.config.display(),
        sinks = config.sinks.len(),
        "Configuration loaded"
    );

    let mut dispatcher = create_dispatcher(&config).context("Failed to create sinks")?;
    dispatcher.open_all().context("Failed to open sinks")?;

    let mut stats = DispatchStats::new();
    let fed = match &args.text {
        Some(text) => {
            deliver(&mut dispatcher, &mut stats, text_payload(text, args.newline).as_bytes());
            Ok(())
        }
        None => {
            let copied = for_each_chunk(std::io::stdin().lock(), |chunk| {
                deliver(&mut dispatcher, &mut stats, chunk);
                Ok::<(), CliError>(())
            });
            if copied.is_ok() && args.newline {
                deliver(&mut dispatcher, &mut stats, b"\n");
            }
            copied.map(|_| ())
        }
    };

    let failed = finish(dispatcher, &mut stats);
    eprint!("{}", stats.summary());

    fed.context("Failed to read input")?;
    if failed.is_empty() {
        Ok(())
    } else {
        Err(CliError::sink_failures(failed.iter().map(String::as_str)).into())
    }
}

/// Dispatch one payload and fold the outcome into `stats`
fn deliver(dispatcher: &mut Dispatcher, stats: &mut DispatchStats, payload: &[u8]) {
    let outcome = dispatcher.dispatch(payload);
    record_dispatch(outcome.is_success());

    for (sink, error) in &outcome.failures {
        record_write_failure(sink, error.kind());
    }
    stats.update(
        payload.len(),
        outcome.delivered,
        outcome.skipped,
        outcome.failures.iter().map(|(sink, _)| sink.as_str()),
    );
}

/// Shut the dispatcher down and return every sink that failed during the run
///
/// Byte counts are published only after shutdown, so bytes a sink buffered
/// but never managed to write out are not reported as written.
fn finish(mut dispatcher: Dispatcher, stats: &mut DispatchStats) -> Vec<String> {
    let mut failed: Vec<String> = stats.failures.keys().cloned().collect();
    let mut note_failure = |sink: String| {
        if !failed.contains(&sink) {
            failed.push(sink);
        }
    };

    for (sink, error) in dispatcher.flush_all().failures {
        warn!(sink = %sink, error = %error, "Sink failed to flush");
        record_write_failure(&sink, error.kind());
        note_failure(sink);
    }

    let handles: Vec<_> = dispatcher
        .sink_names()
        .into_iter()
        .filter_map(|name| dispatcher.sink_metrics(name).map(|m| (name.to_string(), m)))
        .collect();

    for (sink, error) in dispatcher.shutdown() {
        warn!(sink = %sink, error = %error, "Sink failed to close");
        record_write_failure(&sink, error.kind());
        note_failure(sink);
    }

    for (sink, metrics) in handles {
        record_bytes_written(&sink, metrics.bytes_written() as usize);
    }
    failed
}
