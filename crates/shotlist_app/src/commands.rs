use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use shotlist_core::{parse_targets, CaptureStatus, ScanConfig, ScanRun};
use shotlist_engine::{
    list_captures, CancellationToken, CapturePolicy, ChromiumBackend, EngineHandle, HistoryStore,
    ScanEvent,
};
use shotlist_logging::{scan_info, scan_warn};

use crate::progress::ProgressLine;
use crate::ScanArgs;

const EVENT_POLL: Duration = Duration::from_millis(200);

pub fn scan(args: ScanArgs, history_file: &Path) -> anyhow::Result<()> {
    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("reading URL list {}", args.input.display()))?;
    let list = parse_targets(&raw)?;

    for rejected in &list.rejected {
        println!(
            "[!] Skipping line {:?}: {}",
            rejected.target.raw_url, rejected.reason
        );
    }
    println!("[OK] Found {} URLs to process", list.targets.len());

    let config = ScanConfig {
        concurrency: args.threads,
        quality: args.quality,
        timeout: Duration::from_millis(args.timeout),
        output_dir: args.output,
        run_deadline: args.deadline.map(Duration::from_secs),
        source_label: Some(args.input.display().to_string()),
    };
    config.validate()?;

    let policy = CapturePolicy {
        chrome_executable: args.chrome,
        ..CapturePolicy::default()
    };
    let backend = Arc::new(ChromiumBackend::new(policy));
    let handle = EngineHandle::start(list, config, backend)?;
    cancel_on_ctrl_c(handle.cancellation_token());

    let mut line = ProgressLine::new(0);
    loop {
        match handle.recv_timeout(EVENT_POLL) {
            Some(ScanEvent::Started { total, .. }) => line = ProgressLine::new(total),
            Some(ScanEvent::Outcome(outcome)) => line.note(&outcome),
            Some(ScanEvent::Progress(snapshot)) => line.update(snapshot),
            Some(ScanEvent::Finished { .. }) => break,
            None if handle.is_finished() => break,
            None => {}
        }
    }
    line.finish();

    let run = handle.join()?;
    print_failures(&run);
    save_history(&run, history_file, args.history_limit);
    print_summary(&run);
    Ok(())
}

pub fn history(history_file: &Path, limit: usize) -> anyhow::Result<()> {
    let store = HistoryStore::new(history_file);
    let entries = store.list(limit)?;
    if entries.is_empty() {
        println!("No scans recorded in {}", store.path().display());
        return Ok(());
    }

    for entry in &entries {
        let when = entry.timestamp.with_timezone(&chrono::Local);
        println!(
            "{}  {:>4} urls  ok:{:<4} err:{:<4} skip:{:<4} {:>5.1}%  {}{}",
            when.format("%Y-%m-%d %H:%M:%S"),
            entry.total,
            entry.succeeded,
            entry.failed,
            entry.skipped,
            entry.success_rate() * 100.0,
            entry.output_dir.display(),
            if entry.cancelled { "  (cancelled)" } else { "" }
        );
    }

    let stats = store.stats()?;
    println!(
        "\n{} scans, {} urls, {} captured, {} failed, {:.1}% success",
        stats.total_runs,
        stats.total_targets,
        stats.total_captured,
        stats.total_failed,
        stats.success_rate * 100.0
    );
    Ok(())
}

pub fn list(output: &Path) -> anyhow::Result<()> {
    if !output.is_dir() {
        bail!("no screenshot directory at {}", output.display());
    }
    let files = list_captures(output)?;
    if files.is_empty() {
        println!("No screenshots in {}", output.display());
        return Ok(());
    }
    for (i, file) in files.iter().enumerate() {
        println!(
            "{:>4}. {}  ({:.1} KB)  {}",
            i + 1,
            file.filename,
            file.size as f64 / 1024.0,
            file.url.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn cancel_on_ctrl_c(token: CancellationToken) {
    let spawned = thread::Builder::new()
        .name("shotlist-signal".to_string())
        .spawn(move || {
            let Ok(runtime) = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            else {
                return;
            };
            runtime.block_on(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    scan_info!("Interrupt received; cancelling scan");
                    token.cancel();
                }
            });
        });
    if let Err(err) = spawned {
        scan_warn!("Ctrl-C handler unavailable: {err}");
    }
}

fn save_history(run: &ScanRun, history_file: &Path, limit: Option<usize>) {
    let mut store = HistoryStore::new(history_file);
    if let Some(max) = limit {
        store = store.with_max_entries(max);
    }
    if let Err(err) = store.record(run) {
        scan_warn!("History save failed: {err}");
        eprintln!("[!] Could not save scan history: {err}");
    }
}

fn print_failures(run: &ScanRun) {
    for outcome in run.logical_outcomes() {
        if matches!(outcome.status, CaptureStatus::Failed | CaptureStatus::TimedOut) {
            println!(
                "[ERR] {}: {}",
                outcome.target.raw_url,
                outcome.error_detail.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

fn print_summary(run: &ScanRun) {
    let counts = run.counts();
    if run.cancelled {
        println!("[!] Scan cancelled");
    }
    println!(
        "[OK] {} captured, {} failed, {} skipped. Output: {}",
        counts.succeeded,
        counts.failed,
        counts.skipped,
        run.output_dir.display()
    );
}
