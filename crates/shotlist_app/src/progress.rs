use std::io::{self, Write};

use shotlist_core::{CaptureOutcome, CaptureStatus, ProgressSnapshot};

const BAR_WIDTH: usize = 40;
const MESSAGE_WIDTH: usize = 30;

/// Single-line terminal progress display fed from the scan event stream.
pub struct ProgressLine {
    snapshot: ProgressSnapshot,
    message: String,
    last_width: usize,
}

impl ProgressLine {
    pub fn new(total: usize) -> Self {
        Self {
            snapshot: ProgressSnapshot {
                total,
                ..ProgressSnapshot::default()
            },
            message: String::new(),
            last_width: 0,
        }
    }

    pub fn note(&mut self, outcome: &CaptureOutcome) {
        self.message = outcome_message(outcome);
    }

    pub fn update(&mut self, snapshot: ProgressSnapshot) {
        self.snapshot = snapshot;
        self.draw();
    }

    pub fn finish(&mut self) {
        self.clear();
        println!();
    }

    fn draw(&mut self) {
        let line = render_line(&self.snapshot, &self.message);
        let padding = self.last_width.saturating_sub(line.chars().count());
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "\r{line}{}", " ".repeat(padding));
        let _ = stdout.flush();
        self.last_width = line.chars().count();
    }

    fn clear(&mut self) {
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "\r{}\r", " ".repeat(self.last_width));
        let _ = stdout.flush();
        self.last_width = 0;
    }
}

pub fn render_line(snapshot: &ProgressSnapshot, message: &str) -> String {
    let fraction = snapshot.fraction().clamp(0.0, 1.0);
    let filled = (fraction * BAR_WIDTH as f64).round() as usize;
    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled));
    format!(
        "[{bar}] {:>3}% {}/{} ok:{} err:{} skip:{} {}",
        (fraction * 100.0).round() as u32,
        snapshot.completed,
        snapshot.total,
        snapshot.succeeded,
        snapshot.failed,
        snapshot.skipped,
        truncate(message, MESSAGE_WIDTH)
    )
}

fn outcome_message(outcome: &CaptureOutcome) -> String {
    let label = match outcome.status {
        CaptureStatus::Success => "[OK]",
        CaptureStatus::Skipped => "[--]",
        CaptureStatus::Failed | CaptureStatus::TimedOut => "[ERR]",
    };
    let host = outcome
        .target
        .host()
        .unwrap_or_else(|| outcome.target.raw_url.clone());
    format!("{label} {host}")
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
