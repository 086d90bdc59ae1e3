use std::io::{self, Write};
use study_core::device::DeviceError;
use study_core::model::{DeviceData, TargetDuration};
use study_core::progress::ProgressSnapshot;
use study_core::sync_loop::{DashboardSink, DashboardUpdate};
use time::OffsetDateTime;

const BAR_WIDTH: usize = 20;

/// Plain-text dashboard written to a terminal (or any writer).
pub struct TerminalDashboard<W> {
    out: W,
}

impl<W: Write> TerminalDashboard<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl TerminalDashboard<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> DashboardSink for TerminalDashboard<W> {
    fn render(&mut self, update: &DashboardUpdate) {
        let _ = write_update(&mut self.out, update, &timestamp_label());
        let _ = self.out.flush();
    }

    fn render_failure(&mut self, error: &DeviceError) {
        let _ = writeln!(self.out, "Error fetching data ({error})");
        let _ = self.out.flush();
    }

    fn render_progress(&mut self, target: TargetDuration, progress: &ProgressSnapshot) {
        let _ = writeln!(self.out, "Target set to {target}");
        let _ = write_progress(&mut self.out, progress);
        let _ = self.out.flush();
    }

    fn notice(&mut self, message: &str) {
        let _ = writeln!(self.out, "{message}");
        let _ = self.out.flush();
    }
}

pub fn write_update(out: &mut impl Write, update: &DashboardUpdate, updated_at: &str) -> io::Result<()> {
    let data = &update.data;
    writeln!(out)?;
    writeln!(out, "Last updated: {updated_at}")?;
    writeln!(out, "{:<10} {}", "Physics", data.physics)?;
    writeln!(out, "{:<10} {}", "Chemistry", data.chemistry)?;
    writeln!(out, "{:<10} {}", "Math", data.math)?;
    if update.elapsed.is_malformed() {
        writeln!(out, "{:<10} {} (unreadable, counted as 0)", "PCM total", data.pcm_total)?;
    } else {
        writeln!(out, "{:<10} {}", "PCM total", data.pcm_total)?;
    }
    write_progress(out, &update.progress)?;
    writeln!(out)?;
    write_log_table(out, data)
}

pub fn write_progress(out: &mut impl Write, progress: &ProgressSnapshot) -> io::Result<()> {
    if progress.not_set {
        return writeln!(out, "{:<10} Not set", "Target");
    }
    writeln!(
        out,
        "{:<10} {} {}",
        "Target",
        progress.summary(),
        render_progress_bar(progress.percent_complete, BAR_WIDTH)
    )
}

pub fn write_log_table(out: &mut impl Write, data: &DeviceData) -> io::Result<()> {
    writeln!(
        out,
        "{:<18} {:<10} {:<10} {:<10} {:<10}",
        "Date & Time", "Physics", "Chemistry", "Math", "PCM Total"
    )?;
    if data.log.is_empty() {
        return writeln!(out, "No logs yet. Run `log-now` (or type `log`) to add an entry.");
    }
    for entry in data.recent_log() {
        writeln!(
            out,
            "{:<18} {:<10} {:<10} {:<10} {:<10}",
            entry.datetime, entry.physics, entry.chemistry, entry.math, entry.pcm
        )?;
    }
    Ok(())
}

pub fn render_progress_bar(percent: u8, width: usize) -> String {
    if width == 0 {
        return "[]".to_string();
    }
    let filled = (usize::from(percent.min(100)) * width + 50) / 100;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(empty))
}

pub fn timestamp_label() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let format = time::format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]");
    match format {
        Ok(format) => now
            .format(&format)
            .unwrap_or_else(|_| now.unix_timestamp().to_string()),
        Err(_) => now.unix_timestamp().to_string(),
    }
}
