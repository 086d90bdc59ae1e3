use crate::duration::format_duration;
use crate::model::TargetDuration;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ProgressSnapshot {
    pub studied_seconds: u64,
    pub target_seconds: u64,
    pub remaining_seconds: u64,
    pub percent_complete: u8,
    pub not_set: bool,
}

impl ProgressSnapshot {
    /// Dashboard line, e.g. `00:30:00 / 01:00:00 (50%) - left 00:30:00`.
    pub fn summary(&self) -> String {
        if self.not_set {
            return "Not set".to_string();
        }
        format!(
            "{} / {} ({}%) - left {}",
            format_secs(self.studied_seconds),
            format_secs(self.target_seconds),
            self.percent_complete,
            format_secs(self.remaining_seconds)
        )
    }
}

pub fn compute_progress(studied_seconds: u64, target: TargetDuration) -> ProgressSnapshot {
    let target_seconds = target.as_secs();
    if target_seconds == 0 {
        return ProgressSnapshot {
            studied_seconds,
            target_seconds,
            remaining_seconds: 0,
            percent_complete: 0,
            not_set: true,
        };
    }
    ProgressSnapshot {
        studied_seconds,
        target_seconds,
        remaining_seconds: target_seconds.saturating_sub(studied_seconds),
        percent_complete: rounded_percent(studied_seconds, target_seconds),
        not_set: false,
    }
}

// Half-up rounding in integer space; u128 keeps large totals from overflowing.
fn rounded_percent(studied: u64, target: u64) -> u8 {
    let studied = u128::from(studied);
    let target = u128::from(target);
    let percent = (studied * 200 + target) / (target * 2);
    percent.min(100) as u8
}

fn format_secs(secs: u64) -> String {
    format_duration(i64::try_from(secs).unwrap_or(i64::MAX))
}
