//! Terminal formatting shared by the command handlers

use chrono::{DateTime, Duration, Utc};
use colored::{ColoredString, Colorize};
use conveyor_core::domain::job::JobStatus;
use conveyor_core::domain::pipeline::PipelineStatus;

pub fn colorize_job_status(status: JobStatus) -> ColoredString {
    let label = status.to_string();
    match status {
        JobStatus::Pending => label.blue(),
        JobStatus::Running => label.yellow(),
        JobStatus::Completed => label.green(),
        JobStatus::Failed => label.red(),
    }
}

pub fn colorize_pipeline_status(status: PipelineStatus) -> ColoredString {
    let label = status.to_string();
    match status {
        PipelineStatus::Pending => label.blue(),
        PipelineStatus::Running => label.yellow(),
        PipelineStatus::Completed => label.green(),
        PipelineStatus::Failed => label.red(),
    }
}

/// Human readable duration, e.g. `1h 2m 3s`
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.num_milliseconds().max(0);
    if millis < 1000 {
        return format!("{}ms", millis);
    }

    let total = millis / 1000;
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Duration between two optional timestamps, when both are known
pub fn elapsed(
    started: Option<DateTime<Utc>>,
    finished: Option<DateTime<Utc>>,
) -> Option<String> {
    Some(format_duration(finished?.signed_duration_since(started?)))
}

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::milliseconds(250)), "250ms");
        assert_eq!(format_duration(Duration::seconds(45)), "45s");
        assert_eq!(format_duration(Duration::seconds(120)), "2m 0s");
        assert_eq!(format_duration(Duration::seconds(3723)), "1h 2m 3s");
        assert_eq!(format_duration(Duration::seconds(-5)), "0ms");
    }

    #[test]
    fn test_elapsed_needs_both_ends() {
        let start = Utc::now();
        let end = start + Duration::seconds(90);
        assert_eq!(elapsed(Some(start), Some(end)).as_deref(), Some("1m 30s"));
        assert_eq!(elapsed(Some(start), None), None);
        assert_eq!(elapsed(None, Some(end)), None);
    }
}
