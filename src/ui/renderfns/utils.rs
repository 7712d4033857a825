use chrono::{DateTime, Utc};
use ratatui::prelude::Color;

use crate::api::types::TaskStatus;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for a task status
pub fn status_color(status: TaskStatus) -> Color {
  match status {
    TaskStatus::Pending => Color::Yellow,
    TaskStatus::InProgress => Color::Blue,
    TaskStatus::Done => Color::Green,
  }
}

/// Format a timestamp for table cells, e.g. "7/05/2023 14:30"
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
  ts.format("%-d/%m/%Y %-H:%M").to_string()
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    // Must cut at character boundaries, not bytes
    assert_eq!(truncate("análise de requisitos", 10), "análise...");
  }

  #[test]
  fn test_status_colors() {
    assert_eq!(status_color(TaskStatus::Pending), Color::Yellow);
    assert_eq!(status_color(TaskStatus::InProgress), Color::Blue);
    assert_eq!(status_color(TaskStatus::Done), Color::Green);
  }

  #[test]
  fn test_format_timestamp() {
    let ts = Utc.with_ymd_and_hms(2023, 5, 7, 14, 30, 0).unwrap();
    assert_eq!(format_timestamp(&ts), "7/05/2023 14:30");

    let early = Utc.with_ymd_and_hms(2023, 11, 21, 9, 5, 0).unwrap();
    assert_eq!(format_timestamp(&early), "21/11/2023 9:05");
  }
}
