use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// How long a toast stays on screen
const TOAST_LIFETIME: Duration = Duration::from_secs(2);

/// Most toasts shown at once, oldest dropped first
const MAX_VISIBLE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToastKind {
  Success,
  Error,
}

#[derive(Debug, Clone)]
struct Toast {
  message: String,
  kind: ToastKind,
  created: Instant,
}

impl Toast {
  fn expired(&self) -> bool {
    self.created.elapsed() >= TOAST_LIFETIME
  }
}

/// Short-lived notifications stacked in the bottom-left corner.
///
/// Cloning shares the underlying list, so views can push toasts while the
/// app owns rendering and expiry.
#[derive(Debug, Clone, Default)]
pub struct Toasts {
  inner: Arc<Mutex<Vec<Toast>>>,
}

impl Toasts {
  pub fn new() -> Self {
    Self::default()
  }

  fn push(&self, message: String, kind: ToastKind) {
    let mut toasts = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
    toasts.push(Toast {
      message,
      kind,
      created: Instant::now(),
    });
    if toasts.len() > MAX_VISIBLE {
      let excess = toasts.len() - MAX_VISIBLE;
      toasts.drain(..excess);
    }
  }

  /// Show a success notification
  pub fn success(&self, message: impl Into<String>) {
    self.push(message.into(), ToastKind::Success);
  }

  /// Show an error notification
  pub fn error(&self, message: impl Into<String>) {
    self.push(message.into(), ToastKind::Error);
  }

  /// Drop expired toasts, called once per tick
  pub fn prune(&self) {
    self
      .inner
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .retain(|toast| !toast.expired());
  }

  /// Render active toasts stacked upward from the bottom-left corner
  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let toasts = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
    if toasts.is_empty() {
      return;
    }

    let mut bottom = area.y + area.height;
    for toast in toasts.iter().rev() {
      let height = 3;
      if bottom < area.y + height {
        break;
      }

      let width = (toast.message.chars().count() as u16 + 4)
        .min(area.width.saturating_sub(2))
        .max(12);
      let toast_area = Rect::new(area.x + 1, bottom - height, width, height);

      let color = match toast.kind {
        ToastKind::Success => Color::Green,
        ToastKind::Error => Color::Red,
      };

      frame.render_widget(Clear, toast_area);
      let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
      let inner = block.inner(toast_area);
      frame.render_widget(block, toast_area);
      frame.render_widget(Paragraph::new(toast.message.as_str()), inner);

      bottom -= height;
    }
  }

  #[cfg(test)]
  fn len(&self) -> usize {
    self.inner.lock().unwrap().len()
  }

  #[cfg(test)]
  fn backdate_all(&self, by: Duration) {
    let mut toasts = self.inner.lock().unwrap();
    for toast in toasts.iter_mut() {
      if let Some(earlier) = toast.created.checked_sub(by) {
        toast.created = earlier;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_push_and_prune_keeps_fresh() {
    let toasts = Toasts::new();
    toasts.success("saved");
    toasts.prune();
    assert_eq!(toasts.len(), 1);
  }

  #[test]
  fn test_prune_drops_expired() {
    let toasts = Toasts::new();
    toasts.success("saved");
    toasts.error("failed");
    toasts.backdate_all(TOAST_LIFETIME + Duration::from_millis(10));
    toasts.prune();
    assert_eq!(toasts.len(), 0);
  }

  #[test]
  fn test_clones_share_the_list() {
    let toasts = Toasts::new();
    let handle = toasts.clone();
    handle.success("from a view");
    assert_eq!(toasts.len(), 1);
  }

  #[test]
  fn test_overflow_drops_oldest() {
    let toasts = Toasts::new();
    for i in 0..6 {
      toasts.success(format!("toast {}", i));
    }
    assert_eq!(toasts.len(), MAX_VISIBLE);
  }
}
