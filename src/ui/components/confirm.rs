use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Events emitted by the confirm dialog that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmEvent {
  /// User confirmed the action
  Confirmed,
  /// Dialog cancelled
  Cancelled,
}

/// Yes/no confirmation overlay for destructive actions
#[derive(Debug, Clone, Default)]
pub struct Confirm {
  active: bool,
  message: String,
}

impl Confirm {
  pub fn new() -> Self {
    Self::default()
  }

  /// Check if the dialog is currently active
  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Show the dialog with the given message
  pub fn show(&mut self, message: impl Into<String>) {
    self.active = true;
    self.message = message.into();
  }

  /// Hide the dialog
  pub fn hide(&mut self) {
    self.active = false;
    self.message.clear();
  }

  /// Handle a key event
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<ConfirmEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Char('y') | KeyCode::Enter => {
        self.hide();
        KeyResult::Event(ConfirmEvent::Confirmed)
      }
      KeyCode::Char('n') | KeyCode::Esc | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Event(ConfirmEvent::Cancelled)
      }
      _ => KeyResult::Handled,
    }
  }

  /// Render the dialog overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (self.message.len() as u16 + 6).min(area.width.saturating_sub(4)).max(30);
    let height = 4;

    // Center the overlay
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    let overlay_area = Rect::new(x, y, width, height);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red))
      .title(" Confirm ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let lines = vec![
      Line::from(self.message.as_str()),
      Line::from(vec![
        Span::styled("<y>", Style::default().fg(Color::Yellow)),
        Span::raw(" confirm "),
        Span::styled("<n>", Style::default().fg(Color::Yellow)),
        Span::raw(" cancel"),
      ]),
    ];
    let para = Paragraph::new(lines).wrap(Wrap { trim: true });
    frame.render_widget(para, inner);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_confirm_with_y() {
    let mut confirm = Confirm::new();
    confirm.show("Delete task 'report'?");

    let result = confirm.handle_key(key(KeyCode::Char('y')));
    assert_eq!(result, KeyResult::Event(ConfirmEvent::Confirmed));
    assert!(!confirm.is_active());
  }

  #[test]
  fn test_cancel_with_esc() {
    let mut confirm = Confirm::new();
    confirm.show("Delete task 'report'?");

    let result = confirm.handle_key(key(KeyCode::Esc));
    assert_eq!(result, KeyResult::Event(ConfirmEvent::Cancelled));
    assert!(!confirm.is_active());
  }

  #[test]
  fn test_other_keys_swallowed_while_active() {
    let mut confirm = Confirm::new();
    confirm.show("Sure?");

    let result = confirm.handle_key(key(KeyCode::Char('j')));
    assert_eq!(result, KeyResult::Handled);
    assert!(confirm.is_active());
  }

  #[test]
  fn test_inactive_ignores_keys() {
    let mut confirm = Confirm::new();
    let result = confirm.handle_key(key(KeyCode::Char('y')));
    assert_eq!(result, KeyResult::NotHandled);
  }
}
