use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::api::categories::CategoryInput;
use crate::api::types::Category;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Validated form contents handed back on submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFormData {
  /// Present when editing, absent when creating
  pub id: Option<String>,
  pub input: CategoryInput,
}

/// Events emitted by the category form that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFormEvent {
  Submitted(CategoryFormData),
  Cancelled,
}

/// Modal form for creating and renaming categories
#[derive(Debug, Clone, Default)]
pub struct CategoryForm {
  active: bool,
  editing_id: Option<String>,
  name: TextInput,
  error: Option<String>,
}

impl CategoryForm {
  pub fn new() -> Self {
    Self::default()
  }

  /// Check if the form is currently active
  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Open the form blank for a new category
  pub fn show_create(&mut self) {
    self.active = true;
    self.editing_id = None;
    self.name.clear();
    self.error = None;
  }

  /// Open the form prefilled from an existing category
  pub fn show_edit(&mut self, category: &Category) {
    self.active = true;
    self.editing_id = Some(category.id.clone());
    self.name.set_value(category.name.clone());
    self.error = None;
  }

  /// Close the form, discarding its contents
  pub fn hide(&mut self) {
    self.active = false;
    self.editing_id = None;
    self.name.clear();
    self.error = None;
  }

  /// Handle a key event
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<CategoryFormEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match self.name.handle_key(key) {
      InputResult::Submitted(_) => {
        let name = self.name.value().trim().to_string();
        if name.is_empty() {
          self.error = Some("name is required".to_string());
          return KeyResult::Handled;
        }
        let data = CategoryFormData {
          id: self.editing_id.clone(),
          input: CategoryInput { name },
        };
        self.hide();
        KeyResult::Event(CategoryFormEvent::Submitted(data))
      }
      InputResult::Cancelled => {
        self.hide();
        KeyResult::Event(CategoryFormEvent::Cancelled)
      }
      InputResult::Consumed => {
        self.error = None;
        KeyResult::Handled
      }
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  /// Render the form overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (area.width * 60 / 100).min(50).max(30);
    let height = 5;

    // Center the overlay
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    let overlay_area = Rect::new(x, y, width, height);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let title = if self.editing_id.is_some() {
      " Rename category "
    } else {
      " New category "
    };
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(title);

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let mut lines = vec![Line::from(vec![
      Span::styled("Name  ", Style::default().fg(Color::DarkGray)),
      Span::raw(self.name.value()),
      Span::styled("_", Style::default().fg(Color::Yellow)), // Cursor
    ])];

    if let Some(error) = &self.error {
      lines.push(Line::from(Span::styled(
        error.clone(),
        Style::default().fg(Color::Red),
      )));
    } else {
      lines.push(Line::from(Span::styled(
        "<enter> save  <esc> cancel",
        Style::default().fg(Color::DarkGray),
      )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
  }
}
