use super::input::{InputResult, TextInput};
use super::select::{SelectEvent, SelectItem, SelectOverlay};
use super::KeyResult;
use crate::api::tasks::TaskInput;
use crate::api::types::{Category, Task, TaskStatus};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Validated form contents handed back on submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFormData {
  /// Present when editing, absent when creating
  pub id: Option<String>,
  pub input: TaskInput,
}

/// Events emitted by the task form that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFormEvent {
  Submitted(TaskFormData),
  Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Title,
  Description,
  Category,
  Status,
}

impl Field {
  fn next(self) -> Field {
    match self {
      Field::Title => Field::Description,
      Field::Description => Field::Category,
      Field::Category => Field::Status,
      Field::Status => Field::Title,
    }
  }

  fn previous(self) -> Field {
    match self {
      Field::Title => Field::Status,
      Field::Description => Field::Title,
      Field::Category => Field::Description,
      Field::Status => Field::Category,
    }
  }
}

/// Modal form for creating and editing tasks
#[derive(Debug, Clone, Default)]
pub struct TaskForm {
  active: bool,
  editing_id: Option<String>,
  title: TextInput,
  description: TextInput,
  category: Option<(String, String)>,
  status: Option<TaskStatus>,
  focus: Option<Field>,
  error: Option<String>,
  options: Vec<(String, String)>,
  category_picker: SelectOverlay,
  status_picker: SelectOverlay,
}

impl TaskForm {
  pub fn new() -> Self {
    Self::default()
  }

  /// Check if the form is currently active
  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Open the form blank for a new task
  pub fn show_create(&mut self) {
    self.reset();
    self.active = true;
    self.status = Some(TaskStatus::Pending);
  }

  /// Open the form prefilled from an existing task
  pub fn show_edit(&mut self, task: &Task) {
    self.reset();
    self.active = true;
    self.editing_id = Some(task.id.clone());
    self.title.set_value(task.title.clone());
    self
      .description
      .set_value(task.description.clone().unwrap_or_default());
    self.category = Some((task.category.id.clone(), task.category.name.clone()));
    self.status = Some(task.status);
  }

  /// Close the form, discarding its contents
  pub fn hide(&mut self) {
    self.reset();
  }

  fn reset(&mut self) {
    self.active = false;
    self.editing_id = None;
    self.title.clear();
    self.description.clear();
    self.category = None;
    self.status = None;
    self.focus = Some(Field::Title);
    self.error = None;
    self.category_picker.hide();
    self.status_picker.hide();
  }

  /// Refresh the category choices, called as loaded pages come in
  pub fn update_categories(&mut self, categories: &[Category]) {
    self.options = categories
      .iter()
      .map(|c| (c.id.clone(), c.name.clone()))
      .collect();
  }

  /// Handle a key event
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<TaskFormEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    // Open pickers swallow everything first
    if self.category_picker.is_active() {
      if let KeyResult::Event(SelectEvent::Selected(id)) = self.category_picker.handle_key(key) {
        if let Some((_, name)) = self.options.iter().find(|(cid, _)| *cid == id) {
          self.category = Some((id, name.clone()));
          self.error = None;
        }
      }
      return KeyResult::Handled;
    }
    if self.status_picker.is_active() {
      if let KeyResult::Event(SelectEvent::Selected(id)) = self.status_picker.handle_key(key) {
        if let Some(status) = TaskStatus::from_param(&id) {
          self.status = Some(status);
        }
      }
      return KeyResult::Handled;
    }

    let focus = self.focus.unwrap_or(Field::Title);
    match focus {
      Field::Title | Field::Description => {
        let input = match focus {
          Field::Title => &mut self.title,
          _ => &mut self.description,
        };
        match input.handle_key(key) {
          InputResult::Submitted(_) => return self.try_submit(),
          InputResult::Cancelled => {
            self.hide();
            return KeyResult::Event(TaskFormEvent::Cancelled);
          }
          InputResult::Consumed => {
            self.error = None;
            return KeyResult::Handled;
          }
          InputResult::NotHandled => {}
        }
      }
      Field::Category | Field::Status => match key.code {
        KeyCode::Esc => {
          self.hide();
          return KeyResult::Event(TaskFormEvent::Cancelled);
        }
        KeyCode::Enter => {
          self.open_picker(focus);
          return KeyResult::Handled;
        }
        _ => {}
      },
    }

    // Focus movement shared by all fields
    match key.code {
      KeyCode::Tab | KeyCode::Down => {
        self.focus = Some(focus.next());
        KeyResult::Handled
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focus = Some(focus.previous());
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  fn open_picker(&mut self, field: Field) {
    match field {
      Field::Category => {
        if self.options.is_empty() {
          self.error = Some("create a category first".to_string());
          return;
        }
        let items = self
          .options
          .iter()
          .map(|(id, name)| SelectItem::new(id.clone(), name.clone()))
          .collect();
        let current = self.category.as_ref().map(|(id, _)| id.as_str());
        self.category_picker.show("Category", items, current);
      }
      Field::Status => {
        let items = TaskStatus::ALL
          .iter()
          .map(|s| SelectItem::new(s.as_param(), s.label()))
          .collect();
        let current = self.status.map(TaskStatus::as_param);
        self.status_picker.show("Status", items, current);
      }
      _ => {}
    }
  }

  fn try_submit(&mut self) -> KeyResult<TaskFormEvent> {
    let title = self.title.value().trim().to_string();
    if title.is_empty() {
      self.error = Some("title is required".to_string());
      return KeyResult::Handled;
    }
    let Some((category_id, _)) = self.category.clone() else {
      self.error = Some("category is required".to_string());
      return KeyResult::Handled;
    };

    let description = self.description.value().trim();
    let data = TaskFormData {
      id: self.editing_id.clone(),
      input: TaskInput {
        title,
        description: if description.is_empty() {
          None
        } else {
          Some(description.to_string())
        },
        category_id,
        status: self.status.unwrap_or(TaskStatus::Pending),
      },
    };
    self.hide();
    KeyResult::Event(TaskFormEvent::Submitted(data))
  }

  /// Render the form overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (area.width * 70 / 100).min(64).max(40);
    let height = 9;

    // Center the overlay
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    let overlay_area = Rect::new(x, y, width, height);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let title = if self.editing_id.is_some() {
      " Edit task "
    } else {
      " New task "
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

    let focus = self.focus.unwrap_or(Field::Title);
    let category_label = self
      .category
      .as_ref()
      .map(|(_, name)| name.clone())
      .unwrap_or_else(|| "(pick a category)".to_string());
    let status_label = self
      .status
      .unwrap_or(TaskStatus::Pending)
      .label()
      .to_string();

    let mut lines = vec![
      field_line("Title", self.title.value(), focus == Field::Title, true),
      field_line(
        "Description",
        self.description.value(),
        focus == Field::Description,
        true,
      ),
      field_line("Category", &category_label, focus == Field::Category, false),
      field_line("Status", &status_label, focus == Field::Status, false),
      Line::from(""),
    ];

    if let Some(error) = &self.error {
      lines.push(Line::from(Span::styled(
        error.clone(),
        Style::default().fg(Color::Red),
      )));
    } else {
      lines.push(Line::from(Span::styled(
        "<tab> next field  <enter> save  <esc> cancel",
        Style::default().fg(Color::DarkGray),
      )));
    }

    frame.render_widget(Paragraph::new(lines), inner);

    self.category_picker.render_overlay(frame, area);
    self.status_picker.render_overlay(frame, area);
  }
}

/// One labelled form row, cursor marker on the focused text field
fn field_line<'a>(label: &'a str, value: &'a str, focused: bool, text: bool) -> Line<'a> {
  let marker = if focused { "> " } else { "  " };
  let mut spans = vec![
    Span::styled(marker, Style::default().fg(Color::Cyan)),
    Span::styled(format!("{:<12}", label), Style::default().fg(Color::DarkGray)),
    Span::raw(value),
  ];
  if focused && text {
    spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
  }
  Line::from(spans)
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_str(form: &mut TaskForm, s: &str) {
    for c in s.chars() {
      form.handle_key(key(KeyCode::Char(c)));
    }
  }

  fn categories() -> Vec<Category> {
    vec![
      Category {
        id: "a1".to_string(),
        name: "Home".to_string(),
        updated_at: Utc::now(),
      },
      Category {
        id: "a2".to_string(),
        name: "Work".to_string(),
        updated_at: Utc::now(),
      },
    ]
  }

  fn sample_task() -> Task {
    Task {
      id: "t1".to_string(),
      title: "Fix the roof".to_string(),
      description: Some("before winter".to_string()),
      status: TaskStatus::InProgress,
      category_id: "a1".to_string(),
      category: Category {
        id: "a1".to_string(),
        name: "Home".to_string(),
        updated_at: Utc::now(),
      },
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  #[test]
  fn test_submit_requires_title() {
    let mut form = TaskForm::new();
    form.show_create();

    let result = form.handle_key(key(KeyCode::Enter));
    assert_eq!(result, KeyResult::Handled);
    assert!(form.is_active());
  }

  #[test]
  fn test_submit_requires_category() {
    let mut form = TaskForm::new();
    form.show_create();
    type_str(&mut form, "new task");

    let result = form.handle_key(key(KeyCode::Enter));
    assert_eq!(result, KeyResult::Handled);
    assert!(form.is_active());
  }

  #[test]
  fn test_create_flow() {
    let mut form = TaskForm::new();
    form.update_categories(&categories());
    form.show_create();

    type_str(&mut form, "paint fence");
    // Move to category field and pick the second option
    form.handle_key(key(KeyCode::Tab));
    form.handle_key(key(KeyCode::Tab));
    form.handle_key(key(KeyCode::Enter));
    form.handle_key(key(KeyCode::Char('j')));
    form.handle_key(key(KeyCode::Enter));

    // Back to the title field and submit
    form.handle_key(key(KeyCode::Tab));
    form.handle_key(key(KeyCode::Tab));
    let result = form.handle_key(key(KeyCode::Enter));

    match result {
      KeyResult::Event(TaskFormEvent::Submitted(data)) => {
        assert_eq!(data.id, None);
        assert_eq!(data.input.title, "paint fence");
        assert_eq!(data.input.description, None);
        assert_eq!(data.input.category_id, "a2");
        assert_eq!(data.input.status, TaskStatus::Pending);
      }
      other => panic!("expected submit, got {:?}", other),
    }
    assert!(!form.is_active());
  }

  #[test]
  fn test_edit_prefills_and_keeps_id() {
    let mut form = TaskForm::new();
    form.update_categories(&categories());
    form.show_edit(&sample_task());

    let result = form.handle_key(key(KeyCode::Enter));
    match result {
      KeyResult::Event(TaskFormEvent::Submitted(data)) => {
        assert_eq!(data.id, Some("t1".to_string()));
        assert_eq!(data.input.title, "Fix the roof");
        assert_eq!(data.input.description, Some("before winter".to_string()));
        assert_eq!(data.input.category_id, "a1");
        assert_eq!(data.input.status, TaskStatus::InProgress);
      }
      other => panic!("expected submit, got {:?}", other),
    }
  }

  #[test]
  fn test_tab_moves_between_text_fields() {
    let mut form = TaskForm::new();
    form.update_categories(&categories());
    form.show_create();

    type_str(&mut form, "title text");
    form.handle_key(key(KeyCode::Tab));
    type_str(&mut form, "desc text");

    form.handle_key(key(KeyCode::BackTab));
    form.handle_key(key(KeyCode::Backspace));

    // Pick a category so submit goes through
    form.handle_key(key(KeyCode::Tab));
    form.handle_key(key(KeyCode::Tab));
    form.handle_key(key(KeyCode::Enter));
    form.handle_key(key(KeyCode::Enter));

    form.handle_key(key(KeyCode::Tab));
    form.handle_key(key(KeyCode::Tab));
    let result = form.handle_key(key(KeyCode::Enter));
    match result {
      KeyResult::Event(TaskFormEvent::Submitted(data)) => {
        assert_eq!(data.input.title, "title tex");
        assert_eq!(data.input.description, Some("desc text".to_string()));
      }
      other => panic!("expected submit, got {:?}", other),
    }
  }

  #[test]
  fn test_status_picker_updates_status() {
    let mut form = TaskForm::new();
    form.update_categories(&categories());
    form.show_edit(&sample_task());

    // Move to the status field, pick "done"
    form.handle_key(key(KeyCode::BackTab));
    form.handle_key(key(KeyCode::Enter));
    form.handle_key(key(KeyCode::Char('j')));
    form.handle_key(key(KeyCode::Enter));

    form.handle_key(key(KeyCode::Tab));
    let result = form.handle_key(key(KeyCode::Enter));
    match result {
      KeyResult::Event(TaskFormEvent::Submitted(data)) => {
        assert_eq!(data.input.status, TaskStatus::Done);
      }
      other => panic!("expected submit, got {:?}", other),
    }
  }

  #[test]
  fn test_esc_cancels() {
    let mut form = TaskForm::new();
    form.show_create();
    type_str(&mut form, "half typed");

    let result = form.handle_key(key(KeyCode::Esc));
    assert_eq!(result, KeyResult::Event(TaskFormEvent::Cancelled));
    assert!(!form.is_active());
  }

  #[test]
  fn test_category_picker_needs_options() {
    let mut form = TaskForm::new();
    form.show_create();

    form.handle_key(key(KeyCode::Tab));
    form.handle_key(key(KeyCode::Tab));
    let result = form.handle_key(key(KeyCode::Enter));
    assert_eq!(result, KeyResult::Handled);
    assert!(form.is_active());
  }

  #[test]
  fn test_inactive_ignores_keys() {
    let mut form = TaskForm::new();
    let result = form.handle_key(key(KeyCode::Char('a')));
    assert_eq!(result, KeyResult::NotHandled);
  }
}
