use crate::api::types::Task;
use crate::ui::renderfns::{format_timestamp, status_color, truncate};
use crate::ui::view::{View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Read-only detail view for one task.
///
/// Rendered from the list row the user selected; there is no separate
/// detail fetch, so the data is exactly as fresh as the list it came from.
pub struct TaskDetailView {
  task: Task,
}

impl TaskDetailView {
  pub fn new(task: Task) -> Self {
    Self { task }
  }

  fn render_detail(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" {} ", truncate(&self.task.title, 60)))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(3), // Header (title, category, status, dates)
        Constraint::Length(1), // Separator
        Constraint::Min(1),    // Description
      ])
      .split(inner);

    let header = vec![
      Line::from(vec![
        Span::styled("Title: ", Style::default().fg(Color::DarkGray)),
        Span::raw(&self.task.title),
      ]),
      Line::from(vec![
        Span::styled("Category: ", Style::default().fg(Color::DarkGray)),
        Span::raw(&self.task.category.name),
        Span::raw("  "),
        Span::styled("Status: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
          self.task.status.label(),
          Style::default().fg(status_color(self.task.status)),
        ),
      ]),
      Line::from(vec![
        Span::styled("Created: ", Style::default().fg(Color::DarkGray)),
        Span::raw(format_timestamp(&self.task.created_at)),
        Span::raw("  "),
        Span::styled("Updated: ", Style::default().fg(Color::DarkGray)),
        Span::raw(format_timestamp(&self.task.updated_at)),
      ]),
    ];
    frame.render_widget(Paragraph::new(header), chunks[0]);

    let sep = Paragraph::new("─".repeat(chunks[1].width as usize))
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(sep, chunks[1]);

    let desc = self.task.description.as_deref().unwrap_or("No description");
    let desc_para = Paragraph::new(desc).wrap(Wrap { trim: true });
    frame.render_widget(desc_para, chunks[2]);
  }
}

impl View for TaskDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_detail(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    truncate(&self.task.title, 20)
  }
}
