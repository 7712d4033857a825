use crate::api::tasks::{TaskFilter, TaskSortColumn};
use crate::api::types::{Category, Page, SortOrder, Task, TaskStatus, PER_PAGE_OPTIONS};
use crate::queries::Queries;
use crate::query::{Mutation, QuerySnapshot, QueryStatus};
use crate::ui::components::{
  Confirm, ConfirmEvent, KeyResult, SearchEvent, SearchInput, SelectEvent, SelectItem,
  SelectOverlay, TaskForm, TaskFormEvent, Toasts,
};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{format_timestamp, status_color, truncate};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::TaskDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

/// Paginated task table with search, filters, and inline CRUD.
pub struct TasksView {
  queries: Queries,
  toasts: Toasts,
  filter: TaskFilter,
  snapshot: QuerySnapshot<Page<Task>>,
  table_state: TableState,
  options: Vec<Category>,
  search: SearchInput,
  form: TaskForm,
  confirm: Confirm,
  category_picker: SelectOverlay,
  status_picker: SelectOverlay,
  sort_picker: SelectOverlay,
  per_page_picker: SelectOverlay,
  pending_delete: Option<String>,
  save: Mutation<Task>,
  save_msg: &'static str,
  delete: Mutation<()>,
}

impl TasksView {
  pub fn new(queries: Queries, toasts: Toasts, per_page: u32) -> Self {
    let filter = TaskFilter::with_per_page(per_page);
    // Start fetching immediately
    let snapshot = queries.tasks(&filter);

    Self {
      queries,
      toasts,
      filter,
      snapshot,
      table_state: TableState::default(),
      options: Vec::new(),
      search: SearchInput::new(),
      form: TaskForm::new(),
      confirm: Confirm::new(),
      category_picker: SelectOverlay::new(),
      status_picker: SelectOverlay::new(),
      sort_picker: SelectOverlay::new(),
      per_page_picker: SelectOverlay::new(),
      pending_delete: None,
      save: Mutation::idle(),
      save_msg: "",
      delete: Mutation::idle(),
    }
  }

  fn refresh(&mut self) {
    self.snapshot = self.queries.tasks(&self.filter);
  }

  fn tasks(&self) -> &[Task] {
    self
      .snapshot
      .data()
      .map(|page| page.data.as_slice())
      .unwrap_or(&[])
  }

  fn selected_task(&self) -> Option<Task> {
    self
      .table_state
      .selected()
      .and_then(|idx| self.tasks().get(idx))
      .cloned()
  }

  fn handle_overlays(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match self.form.handle_key(key) {
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::Event(TaskFormEvent::Submitted(data)) => {
        match data.id {
          Some(id) => {
            self.save = self.queries.update_task(id, data.input);
            self.save_msg = "task updated";
          }
          None => {
            self.save = self.queries.create_task(data.input);
            self.save_msg = "task created";
          }
        }
        return Some(ViewAction::None);
      }
      KeyResult::Event(TaskFormEvent::Cancelled) => return Some(ViewAction::None),
      KeyResult::NotHandled => {}
    }

    match self.confirm.handle_key(key) {
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::Event(ConfirmEvent::Confirmed) => {
        if let Some(id) = self.pending_delete.take() {
          self.delete = self.queries.delete_task(id);
        }
        return Some(ViewAction::None);
      }
      KeyResult::Event(ConfirmEvent::Cancelled) => {
        self.pending_delete = None;
        return Some(ViewAction::None);
      }
      KeyResult::NotHandled => {}
    }

    match self.category_picker.handle_key(key) {
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::Event(SelectEvent::Selected(id)) => {
        let category = if id.is_empty() { None } else { Some(id) };
        self.filter.set_category(category);
        self.refresh();
        return Some(ViewAction::None);
      }
      KeyResult::Event(SelectEvent::Cancelled) => return Some(ViewAction::None),
      KeyResult::NotHandled => {}
    }

    match self.status_picker.handle_key(key) {
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::Event(SelectEvent::Selected(id)) => {
        self.filter.set_status(TaskStatus::from_param(&id));
        self.refresh();
        return Some(ViewAction::None);
      }
      KeyResult::Event(SelectEvent::Cancelled) => return Some(ViewAction::None),
      KeyResult::NotHandled => {}
    }

    match self.sort_picker.handle_key(key) {
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::Event(SelectEvent::Selected(id)) => {
        if let Some((column, order)) = parse_sort(&id) {
          self.filter.set_sort(column, order);
          self.refresh();
        }
        return Some(ViewAction::None);
      }
      KeyResult::Event(SelectEvent::Cancelled) => return Some(ViewAction::None),
      KeyResult::NotHandled => {}
    }

    match self.per_page_picker.handle_key(key) {
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::Event(SelectEvent::Selected(id)) => {
        if let Ok(per_page) = id.parse() {
          self.filter.set_per_page(per_page);
          self.refresh();
        }
        return Some(ViewAction::None);
      }
      KeyResult::Event(SelectEvent::Cancelled) => return Some(ViewAction::None),
      KeyResult::NotHandled => {}
    }

    match self.search.handle_key(key) {
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::Event(SearchEvent::Changed(query)) => {
        self.filter.set_title(query);
        self.refresh();
        return Some(ViewAction::None);
      }
      KeyResult::Event(SearchEvent::Submitted) => return Some(ViewAction::None),
      KeyResult::NotHandled => {}
    }

    None
  }

  fn handle_navigation(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.table_state.select_next();
        Some(ViewAction::None)
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.table_state.select_previous();
        Some(ViewAction::None)
      }
      KeyCode::Char('h') | KeyCode::Left => {
        if let Some(page) = self.snapshot.data() {
          self.filter.previous_page(&page.meta);
          self.refresh();
        }
        Some(ViewAction::None)
      }
      KeyCode::Char('l') | KeyCode::Right => {
        if let Some(page) = self.snapshot.data() {
          self.filter.next_page(&page.meta);
          self.refresh();
        }
        Some(ViewAction::None)
      }
      _ => None,
    }
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('a') => {
        self.form.update_categories(&self.options);
        self.form.show_create();
        Some(ViewAction::None)
      }
      KeyCode::Char('e') => {
        if let Some(task) = self.selected_task() {
          self.form.update_categories(&self.options);
          self.form.show_edit(&task);
        }
        Some(ViewAction::None)
      }
      KeyCode::Char('d') => {
        if let Some(task) = self.selected_task() {
          self.pending_delete = Some(task.id.clone());
          self
            .confirm
            .show(format!("Delete task '{}'?", truncate(&task.title, 30)));
        }
        Some(ViewAction::None)
      }
      KeyCode::Char('r') => {
        self.queries.invalidate_tasks();
        self.refresh();
        Some(ViewAction::None)
      }
      KeyCode::Char('f') => {
        self.open_category_picker();
        Some(ViewAction::None)
      }
      KeyCode::Char('s') => {
        self.open_status_picker();
        Some(ViewAction::None)
      }
      KeyCode::Char('o') => {
        self.open_sort_picker();
        Some(ViewAction::None)
      }
      KeyCode::Char('p') => {
        self.open_per_page_picker();
        Some(ViewAction::None)
      }
      KeyCode::Enter => {
        if let Some(task) = self.selected_task() {
          return Some(ViewAction::Push(Box::new(TaskDetailView::new(task))));
        }
        Some(ViewAction::None)
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }

  fn open_category_picker(&mut self) {
    let mut items = vec![SelectItem::new("", "All categories")];
    items.extend(
      self
        .options
        .iter()
        .map(|c| SelectItem::new(c.id.clone(), c.name.clone())),
    );
    let current = self.filter.category_id.clone().unwrap_or_default();
    self
      .category_picker
      .show("Filter by category", items, Some(&current));
  }

  fn open_status_picker(&mut self) {
    let mut items = vec![SelectItem::new("", "All statuses")];
    items.extend(
      TaskStatus::ALL
        .iter()
        .map(|s| SelectItem::new(s.as_param(), s.label())),
    );
    let current = self.filter.status.map(TaskStatus::as_param).unwrap_or("");
    self
      .status_picker
      .show("Filter by status", items, Some(current));
  }

  fn open_sort_picker(&mut self) {
    let mut items = Vec::new();
    for column in TaskSortColumn::ALL {
      for order in [SortOrder::Asc, SortOrder::Desc] {
        items.push(SelectItem::new(
          format!("{}-{}", column.as_param(), order.as_param()),
          format!("{} {}", column.label(), order.label()),
        ));
      }
    }
    let current = format!(
      "{}-{}",
      self.filter.column.as_param(),
      self.filter.order.as_param()
    );
    self.sort_picker.show("Sort by", items, Some(&current));
  }

  fn open_per_page_picker(&mut self) {
    let items = PER_PAGE_OPTIONS
      .iter()
      .map(|n| SelectItem::new(n.to_string(), format!("{} per page", n)))
      .collect();
    let current = self.filter.per_page.to_string();
    self.per_page_picker.show("Page size", items, Some(&current));
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.tasks().len();
    ensure_valid_selection(&mut self.table_state, len);

    let search_indicator = if self.filter.title.is_empty() {
      String::new()
    } else {
      format!(" [/{}]", self.filter.title)
    };

    let title = match &self.snapshot.status {
      QueryStatus::Loading => " Tasks (loading...) ".to_string(),
      QueryStatus::Error(e) => format!(" Tasks (error: {}) ", e),
      _ => {
        let total = self.snapshot.data().map(|p| p.meta.total).unwrap_or(0);
        format!(" Tasks ({}){} ", total, search_indicator)
      }
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.tasks().is_empty() && !self.snapshot.is_loading() {
      let content = if self.snapshot.is_error() {
        "Failed to load tasks. Press 'r' to retry."
      } else {
        "No tasks found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let header = Row::new(["Title", "Category", "Status", "Updated"])
      .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = self
      .tasks()
      .iter()
      .map(|task| {
        Row::new(vec![
          Cell::from(truncate(&task.title, 60)),
          Cell::from(Span::styled(
            truncate(&task.category.name, 14),
            Style::default().fg(Color::Cyan),
          )),
          Cell::from(Span::styled(
            task.status.label(),
            Style::default().fg(status_color(task.status)),
          )),
          Cell::from(format_timestamp(&task.updated_at)),
        ])
      })
      .collect();

    let widths = [
      Constraint::Min(20),
      Constraint::Length(16),
      Constraint::Length(12),
      Constraint::Length(17),
    ];
    let table = Table::new(rows, widths)
      .header(header)
      .block(block)
      .row_highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.table_state);
  }

  fn render_status_line(&self, frame: &mut Frame, area: Rect) {
    let Some(page) = self.snapshot.data() else {
      return;
    };
    let meta = &page.meta;
    let pages = page_count(meta.total, self.filter.per_page);

    let mut parts = vec![
      format!("page {}/{}", meta.current_page, pages),
      format!("{} per page", self.filter.per_page),
      format!(
        "sort {} {}",
        self.filter.column.label(),
        self.filter.order.label()
      ),
    ];
    if let Some(category_id) = &self.filter.category_id {
      let name = self
        .options
        .iter()
        .find(|c| &c.id == category_id)
        .map(|c| c.name.as_str())
        .unwrap_or("?");
      parts.push(format!("category {}", name));
    }
    if let Some(status) = self.filter.status {
      parts.push(format!("status {}", status.label()));
    }

    let line = Paragraph::new(parts.join(" | ")).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(line, area);
  }
}

impl View for TasksView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let Some(action) = self.handle_overlays(key) {
      return action;
    }
    if let Some(action) = self.handle_navigation(key) {
      return action;
    }
    if let Some(action) = self.handle_actions(key) {
      return action;
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(3), Constraint::Length(1)])
      .split(area);

    self.render_table(frame, chunks[0]);
    self.render_status_line(frame, chunks[1]);

    self.search.render_overlay(frame, area, "Search tasks");
    self.category_picker.render_overlay(frame, area);
    self.status_picker.render_overlay(frame, area);
    self.sort_picker.render_overlay(frame, area);
    self.per_page_picker.render_overlay(frame, area);
    self.form.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Tasks".to_string()
  }

  fn capturing_input(&self) -> bool {
    self.search.is_active()
      || self.form.is_active()
      || self.confirm.is_active()
      || self.category_picker.is_active()
      || self.status_picker.is_active()
      || self.sort_picker.is_active()
      || self.per_page_picker.is_active()
  }

  fn tick(&mut self) {
    self.refresh();

    // Keep category choices warm for the form and the filter picker
    let options = self.queries.category_options();
    if let Some(page) = options.data() {
      if self.options != page.data {
        self.options = page.data.clone();
      }
    }
    self.form.update_categories(&self.options);

    if let Some(outcome) = self.save.poll() {
      match outcome {
        Ok(_) => self.toasts.success(self.save_msg),
        Err(e) => self.toasts.error(e.to_string()),
      }
    }
    if let Some(outcome) = self.delete.poll() {
      match outcome {
        Ok(()) => self.toasts.success("task deleted"),
        Err(e) => self.toasts.error(e.to_string()),
      }
    }
  }
}

fn parse_sort(id: &str) -> Option<(TaskSortColumn, SortOrder)> {
  let (column, order) = id.rsplit_once('-')?;
  Some((
    TaskSortColumn::from_param(column)?,
    SortOrder::from_param(order)?,
  ))
}

fn page_count(total: u64, per_page: u32) -> u64 {
  (total.max(1) + per_page as u64 - 1) / per_page as u64
}
