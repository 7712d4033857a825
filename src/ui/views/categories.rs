use crate::api::categories::{CategoryFilter, CategorySortColumn};
use crate::api::types::{Category, Page, SortOrder, PER_PAGE_OPTIONS};
use crate::queries::Queries;
use crate::query::{Mutation, QuerySnapshot, QueryStatus};
use crate::ui::components::{
  CategoryForm, CategoryFormEvent, Confirm, ConfirmEvent, KeyResult, SearchEvent, SearchInput,
  SelectEvent, SelectItem, SelectOverlay, Toasts,
};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{format_timestamp, truncate};
use crate::ui::view::{View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

/// Paginated category table with search and inline CRUD.
pub struct CategoriesView {
  queries: Queries,
  toasts: Toasts,
  filter: CategoryFilter,
  snapshot: QuerySnapshot<Page<Category>>,
  table_state: TableState,
  search: SearchInput,
  form: CategoryForm,
  confirm: Confirm,
  sort_picker: SelectOverlay,
  per_page_picker: SelectOverlay,
  pending_delete: Option<String>,
  save: Mutation<Category>,
  save_msg: &'static str,
  delete: Mutation<()>,
}

impl CategoriesView {
  pub fn new(queries: Queries, toasts: Toasts, per_page: u32) -> Self {
    let filter = CategoryFilter::with_per_page(per_page);
    // Start fetching immediately
    let snapshot = queries.categories(&filter);

    Self {
      queries,
      toasts,
      filter,
      snapshot,
      table_state: TableState::default(),
      search: SearchInput::new(),
      form: CategoryForm::new(),
      confirm: Confirm::new(),
      sort_picker: SelectOverlay::new(),
      per_page_picker: SelectOverlay::new(),
      pending_delete: None,
      save: Mutation::idle(),
      save_msg: "",
      delete: Mutation::idle(),
    }
  }

  fn refresh(&mut self) {
    self.snapshot = self.queries.categories(&self.filter);
  }

  fn categories(&self) -> &[Category] {
    self
      .snapshot
      .data()
      .map(|page| page.data.as_slice())
      .unwrap_or(&[])
  }

  fn selected_category(&self) -> Option<Category> {
    self
      .table_state
      .selected()
      .and_then(|idx| self.categories().get(idx))
      .cloned()
  }

  fn handle_overlays(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match self.form.handle_key(key) {
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::Event(CategoryFormEvent::Submitted(data)) => {
        match data.id {
          Some(id) => {
            self.save = self.queries.update_category(id, data.input);
            self.save_msg = "category updated";
          }
          None => {
            self.save = self.queries.create_category(data.input);
            self.save_msg = "category created";
          }
        }
        return Some(ViewAction::None);
      }
      KeyResult::Event(CategoryFormEvent::Cancelled) => return Some(ViewAction::None),
      KeyResult::NotHandled => {}
    }

    match self.confirm.handle_key(key) {
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::Event(ConfirmEvent::Confirmed) => {
        if let Some(id) = self.pending_delete.take() {
          self.delete = self.queries.delete_category(id);
        }
        return Some(ViewAction::None);
      }
      KeyResult::Event(ConfirmEvent::Cancelled) => {
        self.pending_delete = None;
        return Some(ViewAction::None);
      }
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
        self.filter.set_name(query);
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
        self.form.show_create();
        Some(ViewAction::None)
      }
      KeyCode::Char('e') => {
        if let Some(category) = self.selected_category() {
          self.form.show_edit(&category);
        }
        Some(ViewAction::None)
      }
      KeyCode::Char('d') => {
        if let Some(category) = self.selected_category() {
          self.pending_delete = Some(category.id.clone());
          self.confirm.show(format!(
            "Delete category '{}'?",
            truncate(&category.name, 30)
          ));
        }
        Some(ViewAction::None)
      }
      KeyCode::Char('r') => {
        self.queries.invalidate_categories();
        self.refresh();
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
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }

  fn open_sort_picker(&mut self) {
    let mut items = Vec::new();
    for column in CategorySortColumn::ALL {
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
    let len = self.categories().len();
    ensure_valid_selection(&mut self.table_state, len);

    let search_indicator = if self.filter.name.is_empty() {
      String::new()
    } else {
      format!(" [/{}]", self.filter.name)
    };

    let title = match &self.snapshot.status {
      QueryStatus::Loading => " Categories (loading...) ".to_string(),
      QueryStatus::Error(e) => format!(" Categories (error: {}) ", e),
      _ => {
        let total = self.snapshot.data().map(|p| p.meta.total).unwrap_or(0);
        format!(" Categories ({}){} ", total, search_indicator)
      }
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.categories().is_empty() && !self.snapshot.is_loading() {
      let content = if self.snapshot.is_error() {
        "Failed to load categories. Press 'r' to retry."
      } else {
        "No categories found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let header =
      Row::new(["Name", "Updated"]).style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = self
      .categories()
      .iter()
      .map(|category| {
        Row::new(vec![
          Cell::from(Span::styled(
            truncate(&category.name, 40),
            Style::default().fg(Color::Cyan),
          )),
          Cell::from(format_timestamp(&category.updated_at)),
        ])
      })
      .collect();

    let widths = [Constraint::Min(20), Constraint::Length(17)];
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

    let parts = vec![
      format!("page {}/{}", meta.current_page, pages),
      format!("{} per page", self.filter.per_page),
      format!(
        "sort {} {}",
        self.filter.column.label(),
        self.filter.order.label()
      ),
    ];

    let line = Paragraph::new(parts.join(" | ")).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(line, area);
  }
}

impl View for CategoriesView {
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

    self.search.render_overlay(frame, area, "Search categories");
    self.sort_picker.render_overlay(frame, area);
    self.per_page_picker.render_overlay(frame, area);
    self.form.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Categories".to_string()
  }

  fn capturing_input(&self) -> bool {
    self.search.is_active()
      || self.form.is_active()
      || self.confirm.is_active()
      || self.sort_picker.is_active()
      || self.per_page_picker.is_active()
  }

  fn tick(&mut self) {
    self.refresh();

    if let Some(outcome) = self.save.poll() {
      match outcome {
        Ok(_) => self.toasts.success(self.save_msg),
        Err(e) => self.toasts.error(e.to_string()),
      }
    }
    if let Some(outcome) = self.delete.poll() {
      match outcome {
        Ok(()) => self.toasts.success("category deleted"),
        Err(e) => self.toasts.error(e.to_string()),
      }
    }
  }
}

fn parse_sort(id: &str) -> Option<(CategorySortColumn, SortOrder)> {
  let (column, order) = id.rsplit_once('-')?;
  Some((
    CategorySortColumn::from_param(column)?,
    SortOrder::from_param(order)?,
  ))
}

fn page_count(total: u64, per_page: u32) -> u64 {
  (total.max(1) + per_page as u64 - 1) / per_page as u64
}
