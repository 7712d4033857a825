use serde::Serialize;

use super::client::ApiClient;
use super::error::ApiError;
use super::types::{Page, PageMeta, SortOrder, Task, TaskStatus};

/// Column a task list can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskSortColumn {
  Title,
  UpdatedAt,
}

impl TaskSortColumn {
  pub const ALL: [TaskSortColumn; 2] = [TaskSortColumn::Title, TaskSortColumn::UpdatedAt];

  pub fn as_param(self) -> &'static str {
    match self {
      TaskSortColumn::Title => "title",
      TaskSortColumn::UpdatedAt => "updated_at",
    }
  }

  pub fn from_param(s: &str) -> Option<TaskSortColumn> {
    match s {
      "title" => Some(TaskSortColumn::Title),
      "updated_at" => Some(TaskSortColumn::UpdatedAt),
      _ => None,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      TaskSortColumn::Title => "title",
      TaskSortColumn::UpdatedAt => "updated",
    }
  }
}

/// Complete description of one task list request.
///
/// Doubles as the cache key: two filters with equal values address the same
/// cache entry. Every mutator that changes what the list *contains* resets
/// the page back to 1 so a shrunken result set cannot leave the view staring
/// at a page past the end.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskFilter {
  pub page: u32,
  pub per_page: u32,
  pub title: String,
  pub category_id: Option<String>,
  pub status: Option<TaskStatus>,
  pub column: TaskSortColumn,
  pub order: SortOrder,
}

impl Default for TaskFilter {
  fn default() -> Self {
    Self {
      page: 1,
      per_page: 5,
      title: String::new(),
      category_id: None,
      status: None,
      column: TaskSortColumn::UpdatedAt,
      order: SortOrder::Desc,
    }
  }
}

impl TaskFilter {
  pub fn with_per_page(per_page: u32) -> Self {
    Self {
      per_page,
      ..Self::default()
    }
  }

  pub fn set_title(&mut self, title: String) {
    if self.title != title {
      self.title = title;
      self.page = 1;
    }
  }

  pub fn set_category(&mut self, category_id: Option<String>) {
    if self.category_id != category_id {
      self.category_id = category_id;
      self.page = 1;
    }
  }

  pub fn set_status(&mut self, status: Option<TaskStatus>) {
    if self.status != status {
      self.status = status;
      self.page = 1;
    }
  }

  pub fn set_sort(&mut self, column: TaskSortColumn, order: SortOrder) {
    if self.column != column || self.order != order {
      self.column = column;
      self.order = order;
      self.page = 1;
    }
  }

  pub fn set_per_page(&mut self, per_page: u32) {
    if self.per_page != per_page {
      self.per_page = per_page;
      self.page = 1;
    }
  }

  /// Advance to the next page, trusting the server-reported meta.
  pub fn next_page(&mut self, meta: &PageMeta) {
    if !meta.is_last_page {
      self.page = meta.next_page;
    }
  }

  pub fn previous_page(&mut self, meta: &PageMeta) {
    if !meta.is_first_page {
      self.page = meta.previous_page;
    }
  }

  /// Serialize into query-string pairs. Empty search text and unset filters
  /// are omitted entirely rather than sent as empty values.
  pub fn query_pairs(&self) -> Vec<(String, String)> {
    let mut pairs = vec![
      ("page".to_string(), self.page.to_string()),
      ("column".to_string(), self.column.as_param().to_string()),
      ("order".to_string(), self.order.as_param().to_string()),
      ("per_page".to_string(), self.per_page.to_string()),
    ];

    if !self.title.is_empty() {
      pairs.push(("title".to_string(), self.title.clone()));
    }
    if let Some(category_id) = &self.category_id {
      pairs.push(("category_id".to_string(), category_id.clone()));
    }
    if let Some(status) = self.status {
      pairs.push(("status".to_string(), status.as_param().to_string()));
    }

    pairs
  }
}

/// Payload for creating or updating a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskInput {
  pub title: String,
  pub description: Option<String>,
  pub category_id: String,
  pub status: TaskStatus,
}

pub async fn list(api: &ApiClient, filter: &TaskFilter) -> Result<Page<Task>, ApiError> {
  api.get_json("api/tasks", &filter.query_pairs()).await
}

pub async fn create(api: &ApiClient, input: &TaskInput) -> Result<Task, ApiError> {
  api.post_json("api/tasks", input).await
}

pub async fn update(api: &ApiClient, id: &str, input: &TaskInput) -> Result<Task, ApiError> {
  api.patch_json(&format!("api/tasks/{}", id), input).await
}

pub async fn delete(api: &ApiClient, id: &str) -> Result<(), ApiError> {
  api.delete(&format!("api/tasks/{}", id)).await
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pair(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs
      .iter()
      .find(|(k, _)| k == key)
      .map(|(_, v)| v.clone())
  }

  #[test]
  fn test_default_query_pairs() {
    let filter = TaskFilter::default();
    let pairs = filter.query_pairs();

    assert_eq!(pair(&pairs, "page"), Some("1".to_string()));
    assert_eq!(pair(&pairs, "column"), Some("updated_at".to_string()));
    assert_eq!(pair(&pairs, "order"), Some("desc".to_string()));
    assert_eq!(pair(&pairs, "per_page"), Some("5".to_string()));

    // Unset filters are omitted
    assert_eq!(pair(&pairs, "title"), None);
    assert_eq!(pair(&pairs, "category_id"), None);
    assert_eq!(pair(&pairs, "status"), None);
  }

  #[test]
  fn test_full_query_pairs() {
    let mut filter = TaskFilter::default();
    filter.set_title("roof".to_string());
    filter.set_category(Some("a1".to_string()));
    filter.set_status(Some(TaskStatus::InProgress));
    filter.set_sort(TaskSortColumn::Title, SortOrder::Asc);

    let pairs = filter.query_pairs();
    assert_eq!(pair(&pairs, "title"), Some("roof".to_string()));
    assert_eq!(pair(&pairs, "category_id"), Some("a1".to_string()));
    assert_eq!(pair(&pairs, "status"), Some("in_progress".to_string()));
    assert_eq!(pair(&pairs, "column"), Some("title".to_string()));
    assert_eq!(pair(&pairs, "order"), Some("asc".to_string()));
  }

  #[test]
  fn test_search_resets_page() {
    let mut filter = TaskFilter::default();
    filter.page = 3;

    filter.set_title("roof".to_string());
    assert_eq!(filter.page, 1);

    // Same value does not count as a change
    filter.page = 3;
    filter.set_title("roof".to_string());
    assert_eq!(filter.page, 3);
  }

  #[test]
  fn test_filter_changes_reset_page() {
    let mut filter = TaskFilter::default();

    filter.page = 4;
    filter.set_category(Some("a1".to_string()));
    assert_eq!(filter.page, 1);

    filter.page = 4;
    filter.set_status(Some(TaskStatus::Done));
    assert_eq!(filter.page, 1);

    filter.page = 4;
    filter.set_sort(TaskSortColumn::Title, SortOrder::Asc);
    assert_eq!(filter.page, 1);

    filter.page = 4;
    filter.set_per_page(10);
    assert_eq!(filter.page, 1);
  }

  #[test]
  fn test_changed_filters_are_distinct_keys() {
    let a = TaskFilter::default();
    let mut b = a.clone();
    assert_eq!(a, b);

    b.set_title("roof".to_string());
    assert_ne!(a, b);
  }

  #[test]
  fn test_paging_respects_meta() {
    let mut filter = TaskFilter::default();
    let meta = PageMeta {
      total: 12,
      is_first_page: true,
      is_last_page: false,
      current_page: 1,
      next_page: 2,
      previous_page: 0,
    };

    // First page stays put going backwards
    filter.previous_page(&meta);
    assert_eq!(filter.page, 1);

    filter.next_page(&meta);
    assert_eq!(filter.page, 2);

    let last = PageMeta {
      total: 12,
      is_first_page: false,
      is_last_page: true,
      current_page: 3,
      next_page: 4,
      previous_page: 2,
    };
    filter.page = 3;
    filter.next_page(&last);
    assert_eq!(filter.page, 3);

    filter.previous_page(&last);
    assert_eq!(filter.page, 2);
  }
}
