use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated user profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id: String,
  pub name: String,
  pub email: String,
}

/// Session returned by the login endpoint and persisted across runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub access_token: String,
  pub user: User,
}

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
  Pending,
  InProgress,
  Done,
}

impl TaskStatus {
  pub const ALL: [TaskStatus; 3] = [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Done];

  /// Wire value used in query params and payloads
  pub fn as_param(self) -> &'static str {
    match self {
      TaskStatus::Pending => "pending",
      TaskStatus::InProgress => "in_progress",
      TaskStatus::Done => "done",
    }
  }

  pub fn from_param(s: &str) -> Option<TaskStatus> {
    match s {
      "pending" => Some(TaskStatus::Pending),
      "in_progress" => Some(TaskStatus::InProgress),
      "done" => Some(TaskStatus::Done),
      _ => None,
    }
  }

  /// Human-readable label for tables and pickers
  pub fn label(self) -> &'static str {
    match self {
      TaskStatus::Pending => "pending",
      TaskStatus::InProgress => "in progress",
      TaskStatus::Done => "done",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
  pub id: String,
  pub title: String,
  pub description: Option<String>,
  pub status: TaskStatus,
  pub category_id: String,
  pub category: Category,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
  pub id: String,
  pub name: String,
  pub updated_at: DateTime<Utc>,
}

/// Ascending/descending sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
  Asc,
  Desc,
}

impl SortOrder {
  pub fn as_param(self) -> &'static str {
    match self {
      SortOrder::Asc => "asc",
      SortOrder::Desc => "desc",
    }
  }

  pub fn from_param(s: &str) -> Option<SortOrder> {
    match s {
      "asc" => Some(SortOrder::Asc),
      "desc" => Some(SortOrder::Desc),
      _ => None,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      SortOrder::Asc => "asc",
      SortOrder::Desc => "desc",
    }
  }
}

/// Page sizes offered by the per-page picker
pub const PER_PAGE_OPTIONS: [u32; 5] = [5, 10, 15, 20, 25];

/// Pagination metadata reported alongside each list page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
  pub total: u64,
  pub is_first_page: bool,
  pub is_last_page: bool,
  pub current_page: u32,
  pub next_page: u32,
  pub previous_page: u32,
}

/// One page of a list endpoint's results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
  pub data: Vec<T>,
  pub meta: PageMeta,
}

impl<T> Page<T> {
  /// Sanity checks the server-reported meta against the page contents.
  /// The server is authoritative; this exists for tests and debugging.
  #[allow(dead_code)]
  pub fn meta_consistent(&self, per_page: u32) -> bool {
    self.data.len() <= per_page as usize
      && self.meta.is_first_page == (self.meta.current_page == 1)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_status_wire_format() {
    let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
    assert_eq!(json, r#""in_progress""#);

    let status: TaskStatus = serde_json::from_str(r#""pending""#).unwrap();
    assert_eq!(status, TaskStatus::Pending);
  }

  #[test]
  fn test_status_params() {
    assert_eq!(TaskStatus::from_param("in_progress"), Some(TaskStatus::InProgress));
    assert_eq!(TaskStatus::from_param("bogus"), None);
    for status in TaskStatus::ALL {
      assert_eq!(TaskStatus::from_param(status.as_param()), Some(status));
    }
  }

  #[test]
  fn test_deserialize_task() {
    let json = r#"{
      "id": "b3c1",
      "title": "Fix the roof",
      "description": null,
      "status": "pending",
      "category_id": "a1",
      "category": {"id": "a1", "name": "Home", "updated_at": "2023-05-01T10:00:00.000000Z"},
      "created_at": "2023-05-01T10:00:00.000000Z",
      "updated_at": "2023-05-02T12:30:00.000000Z"
    }"#;

    let task: Task = serde_json::from_str(json).unwrap();
    assert_eq!(task.title, "Fix the roof");
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.category.name, "Home");
    assert!(task.description.is_none());
  }

  #[test]
  fn test_meta_consistency() {
    let mut page: Page<u32> = Page {
      data: vec![1, 2, 3],
      meta: PageMeta {
        total: 8,
        is_first_page: true,
        is_last_page: false,
        current_page: 1,
        next_page: 2,
        previous_page: 0,
      },
    };
    assert!(page.meta_consistent(5));

    // More rows than per_page is inconsistent
    assert!(!page.meta_consistent(2));

    // is_first_page must agree with current_page
    page.meta.current_page = 2;
    assert!(!page.meta_consistent(5));
  }
}
