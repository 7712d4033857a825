use serde::Serialize;

use super::client::ApiClient;
use super::error::ApiError;
use super::types::{Category, Page, PageMeta, SortOrder};

/// Column a category list can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategorySortColumn {
  Name,
  CreatedAt,
  UpdatedAt,
}

impl CategorySortColumn {
  pub const ALL: [CategorySortColumn; 3] = [
    CategorySortColumn::Name,
    CategorySortColumn::CreatedAt,
    CategorySortColumn::UpdatedAt,
  ];

  pub fn as_param(self) -> &'static str {
    match self {
      CategorySortColumn::Name => "name",
      CategorySortColumn::CreatedAt => "created_at",
      CategorySortColumn::UpdatedAt => "updated_at",
    }
  }

  pub fn from_param(s: &str) -> Option<CategorySortColumn> {
    match s {
      "name" => Some(CategorySortColumn::Name),
      "created_at" => Some(CategorySortColumn::CreatedAt),
      "updated_at" => Some(CategorySortColumn::UpdatedAt),
      _ => None,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      CategorySortColumn::Name => "name",
      CategorySortColumn::CreatedAt => "created",
      CategorySortColumn::UpdatedAt => "updated",
    }
  }
}

/// Complete description of one category list request; also the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryFilter {
  pub page: u32,
  pub per_page: u32,
  pub name: String,
  pub column: CategorySortColumn,
  pub order: SortOrder,
}

impl Default for CategoryFilter {
  fn default() -> Self {
    Self {
      page: 1,
      per_page: 5,
      name: String::new(),
      column: CategorySortColumn::UpdatedAt,
      order: SortOrder::Desc,
    }
  }
}

impl CategoryFilter {
  pub fn with_per_page(per_page: u32) -> Self {
    Self {
      per_page,
      ..Self::default()
    }
  }

  /// Preset used by the task form's category dropdown: everything on one
  /// page, newest first by creation.
  pub fn dropdown() -> Self {
    Self {
      page: 1,
      per_page: 999,
      name: String::new(),
      column: CategorySortColumn::CreatedAt,
      order: SortOrder::Desc,
    }
  }

  pub fn set_name(&mut self, name: String) {
    if self.name != name {
      self.name = name;
      self.page = 1;
    }
  }

  pub fn set_sort(&mut self, column: CategorySortColumn, order: SortOrder) {
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

  pub fn query_pairs(&self) -> Vec<(String, String)> {
    let mut pairs = vec![
      ("page".to_string(), self.page.to_string()),
      ("column".to_string(), self.column.as_param().to_string()),
      ("order".to_string(), self.order.as_param().to_string()),
      ("per_page".to_string(), self.per_page.to_string()),
    ];

    if !self.name.is_empty() {
      pairs.push(("name".to_string(), self.name.clone()));
    }

    pairs
  }
}

/// Payload for creating or updating a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInput {
  pub name: String,
}

pub async fn list(api: &ApiClient, filter: &CategoryFilter) -> Result<Page<Category>, ApiError> {
  api.get_json("api/categories", &filter.query_pairs()).await
}

pub async fn create(api: &ApiClient, input: &CategoryInput) -> Result<Category, ApiError> {
  api.post_json("api/categories", input).await
}

pub async fn update(
  api: &ApiClient,
  id: &str,
  input: &CategoryInput,
) -> Result<Category, ApiError> {
  api
    .patch_json(&format!("api/categories/{}", id), input)
    .await
}

pub async fn delete(api: &ApiClient, id: &str) -> Result<(), ApiError> {
  api.delete(&format!("api/categories/{}", id)).await
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
    let pairs = CategoryFilter::default().query_pairs();
    assert_eq!(pair(&pairs, "page"), Some("1".to_string()));
    assert_eq!(pair(&pairs, "column"), Some("updated_at".to_string()));
    assert_eq!(pair(&pairs, "order"), Some("desc".to_string()));
    assert_eq!(pair(&pairs, "per_page"), Some("5".to_string()));
    assert_eq!(pair(&pairs, "name"), None);
  }

  #[test]
  fn test_dropdown_preset() {
    let pairs = CategoryFilter::dropdown().query_pairs();
    assert_eq!(pair(&pairs, "per_page"), Some("999".to_string()));
    assert_eq!(pair(&pairs, "column"), Some("created_at".to_string()));
    assert_eq!(pair(&pairs, "order"), Some("desc".to_string()));
    assert_eq!(pair(&pairs, "page"), Some("1".to_string()));
  }

  #[test]
  fn test_search_resets_page() {
    let mut filter = CategoryFilter::default();
    filter.page = 2;
    filter.set_name("work".to_string());
    assert_eq!(filter.page, 1);
    assert_eq!(
      pair(&filter.query_pairs(), "name"),
      Some("work".to_string())
    );
  }

  #[test]
  fn test_sort_and_per_page_reset_page() {
    let mut filter = CategoryFilter::default();

    filter.page = 2;
    filter.set_sort(CategorySortColumn::Name, SortOrder::Asc);
    assert_eq!(filter.page, 1);

    filter.page = 2;
    filter.set_per_page(25);
    assert_eq!(filter.page, 1);

    // Re-applying the same sort is not a change
    filter.page = 2;
    filter.set_sort(CategorySortColumn::Name, SortOrder::Asc);
    assert_eq!(filter.page, 2);
  }
}
