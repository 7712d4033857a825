//! The app's data context: one query cache per resource plus mutation
//! dispatch with the invalidation side effect baked in.

use crate::api::categories::{self, CategoryFilter, CategoryInput};
use crate::api::tasks::{self, TaskFilter, TaskInput};
use crate::api::types::{Category, Page, Task};
use crate::api::ApiClient;
use crate::query::{Mutation, QueryCache, QuerySnapshot};

/// Shared handle to both resource caches.
///
/// Every mutation constructor returns a dispatched `Mutation` whose future
/// invalidates the resource's cache after the write succeeds, before the
/// outcome reaches the caller. Reads therefore never need to know which
/// mutations exist; they just see their entries go stale.
#[derive(Clone)]
pub struct Queries {
  api: ApiClient,
  tasks: QueryCache<TaskFilter, Page<Task>>,
  categories: QueryCache<CategoryFilter, Page<Category>>,
}

impl Queries {
  pub fn new(api: ApiClient) -> Self {
    Self {
      api,
      tasks: QueryCache::new(),
      categories: QueryCache::new(),
    }
  }

  /// Drain completed fetches from both caches. Called once per tick.
  pub fn poll(&self) -> bool {
    // Non-short-circuiting: both caches must drain every tick
    self.tasks.poll() | self.categories.poll()
  }

  /// Drop everything cached (sign-out).
  pub fn clear(&self) {
    self.tasks.clear();
    self.categories.clear();
  }

  pub fn invalidate_tasks(&self) {
    self.tasks.invalidate();
  }

  pub fn invalidate_categories(&self) {
    self.categories.invalidate();
  }

  pub fn tasks(&self, filter: &TaskFilter) -> QuerySnapshot<Page<Task>> {
    let api = self.api.clone();
    let request = filter.clone();
    self.tasks.ensure(filter.clone(), move || async move {
      tasks::list(&api, &request).await
    })
  }

  pub fn categories(&self, filter: &CategoryFilter) -> QuerySnapshot<Page<Category>> {
    let api = self.api.clone();
    let request = filter.clone();
    self.categories.ensure(filter.clone(), move || async move {
      categories::list(&api, &request).await
    })
  }

  /// All categories on one page, for the task form dropdown and the
  /// category filter picker. Shares the category cache, so category
  /// mutations refresh it like any other entry.
  pub fn category_options(&self) -> QuerySnapshot<Page<Category>> {
    self.categories(&CategoryFilter::dropdown())
  }

  pub fn create_task(&self, input: TaskInput) -> Mutation<Task> {
    let api = self.api.clone();
    let cache = self.tasks.clone();
    Mutation::dispatch(async move {
      let task = tasks::create(&api, &input).await?;
      cache.invalidate();
      Ok(task)
    })
  }

  pub fn update_task(&self, id: String, input: TaskInput) -> Mutation<Task> {
    let api = self.api.clone();
    let cache = self.tasks.clone();
    Mutation::dispatch(async move {
      let task = tasks::update(&api, &id, &input).await?;
      cache.invalidate();
      Ok(task)
    })
  }

  pub fn delete_task(&self, id: String) -> Mutation<()> {
    let api = self.api.clone();
    let cache = self.tasks.clone();
    Mutation::dispatch(async move {
      tasks::delete(&api, &id).await?;
      cache.invalidate();
      Ok(())
    })
  }

  pub fn create_category(&self, input: CategoryInput) -> Mutation<Category> {
    let api = self.api.clone();
    let cache = self.categories.clone();
    Mutation::dispatch(async move {
      let category = categories::create(&api, &input).await?;
      cache.invalidate();
      Ok(category)
    })
  }

  pub fn update_category(&self, id: String, input: CategoryInput) -> Mutation<Category> {
    let api = self.api.clone();
    let cache = self.categories.clone();
    Mutation::dispatch(async move {
      let category = categories::update(&api, &id, &input).await?;
      cache.invalidate();
      Ok(category)
    })
  }

  pub fn delete_category(&self, id: String) -> Mutation<()> {
    let api = self.api.clone();
    let cache = self.categories.clone();
    Mutation::dispatch(async move {
      categories::delete(&api, &id).await?;
      cache.invalidate();
      Ok(())
    })
  }
}
