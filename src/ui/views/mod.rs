mod categories;
mod sign_in;
mod task_detail;
mod tasks;

pub use categories::CategoriesView;
pub use sign_in::SignInView;
pub use task_detail::TaskDetailView;
pub use tasks::TasksView;
