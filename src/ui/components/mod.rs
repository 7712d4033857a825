mod category_form;
mod command_input;
mod confirm;
mod input;
mod key_result;
mod search_input;
mod select;
mod task_form;
mod toasts;

pub use category_form::{CategoryForm, CategoryFormEvent};
pub use command_input::{CommandEvent, CommandInput};
pub use confirm::{Confirm, ConfirmEvent};
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
pub use search_input::{SearchEvent, SearchInput};
pub use select::{SelectEvent, SelectItem, SelectOverlay};
pub use task_form::{TaskForm, TaskFormEvent, TaskFormData};
pub use toasts::Toasts;
