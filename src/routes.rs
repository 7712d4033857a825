/// Top-level places the app can be routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
  SignIn,
  Tasks,
  Categories,
}

/// Resolve where a navigation request actually lands.
///
/// Protected routes need a session; without one everything lands on the
/// sign-in screen. With a session the sign-in screen is skipped in favor of
/// the task list. Pure so both startup and command dispatch share it.
pub fn resolve(requested: Route, has_session: bool) -> Route {
  match (requested, has_session) {
    (Route::SignIn, true) => Route::Tasks,
    (requested, true) => requested,
    (_, false) => Route::SignIn,
  }
}
