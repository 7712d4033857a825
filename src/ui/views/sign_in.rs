use crate::api::types::Session;
use crate::api::ApiClient;
use crate::query::Mutation;
use crate::session::SessionStore;
use crate::ui::components::{InputResult, TextInput, Toasts};
use crate::ui::view::{View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Email,
  Password,
}

/// Credentials form shown whenever no session is active.
///
/// On success the session store picks up the new session and the route
/// guard swaps this view out on the next tick; the view itself never
/// navigates.
pub struct SignInView {
  api: ApiClient,
  store: SessionStore,
  toasts: Toasts,
  email: TextInput,
  password: TextInput,
  focus: Field,
  error: Option<String>,
  pending: Mutation<Session>,
}

impl SignInView {
  pub fn new(api: ApiClient, store: SessionStore, toasts: Toasts) -> Self {
    Self {
      api,
      store,
      toasts,
      email: TextInput::new(),
      password: TextInput::new(),
      focus: Field::Email,
      error: None,
      pending: Mutation::idle(),
    }
  }

  fn try_sign_in(&mut self) {
    let email = self.email.value().trim().to_string();
    if !valid_email(&email) {
      self.error = Some("enter a valid email address".to_string());
      return;
    }
    if self.password.value().chars().count() < 6 {
      self.error = Some("password must be at least 6 characters".to_string());
      return;
    }

    self.error = None;
    let store = self.store.clone();
    let api = self.api.clone();
    let password = self.password.value().to_string();
    self.pending = Mutation::dispatch(async move {
      store.sign_in(&api, &email, &password).await
    });
  }
}

impl View for SignInView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    // No edits while the login request is running
    if self.pending.in_flight() {
      return ViewAction::None;
    }

    let input = match self.focus {
      Field::Email => &mut self.email,
      Field::Password => &mut self.password,
    };
    match input.handle_key(key) {
      InputResult::Submitted(_) => {
        self.try_sign_in();
        return ViewAction::None;
      }
      InputResult::Cancelled => {
        self.error = None;
        return ViewAction::None;
      }
      InputResult::Consumed => {
        self.error = None;
        return ViewAction::None;
      }
      InputResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Tab | KeyCode::Down | KeyCode::BackTab | KeyCode::Up => {
        self.focus = match self.focus {
          Field::Email => Field::Password,
          Field::Password => Field::Email,
        };
      }
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let width = (area.width * 50 / 100).min(48).max(32);
    let height = 7;

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let card = Rect::new(x, y, width.min(area.width), height.min(area.height));

    let title = if self.pending.in_flight() {
      " Sign in (signing in...) "
    } else {
      " Sign in "
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(card);
    frame.render_widget(block, card);

    if inner.height == 0 {
      return;
    }

    let masked = "*".repeat(self.password.value().chars().count());
    let mut lines = vec![
      credential_line("Email", self.email.value(), self.focus == Field::Email),
      credential_line("Password", &masked, self.focus == Field::Password),
      Line::from(""),
    ];

    if let Some(error) = &self.error {
      lines.push(Line::from(Span::styled(
        error.clone(),
        Style::default().fg(Color::Red),
      )));
    } else {
      lines.push(Line::from(Span::styled(
        "<tab> switch field  <enter> sign in",
        Style::default().fg(Color::DarkGray),
      )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
  }

  fn breadcrumb_label(&self) -> String {
    "Sign in".to_string()
  }

  fn capturing_input(&self) -> bool {
    true
  }

  fn tick(&mut self) {
    if let Some(outcome) = self.pending.poll() {
      match outcome {
        Ok(session) => {
          self
            .toasts
            .success(format!("welcome back, {}", session.user.name));
        }
        Err(e) => self.error = Some(e.to_string()),
      }
    }
  }
}

fn credential_line<'a>(label: &'a str, value: &'a str, focused: bool) -> Line<'a> {
  let marker = if focused { "> " } else { "  " };
  let mut spans = vec![
    Span::styled(marker, Style::default().fg(Color::Cyan)),
    Span::styled(format!("{:<10}", label), Style::default().fg(Color::DarkGray)),
    Span::raw(value),
  ];
  if focused {
    spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
  }
  Line::from(spans)
}

fn valid_email(email: &str) -> bool {
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  !local.is_empty()
    && !domain.is_empty()
    && domain.contains('.')
    && !domain.starts_with('.')
    && !domain.ends_with('.')
    && !email.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_valid_emails() {
    assert!(valid_email("ana@example.com"));
    assert!(valid_email("a.b+c@mail.example.org"));
  }

  #[test]
  fn test_invalid_emails() {
    assert!(!valid_email(""));
    assert!(!valid_email("ana"));
    assert!(!valid_email("ana@"));
    assert!(!valid_email("@example.com"));
    assert!(!valid_email("ana@example"));
    assert!(!valid_email("ana@.com"));
    assert!(!valid_email("ana b@example.com"));
  }
}
