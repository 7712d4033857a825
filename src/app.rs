use crate::api::ApiClient;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::queries::Queries;
use crate::routes::{self, Route};
use crate::session::SessionStore;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult, Toasts};
use crate::ui::renderfns::{draw_footer, draw_header, extract_domain};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{CategoriesView, SignInView, TasksView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;

/// Main application state
pub struct App {
  config: Config,
  api: ApiClient,
  session: SessionStore,
  queries: Queries,
  toasts: Toasts,

  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Which root the stack is built on, re-resolved against the session
  /// every tick
  root: Route,

  /// Command palette, owned here so it works from any view
  command: CommandInput,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let api = ApiClient::new(&config)?;
    let session = SessionStore::open()?;
    session.arm(&api);

    let queries = Queries::new(api.clone());
    let toasts = Toasts::new();

    let root = routes::resolve(Route::Tasks, session.current().is_some());
    let mut app = Self {
      config,
      api,
      session,
      queries,
      toasts,
      view_stack: Vec::new(),
      root,
      command: CommandInput::new(),
      should_quit: false,
    };
    let view = app.build_root(root);
    app.view_stack.push(view);
    Ok(app)
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(250));

    // Main loop
    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      if let Some(event) = events.next().await {
        match event {
          Event::Key(key) => self.handle_key(key),
          Event::Tick => self.tick(),
        }
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn build_root(&self, route: Route) -> Box<dyn View> {
    let per_page = self.config.defaults.per_page;
    match route {
      Route::SignIn => Box::new(SignInView::new(
        self.api.clone(),
        self.session.clone(),
        self.toasts.clone(),
      )),
      Route::Tasks => Box::new(TasksView::new(
        self.queries.clone(),
        self.toasts.clone(),
        per_page,
      )),
      Route::Categories => Box::new(CategoriesView::new(
        self.queries.clone(),
        self.toasts.clone(),
        per_page,
      )),
    }
  }

  fn switch_root(&mut self, requested: Route) {
    let resolved = routes::resolve(requested, self.session.current().is_some());
    self.root = resolved;
    let view = self.build_root(resolved);
    self.view_stack.clear();
    self.view_stack.push(view);
  }

  fn sign_out(&mut self) {
    self.session.sign_out(&self.api);
    self.queries.clear();
    self.switch_root(Route::SignIn);
  }

  fn draw(&mut self, frame: &mut Frame) {
    // The sign-in screen has no header row
    let show_header = self.root != Route::SignIn;
    let constraints = if show_header {
      vec![
        Constraint::Length(1), // Header
        Constraint::Min(0),    // Content
        Constraint::Length(1), // Footer
      ]
    } else {
      vec![Constraint::Min(0), Constraint::Length(1)]
    };
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints(constraints)
      .split(frame.area());

    let content_area = if show_header {
      let title = self
        .config
        .title
        .clone()
        .unwrap_or_else(|| extract_domain(&self.config.server.url).to_string());
      let session = self.session.current();
      let user = session.as_ref().map(|s| s.user.email.as_str());
      draw_header(frame, chunks[0], &title, user);
      chunks[1]
    } else {
      chunks[0]
    };

    if let Some(view) = self.view_stack.last_mut() {
      view.render(frame, content_area);
    }

    let breadcrumb: Vec<String> = self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect();
    draw_footer(frame, chunks[chunks.len() - 1], &breadcrumb);

    self.command.render_overlay(frame, content_area);
    self.toasts.render(frame, content_area);
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // The palette only grabs keys when the view is not in a text input
    let capturing = self
      .view_stack
      .last()
      .map(|v| v.capturing_input())
      .unwrap_or(false);
    if self.command.is_active() || !capturing {
      match self.command.handle_key(key) {
        KeyResult::Handled => return,
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) => return,
        KeyResult::NotHandled => {}
      }
    }

    if let Some(view) = self.view_stack.last_mut() {
      match view.handle_key(key) {
        ViewAction::None => {}
        ViewAction::Push(new_view) => self.view_stack.push(new_view),
        ViewAction::Pop => {
          // Popping the root quits
          if self.view_stack.len() > 1 {
            self.view_stack.pop();
          } else {
            self.should_quit = true;
          }
        }
      }
    }
  }

  fn execute_command(&mut self, cmd: &str) {
    match cmd {
      "tasks" => self.switch_root(Route::Tasks),
      "categories" => self.switch_root(Route::Categories),
      "signout" => {
        self.sign_out();
        self.toasts.success("signed out");
      }
      "quit" => self.should_quit = true,
      _ => self.toasts.error(format!("unknown command: {}", cmd)),
    }
  }

  fn tick(&mut self) {
    self.queries.poll();
    if let Some(view) = self.view_stack.last_mut() {
      view.tick();
    }
    self.toasts.prune();

    // A rejected token anywhere means the session is gone
    if self.api.take_unauthorized() && self.session.current().is_some() {
      self.sign_out();
      self.toasts.error("session expired, sign in again");
    }

    // Re-resolve the root so signing in (or out) lands on the right screen
    let resolved = routes::resolve(self.root, self.session.current().is_some());
    if resolved != self.root {
      self.switch_root(resolved);
    }
  }
}
