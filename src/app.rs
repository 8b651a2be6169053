use crate::catalog::{CatalogClient, CategoryMap};
use crate::commands::{self, CommandAction};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::query::Query;
use crate::route::Route;
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{CategoryListView, ResourceDetailView, ResourceListView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Shared handles every view needs
#[derive(Clone)]
pub struct AppContext {
  pub client: CatalogClient,
  pub config: Arc<Config>,
}

impl AppContext {
  pub fn new(client: CatalogClient, config: Config) -> Self {
    Self {
      client,
      config: Arc::new(config),
    }
  }
}

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Command overlay (after pressing :)
  command: CommandInput,

  /// Category names for command completion
  categories: Query<CategoryMap>,

  ctx: AppContext,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, route: &Route) -> Result<Self> {
    let client = CatalogClient::new(&config)?;
    let ctx = AppContext::new(client, config);

    let categories = {
      let client = ctx.client.clone();
      Query::new(format!("{} (commands)", ctx.client.root()), move || {
        let client = client.clone();
        async move { client.get_categories().await.map_err(|e| format!("{:#}", e)) }
      })
    };

    Ok(Self {
      view_stack: Self::initial_stack(&ctx, route),
      command: CommandInput::new(),
      categories,
      ctx,
      should_quit: false,
    })
  }

  /// Views for a start route. A detail route keeps its list underneath so
  /// going back lands on the category.
  fn initial_stack(ctx: &AppContext, route: &Route) -> Vec<Box<dyn View>> {
    let category = route.category(&ctx.config.default_category).to_string();
    let list: Box<dyn View> = Box::new(ResourceListView::new(ctx.clone(), category.clone()));

    match route {
      Route::Detail { id, .. } => vec![
        list,
        Box::new(ResourceDetailView::new(ctx.clone(), category, id.clone())),
      ],
      _ => vec![list],
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Cleanup terminal, even if the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
    let mut events = EventHandler::new(Duration::from_millis(100));
    self.categories.fetch();

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Resize) => {} // Redrawn on the next pass
        Some(Event::Tick) => self.tick(),
        None => break,
      }
    }

    Ok(())
  }

  fn tick(&mut self) {
    for view in &mut self.view_stack {
      view.tick();
    }
    if self.categories.poll() {
      if let Some(categories) = self.categories.data() {
        self.command.set_categories(categories.names());
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // The command overlay only opens when no view input is capturing keys
    let capturing = self.current_view().is_some_and(|v| v.captures_input());
    if self.command.is_active() || !capturing {
      match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };
    self.apply(action);
  }

  fn execute_command(&mut self, cmd: &str) {
    match commands::resolve(cmd, self.command.categories()) {
      CommandAction::ShowCategories => {
        self.apply(ViewAction::Reset(Box::new(CategoryListView::new(self.ctx.clone()))))
      }
      CommandAction::OpenCategory(category) => self.apply(ViewAction::Reset(Box::new(
        ResourceListView::new(self.ctx.clone(), category),
      ))),
      CommandAction::Quit => self.should_quit = true,
      CommandAction::Unknown(name) => warn!(command = %name, "unknown command"),
    }
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => {
        info!(view = %view.breadcrumb_label(), "open view");
        self.view_stack.push(view);
      }
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::Reset(view) => {
        info!(view = %view.breadcrumb_label(), "reset view stack");
        self.view_stack.clear();
        self.view_stack.push(view);
      }
    }
  }

  pub fn current_view(&self) -> Option<&dyn View> {
    self.view_stack.last().map(|v| v.as_ref())
  }

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn command(&self) -> &CommandInput {
    &self.command
  }

  pub fn config(&self) -> &Config {
    &self.ctx.config
  }

  /// Labels of every view on the stack, root first
  pub fn breadcrumb(&self) -> Vec<String> {
    self.view_stack.iter().map(|v| v.breadcrumb_label()).collect()
  }

  #[cfg(test)]
  fn with_context(ctx: AppContext, route: &Route) -> Self {
    let client = ctx.client.clone();
    Self {
      view_stack: Self::initial_stack(&ctx, route),
      command: CommandInput::new(),
      categories: Query::new("categories", move || {
        let client = client.clone();
        async move { client.get_categories().await.map_err(|e| format!("{:#}", e)) }
      }),
      ctx,
      should_quit: false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStorage;
  use crate::catalog::transport::fake::FakeTransport;
  use serde_json::json;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn app(route: &str) -> App {
    let fake = FakeTransport::new().with(
      "https://swapi.dev/api/",
      json!({
        "people": "https://swapi.dev/api/people/",
        "planets": "https://swapi.dev/api/planets/"
      }),
    );
    let client = CatalogClient::with_parts(
      "https://swapi.dev/api/",
      Arc::new(fake),
      Arc::new(MemoryStorage::new()),
    );
    let route = Route::parse(route).unwrap();
    App::with_context(AppContext::new(client, Config::default()), &route)
  }

  #[tokio::test]
  async fn test_default_route_opens_default_category() {
    let app = app("/");
    assert_eq!(app.breadcrumb(), vec!["People p1"]);
  }

  #[tokio::test]
  async fn test_detail_route_keeps_list_underneath() {
    let mut app = app("/planets/3");
    assert_eq!(app.breadcrumb(), vec!["Planets p1", "planets/3"]);

    app.handle_key(key(KeyCode::Char('q')));
    assert_eq!(app.breadcrumb(), vec!["Planets p1"]);
    assert!(!app.should_quit);

    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_command_opens_category() {
    let mut app = app("/");
    app.categories.fetch();
    tokio::time::sleep(Duration::from_millis(20)).await;
    app.tick();
    assert_eq!(app.command().categories(), ["people", "planets"]);

    app.handle_key(key(KeyCode::Char(':')));
    for c in "planets".chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.breadcrumb(), vec!["Planets p1"]);
  }

  #[tokio::test]
  async fn test_command_shows_categories() {
    let mut app = app("/people/1");
    app.handle_key(key(KeyCode::Char(':')));
    for c in "categories".chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.breadcrumb(), vec!["Categories"]);
  }

  #[tokio::test]
  async fn test_colon_is_typed_into_search() {
    let mut app = app("/");
    app.handle_key(key(KeyCode::Char('/')));
    app.handle_key(key(KeyCode::Char(':')));
    assert!(!app.command().is_active());
  }

  #[tokio::test]
  async fn test_ctrl_c_quits() {
    let mut app = app("/");
    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
  }
}
