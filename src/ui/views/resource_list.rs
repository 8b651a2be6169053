use crate::app::AppContext;
use crate::catalog::{Entity, ResultPage};
use crate::pagination::{checked_page, parse_page_input, total_pages, PAGE_SIZE};
use crate::query::{Query, QueryState};
use crate::ui::components::{
  draw_pagination, overflow_values, render_input_overlay, resource_table, InputResult, KeyResult,
  SearchEvent, SearchInput, TextInput,
};
use crate::ui::renderfns::{capitalize, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::ResourceDetailView;
use crate::ui::{ensure_valid_selection, ERROR_MESSAGE};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, TableState};
use tracing::{info, warn};

/// Most truncated cells shown in full under the table
const MAX_OVERFLOW_LINES: usize = 3;

/// Paginated, searchable table of one category
pub struct ResourceListView {
  ctx: AppContext,
  category: String,
  columns: Vec<String>,
  page: u32,
  search_term: String,
  /// Page count from the last page that loaded
  total_pages: u32,
  query: Query<ResultPage>,
  table_state: TableState,
  search: SearchInput,
  page_input: Option<TextInput>,
}

impl ResourceListView {
  pub fn new(ctx: AppContext, category: String) -> Self {
    let columns = ctx.config.columns_for(&category);
    let query = Self::page_query(&ctx, &category, 1, "");

    let mut view = Self {
      ctx,
      category,
      columns,
      page: 1,
      search_term: String::new(),
      total_pages: 0,
      query,
      table_state: TableState::default(),
      search: SearchInput::new(),
      page_input: None,
    };
    view.query.fetch();
    view
  }

  fn page_query(ctx: &AppContext, category: &str, page: u32, search: &str) -> Query<ResultPage> {
    let client = ctx.client.clone();
    let category = category.to_string();
    let search = search.to_string();
    let key = client.resources_url(&category, page, &search);

    Query::new(key, move || {
      let client = client.clone();
      let category = category.clone();
      let search = search.clone();
      async move {
        client
          .get_resources(&category, page, &search)
          .await
          .map_err(|e| format!("{:#}", e))
      }
    })
  }

  /// Replace the query for the current page and search. The previous
  /// query's result, if still in flight, is discarded.
  fn reload(&mut self) {
    info!(category = %self.category, page = self.page, search = %self.search_term, "loading page");
    self.query = Self::page_query(&self.ctx, &self.category, self.page, &self.search_term);
    self.query.fetch();
    self.table_state.select(Some(0));
  }

  fn go_to_page(&mut self, page: u32) {
    if let Some(page) = checked_page(page, self.total_pages) {
      if page != self.page {
        self.page = page;
        self.reload();
      }
    }
  }

  fn apply_search(&mut self, term: String) {
    if term != self.search_term {
      self.search_term = term;
      self.page = 1;
      self.reload();
    }
  }

  fn entities(&self) -> &[Entity] {
    self
      .query
      .data()
      .map(|p| p.results.as_slice())
      .unwrap_or(&[])
  }

  fn selected_entity(&self) -> Option<&Entity> {
    self
      .table_state
      .selected()
      .and_then(|idx| self.entities().get(idx))
  }

  fn title(&self) -> String {
    let mut title = format!(" {}", capitalize(&self.category));
    if !self.search_term.is_empty() {
      title.push_str(&format!(" [/{}]", truncate(&self.search_term)));
    }
    match self.query.state() {
      QueryState::Loading => title.push_str(" (loading...) "),
      QueryState::Error(_) => title.push_str(" (error) "),
      QueryState::Success(page) => title.push_str(&format!(" ({}) ", page.count)),
      QueryState::Idle => title.push(' '),
    }
    title
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.entities().len();
    ensure_valid_selection(&mut self.table_state, len);

    let block = Block::default()
      .title(self.title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 {
      let content = if self.query.is_loading() {
        "Loading, please wait...".to_string()
      } else if self.query.is_error() {
        ERROR_MESSAGE.to_string()
      } else if !self.search_term.is_empty() {
        format!("No {} match \"{}\".", self.category, self.search_term)
      } else {
        format!("No {} found.", self.category)
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let first_number = (self.page.saturating_sub(1) as u64 * PAGE_SIZE + 1) as usize;
    let entities: Vec<&Entity> = self.entities().iter().collect();
    let table = resource_table(&entities, &self.columns, first_number, block);
    frame.render_stateful_widget(table, area, &mut self.table_state);
  }

  fn overflow_lines(&self) -> Vec<Line<'static>> {
    let Some(entity) = self.selected_entity() else {
      return Vec::new();
    };
    overflow_values(entity, &self.columns)
      .into_iter()
      .take(MAX_OVERFLOW_LINES)
      .map(|(column, text)| {
        Line::from(vec![
          Span::styled(
            format!(" {}: ", capitalize(&column)),
            Style::default().fg(Color::DarkGray),
          ),
          Span::raw(text),
        ])
      })
      .collect()
  }

  fn handle_page_input(&mut self, key: KeyEvent) -> Option<ViewAction> {
    let input = self.page_input.as_mut()?;
    match input.handle_key(key) {
      InputResult::Submitted(value) => {
        self.page_input = None;
        if let Some(page) = parse_page_input(&value) {
          self.go_to_page(page);
        }
      }
      InputResult::Cancelled => self.page_input = None,
      InputResult::Consumed | InputResult::NotHandled => {}
    }
    Some(ViewAction::None)
  }

  fn handle_search(&mut self, key: KeyEvent) -> Option<ViewAction> {
    let current = self.search_term.clone();
    match self.search.handle_key(key, &current) {
      KeyResult::Handled => Some(ViewAction::None),
      KeyResult::Event(SearchEvent::Submitted(term)) => {
        self.apply_search(term);
        Some(ViewAction::None)
      }
      KeyResult::Event(SearchEvent::Cancelled) => Some(ViewAction::None),
      KeyResult::NotHandled => None,
    }
  }

  fn handle_navigation(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.table_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.table_state.select_previous(),
      KeyCode::Char('n') | KeyCode::Right => self.go_to_page(self.page + 1),
      KeyCode::Char('p') | KeyCode::Left => self.go_to_page(self.page.saturating_sub(1)),
      KeyCode::Char('g') => self.go_to_page(1),
      KeyCode::Char('G') => self.go_to_page(self.total_pages),
      KeyCode::Char('#') => {
        let mut input = TextInput::numeric();
        input.set_value(&self.page.to_string());
        self.page_input = Some(input);
      }
      _ => return None,
    }
    Some(ViewAction::None)
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('r') => {
        self.query.refetch();
        Some(ViewAction::None)
      }
      KeyCode::Enter => {
        let entity = self.selected_entity()?;
        match entity.id() {
          Some(id) => Some(ViewAction::Push(Box::new(ResourceDetailView::new(
            self.ctx.clone(),
            self.category.clone(),
            id.to_string(),
          )))),
          None => {
            warn!(category = %self.category, entity = ?entity.label(), "selected entity has no id in its url");
            Some(ViewAction::None)
          }
        }
      }
      KeyCode::Esc if !self.search_term.is_empty() => {
        self.apply_search(String::new());
        Some(ViewAction::None)
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }
}

impl View for ResourceListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_page_input(key)
      .or_else(|| self.handle_search(key))
      .or_else(|| self.handle_navigation(key))
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let overflow = self.overflow_lines();
    let overflow_height = u16::try_from(overflow.len()).unwrap_or(u16::MAX);
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Min(3),                         // Table
        Constraint::Length(overflow_height),        // Full text of cut cells
        Constraint::Length(1),                      // Pagination
      ])
      .split(area);

    self.render_table(frame, chunks[0]);
    frame.render_widget(Paragraph::new(overflow), chunks[1]);
    if self.total_pages > 0 {
      draw_pagination(frame, chunks[2], self.page, self.total_pages);
    }

    self.search.render_overlay(frame, chunks[0]);
    if let Some(input) = &self.page_input {
      render_input_overlay(
        frame,
        chunks[0],
        &format!(" Page (1-{}) ", self.total_pages),
        "#",
        input.value(),
      );
    }
  }

  fn breadcrumb_label(&self) -> String {
    let label = capitalize(&self.category);
    if self.search_term.is_empty() {
      format!("{} p{}", label, self.page)
    } else {
      format!("{} /{} p{}", label, self.search_term, self.page)
    }
  }

  fn category(&self) -> Option<&str> {
    Some(&self.category)
  }

  fn captures_input(&self) -> bool {
    self.search.is_active() || self.page_input.is_some()
  }

  fn tick(&mut self) {
    if self.query.poll() {
      if let Some(page) = self.query.data() {
        self.total_pages = total_pages(page.count);
      }
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("n/p", "page").with_priority(30),
      ShortcutInfo::new("#", "go to").with_priority(40),
      ShortcutInfo::new("enter", "details").with_priority(50),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::AppContext;
  use crate::cache::MemoryStorage;
  use crate::catalog::transport::fake::FakeTransport;
  use crate::catalog::CatalogClient;
  use crate::config::Config;
  use crossterm::event::KeyModifiers;
  use serde_json::json;
  use std::sync::Arc;
  use std::time::Duration;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn people_page(page: u32) -> serde_json::Value {
    json!({
      "count": 23,
      "results": [
        {"name": format!("person {}", page), "url": format!("https://swapi.dev/api/people/{}/", page)}
      ]
    })
  }

  fn context() -> AppContext {
    let mut fake = FakeTransport::new();
    for page in 1..=3 {
      fake = fake.with(
        &format!("https://swapi.dev/api/people/?page={}", page),
        people_page(page),
      );
    }
    fake = fake.with(
      "https://swapi.dev/api/people/?page=1&search=sky",
      json!({"count": 1, "results": [{"name": "Luke Skywalker"}]}),
    );
    let client = CatalogClient::with_parts(
      "https://swapi.dev/api/",
      Arc::new(fake),
      Arc::new(MemoryStorage::new()),
    );
    AppContext::new(client, Config::default())
  }

  async fn settle(view: &mut ResourceListView) {
    tokio::time::sleep(Duration::from_millis(20)).await;
    view.tick();
  }

  #[tokio::test]
  async fn test_loads_first_page() {
    let mut view = ResourceListView::new(context(), "people".to_string());
    settle(&mut view).await;

    assert_eq!(view.total_pages, 3);
    assert_eq!(view.entities()[0].label(), Some("person 1"));
    assert_eq!(view.breadcrumb_label(), "People p1");
  }

  #[tokio::test]
  async fn test_next_page_and_bounds() {
    let mut view = ResourceListView::new(context(), "people".to_string());
    settle(&mut view).await;

    view.handle_key(key(KeyCode::Char('n')));
    settle(&mut view).await;
    assert_eq!(view.page, 2);
    assert_eq!(view.entities()[0].label(), Some("person 2"));

    view.handle_key(key(KeyCode::Char('G')));
    settle(&mut view).await;
    assert_eq!(view.page, 3);

    // Already on the last page
    view.handle_key(key(KeyCode::Char('n')));
    assert_eq!(view.page, 3);
  }

  #[tokio::test]
  async fn test_page_input_ignores_out_of_range() {
    let mut view = ResourceListView::new(context(), "people".to_string());
    settle(&mut view).await;

    view.handle_key(key(KeyCode::Char('#')));
    assert!(view.captures_input());
    view.handle_key(key(KeyCode::Backspace));
    view.handle_key(key(KeyCode::Char('9')));
    view.handle_key(key(KeyCode::Enter));
    assert!(!view.captures_input());
    assert_eq!(view.page, 1);

    view.handle_key(key(KeyCode::Char('#')));
    view.handle_key(key(KeyCode::Backspace));
    view.handle_key(key(KeyCode::Char('2')));
    view.handle_key(key(KeyCode::Enter));
    assert_eq!(view.page, 2);
  }

  #[tokio::test]
  async fn test_search_resets_to_first_page() {
    let mut view = ResourceListView::new(context(), "people".to_string());
    settle(&mut view).await;
    view.handle_key(key(KeyCode::Char('n')));
    settle(&mut view).await;

    view.handle_key(key(KeyCode::Char('/')));
    for c in "sky".chars() {
      view.handle_key(key(KeyCode::Char(c)));
    }
    view.handle_key(key(KeyCode::Enter));
    settle(&mut view).await;

    assert_eq!(view.page, 1);
    assert_eq!(view.search_term, "sky");
    assert_eq!(view.total_pages, 1);
    assert_eq!(view.entities()[0].label(), Some("Luke Skywalker"));
  }

  #[tokio::test]
  async fn test_enter_opens_detail() {
    let mut view = ResourceListView::new(context(), "people".to_string());
    settle(&mut view).await;
    view.table_state.select(Some(0));

    match view.handle_key(key(KeyCode::Enter)) {
      ViewAction::Push(detail) => assert_eq!(detail.breadcrumb_label(), "people/1"),
      _ => panic!("expected a detail view"),
    }
  }
}
