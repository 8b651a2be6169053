use crate::app::AppContext;
use crate::catalog::CategoryMap;
use crate::query::{Query, QueryState};
use crate::ui::renderfns::capitalize;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::ResourceListView;
use crate::ui::{ensure_valid_list_selection, ERROR_MESSAGE};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// View listing the catalog's categories in server order
pub struct CategoryListView {
  ctx: AppContext,
  query: Query<CategoryMap>,
  list_state: ListState,
}

impl CategoryListView {
  pub fn new(ctx: AppContext) -> Self {
    let client = ctx.client.clone();
    let mut query = Query::new(client.root().to_string(), move || {
      let client = client.clone();
      async move { client.get_categories().await.map_err(|e| format!("{:#}", e)) }
    });

    query.fetch();

    Self {
      ctx,
      query,
      list_state: ListState::default(),
    }
  }

  fn names(&self) -> Vec<String> {
    self.query.data().map(|c| c.names()).unwrap_or_default()
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let names = self.names();
    ensure_valid_list_selection(&mut self.list_state, names.len());

    let title = match self.query.state() {
      QueryState::Loading => " Categories (loading...) ".to_string(),
      QueryState::Error(_) => " Categories (error) ".to_string(),
      _ => format!(" Categories ({}) ", names.len()),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if names.is_empty() {
      let content = if self.query.is_loading() {
        "Loading, please wait..."
      } else if self.query.is_error() {
        ERROR_MESSAGE
      } else {
        "No categories found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = names
      .iter()
      .map(|name| ListItem::new(Line::from(capitalize(name))))
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

impl View for CategoryListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Enter => {
        let selected = self
          .list_state
          .selected()
          .and_then(|idx| self.names().get(idx).cloned());
        if let Some(category) = selected {
          return ViewAction::Push(Box::new(ResourceListView::new(
            self.ctx.clone(),
            category,
          )));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Categories".to_string()
  }

  fn tick(&mut self) {
    self.query.poll();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("enter", "open").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(30),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
