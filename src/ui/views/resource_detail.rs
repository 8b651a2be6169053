use crate::app::AppContext;
use crate::catalog::url::{extract_id_from_url, extract_resource_type_from_url};
use crate::catalog::{populate_all, ResolvedEntity, ResolvedField};
use crate::config::Config;
use crate::query::{Query, QueryState};
use crate::ui::renderfns::{capitalize, cell_text, value_text, MAX_CHAR_LENGTH};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::ERROR_MESSAGE;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use tracing::warn;

/// Width of a nested table column: a truncated cell plus its "...".
const COLUMN_WIDTH: usize = MAX_CHAR_LENGTH + 3;

/// One entity with its references resolved into nested tables
pub struct ResourceDetailView {
  ctx: AppContext,
  category: String,
  id: String,
  query: Query<ResolvedEntity>,
  /// Index into the flattened referenced entities
  selected: usize,
  scroll: u16,
}

impl ResourceDetailView {
  pub fn new(ctx: AppContext, category: String, id: String) -> Self {
    let client = ctx.client.clone();
    let key = client.details_url(&category, &id);
    let (fetch_category, fetch_id) = (category.clone(), id.clone());

    let mut query = Query::new(key, move || {
      let client = client.clone();
      let category = fetch_category.clone();
      let id = fetch_id.clone();
      async move {
        let entity = client
          .get_resource_details(&category, &id)
          .await
          .map_err(|e| format!("{:#}", e))?;
        populate_all(&client, &entity)
          .await
          .map_err(|e| format!("{:#}", e))
      }
    });
    query.fetch();

    Self {
      ctx,
      category,
      id,
      query,
      selected: 0,
      scroll: 0,
    }
  }

  fn reference_count(&self) -> usize {
    self
      .query
      .data()
      .map(|e| e.referenced_entities().len())
      .unwrap_or(0)
  }

  fn open_selected(&self) -> ViewAction {
    let Some(resolved) = self.query.data() else {
      return ViewAction::None;
    };
    let references = resolved.referenced_entities();
    let Some((tag, entity)) = references.get(self.selected) else {
      return ViewAction::None;
    };

    let url = entity.url();
    let category = url.and_then(extract_resource_type_from_url).or(*tag);
    let id = url.and_then(extract_id_from_url);
    match (category, id) {
      (Some(category), Some(id)) => ViewAction::Push(Box::new(ResourceDetailView::new(
        self.ctx.clone(),
        category.to_string(),
        id.to_string(),
      ))),
      _ => {
        warn!(url = ?url, "referenced entity has no category/id url");
        ViewAction::None
      }
    }
  }

  fn title(&self) -> String {
    let label = self
      .query
      .data()
      .and_then(|e| match e.get("name").or_else(|| e.get("title")) {
        Some(ResolvedField::Value(v)) => Some(value_text(v)),
        _ => None,
      })
      .unwrap_or_else(|| format!("{} {}", capitalize(&self.category), self.id));

    match self.query.state() {
      QueryState::Loading => format!(" {} (loading...) ", label),
      QueryState::Error(_) => format!(" {} (error) ", label),
      _ => format!(" {} ", label),
    }
  }
}

/// Lines of the detail page and the index of the line holding the selected
/// nested row, if any.
fn detail_lines(
  entity: &ResolvedEntity,
  config: &Config,
  selected: usize,
) -> (Vec<Line<'static>>, Option<usize>) {
  let key_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
  let mut lines = Vec::new();
  let mut selected_line = None;
  let mut row = 0;

  for (name, field) in &entity.fields {
    match field {
      ResolvedField::Value(value) => {
        lines.push(Line::from(vec![
          Span::styled(format!("{}: ", capitalize(name)), key_style),
          Span::raw(value_text(value)),
        ]));
      }
      ResolvedField::Reference(reference) => {
        let columns = config.columns_for(reference.tag.as_deref().unwrap_or_default());

        lines.push(Line::from(""));
        let tag = reference
          .tag
          .as_ref()
          .map(|t| format!(" [{}]", t))
          .unwrap_or_default();
        lines.push(Line::from(vec![
          Span::styled(capitalize(name), key_style),
          Span::styled(
            format!("{} ({})", tag, reference.entities.len()),
            Style::default().fg(Color::DarkGray),
          ),
        ]));
        lines.push(Line::styled(
          table_row(columns.iter().map(|c| capitalize(c))),
          Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));

        for nested in &reference.entities {
          let text = table_row(columns.iter().map(|c| cell_text(nested.get(c))));
          if row == selected {
            selected_line = Some(lines.len());
            lines.push(Line::styled(
              format!("> {}", text),
              Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            ));
          } else {
            lines.push(Line::from(format!("  {}", text)));
          }
          row += 1;
        }
      }
    }
  }

  (lines, selected_line)
}

fn table_row(cells: impl Iterator<Item = String>) -> String {
  cells
    .map(|cell| format!("{:<width$}", cell, width = COLUMN_WIDTH))
    .collect::<Vec<_>>()
    .join(" ")
    .trim_end()
    .to_string()
}

/// Scroll offset that keeps `line` inside a window of `height` lines.
fn scroll_to(scroll: u16, line: usize, height: u16) -> u16 {
  let line = u16::try_from(line).unwrap_or(u16::MAX);
  if height == 0 {
    scroll
  } else if line < scroll {
    line
  } else if line >= scroll.saturating_add(height) {
    line - (height - 1)
  } else {
    scroll
  }
}

impl View for ResourceDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    let count = self.reference_count();
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        if self.selected + 1 < count {
          self.selected += 1;
        }
      }
      KeyCode::Char('k') | KeyCode::Up => self.selected = self.selected.saturating_sub(1),
      KeyCode::Char('g') => self.selected = 0,
      KeyCode::Char('G') => self.selected = count.saturating_sub(1),
      KeyCode::Char('r') => {
        self.selected = 0;
        self.scroll = 0;
        self.query.refetch();
      }
      KeyCode::Enter => return self.open_selected(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(self.title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(entity) = self.query.data() else {
      let content = if self.query.is_error() {
        ERROR_MESSAGE
      } else {
        "Loading, please wait..."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    };

    let (lines, selected_line) = detail_lines(entity, &self.ctx.config, self.selected);
    if let Some(line) = selected_line {
      self.scroll = scroll_to(self.scroll, line, block.inner(area).height);
    }

    let paragraph = Paragraph::new(lines).block(block).scroll((self.scroll, 0));
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    format!("{}/{}", self.category, self.id)
  }

  fn category(&self) -> Option<&str> {
    Some(&self.category)
  }

  fn tick(&mut self) {
    if self.query.poll() {
      self.selected = self.selected.min(self.reference_count().saturating_sub(1));
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("j/k", "select").with_priority(20),
      ShortcutInfo::new("enter", "open").with_priority(30),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
