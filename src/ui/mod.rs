pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::{ListState, TableState};
use renderfns::{draw_footer, draw_header};

/// Shown in place of a view's content when its query failed
pub const ERROR_MESSAGE: &str = "Something went wrong. Press 'r' to retry.";

/// Main draw function: header, current view, breadcrumb footer, and the
/// command overlay on top.
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Breadcrumb
    ])
    .split(frame.area());

  let title = app.config().display_title();
  let (category, shortcuts) = match app.current_view() {
    Some(view) => (view.category().map(String::from), view.shortcuts()),
    None => (None, Vec::new()),
  };
  draw_header(frame, chunks[0], &title, category.as_deref(), &shortcuts);

  if let Some(view) = app.current_view_mut() {
    view.render(frame, chunks[1]);
  }

  draw_footer(frame, chunks[2], &app.breadcrumb());

  app.command().render_overlay(frame, chunks[1]);
}

/// Keep a table selection inside `0..len`, selecting the first row when
/// there is something to select.
pub fn ensure_valid_selection(state: &mut TableState, len: usize) {
  state.select(clamped(state.selected(), len));
}

pub fn ensure_valid_list_selection(state: &mut ListState, len: usize) {
  state.select(clamped(state.selected(), len));
}

fn clamped(selected: Option<usize>, len: usize) -> Option<usize> {
  if len == 0 {
    None
  } else {
    Some(selected.unwrap_or(0).min(len - 1))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_selection_clamped() {
    let mut state = TableState::default();
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(0));

    state.select(Some(7));
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(2));

    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);
  }
}
