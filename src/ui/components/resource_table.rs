use crate::catalog::Entity;
use crate::ui::renderfns::{capitalize, cell_text, is_truncated, value_text};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Cell, Row, Table};

/// Table of entities with one column per configured field plus a row number.
pub fn resource_table<'a>(
  entities: &[&Entity],
  columns: &[String],
  first_number: usize,
  block: Block<'a>,
) -> Table<'a> {
  let header_cells = std::iter::once(Cell::from("#"))
    .chain(columns.iter().map(|c| Cell::from(capitalize(c))))
    .collect::<Vec<_>>();
  let header = Row::new(header_cells).style(
    Style::default()
      .fg(Color::Yellow)
      .add_modifier(Modifier::BOLD),
  );

  let rows: Vec<Row> = entities
    .iter()
    .enumerate()
    .map(|(i, entity)| {
      let number = Cell::from(format!("{}", first_number + i)).style(Style::default().fg(Color::Cyan));
      let cells = std::iter::once(number)
        .chain(columns.iter().map(|c| Cell::from(cell_text(entity.get(c)))))
        .collect::<Vec<_>>();
      Row::new(cells)
    })
    .collect();

  let widths = std::iter::once(Constraint::Length(4))
    .chain(columns.iter().map(|_| Constraint::Fill(1)))
    .collect::<Vec<_>>();

  Table::new(rows, widths)
    .header(header)
    .block(block)
    .row_highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ")
}

/// Full values of the cells that the table cut short, for the selected row.
pub fn overflow_values(entity: &Entity, columns: &[String]) -> Vec<(String, String)> {
  columns
    .iter()
    .filter_map(|c| {
      let value = entity.get(c)?;
      if value.is_array() {
        return None;
      }
      let text = value_text(value);
      is_truncated(&text).then(|| (c.clone(), text))
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_overflow_values_only_long_cells() {
    let entity: Entity = serde_json::from_value(json!({
      "name": "Death Star",
      "manufacturer": "Imperial Department of Military Research, Sienar Fleet Systems",
      "films": ["http://x/films/1/"]
    }))
    .unwrap();
    let columns = vec![
      "name".to_string(),
      "manufacturer".to_string(),
      "films".to_string(),
    ];

    let overflow = overflow_values(&entity, &columns);
    assert_eq!(overflow.len(), 1);
    assert_eq!(overflow[0].0, "manufacturer");
    assert!(overflow[0].1.ends_with("Sienar Fleet Systems"));
  }
}
