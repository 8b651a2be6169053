use crate::pagination::page_window;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// `<< < 3 [4] 5 > >>   Page 4 of 9` with unreachable arrows dimmed.
pub fn pagination_line(current: u32, total: u32) -> Line<'static> {
  let enabled = Style::default().fg(Color::White);
  let disabled = Style::default().fg(Color::DarkGray);
  let at_start = current <= 1;
  let at_end = current >= total;

  let mut spans = vec![
    Span::styled("<< ", if at_start { disabled } else { enabled }),
    Span::styled("< ", if at_start { disabled } else { enabled }),
  ];

  for page in page_window(current, total) {
    if page == current {
      spans.push(Span::styled(
        format!("[{}] ", page),
        Style::default().fg(Color::Cyan).bold(),
      ));
    } else {
      spans.push(Span::styled(format!("{} ", page), enabled));
    }
  }

  spans.push(Span::styled("> ", if at_end { disabled } else { enabled }));
  spans.push(Span::styled(">>", if at_end { disabled } else { enabled }));
  spans.push(Span::styled(
    format!("   Page {} of {}", current, total),
    Style::default().fg(Color::DarkGray),
  ));

  Line::from(spans)
}

pub fn draw_pagination(frame: &mut Frame, area: Rect, current: u32, total: u32) {
  let paragraph = Paragraph::new(pagination_line(current, total)).alignment(Alignment::Center);
  frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
  use super::*;

  fn text(line: &Line) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
  }

  #[test]
  fn test_pagination_line() {
    assert_eq!(
      text(&pagination_line(4, 9)),
      "<< < 3 [4] 5 > >>   Page 4 of 9"
    );
    assert_eq!(text(&pagination_line(1, 1)), "<< < [1] > >>   Page 1 of 1");
  }
}
