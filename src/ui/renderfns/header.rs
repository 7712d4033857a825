use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, server, signed-in user, and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, title: &str, user: Option<&str>) {
  let mut spans = vec![
    Span::styled(" t9s ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", title), Style::default().fg(Color::White)),
  ];

  if let Some(user) = user {
    spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
    spans.push(Span::styled(
      format!(" {} ", user),
      Style::default().fg(Color::Yellow).bold(),
    ));
  }

  spans.push(Span::raw("  "));
  // Shortcuts - keys and brackets highlighted, descriptions dimmed
  spans.push(Span::styled("<:>", Style::default().fg(Color::Cyan)));
  spans.push(Span::styled(" command", Style::default().fg(Color::DarkGray)));
  spans.push(Span::raw("   "));
  spans.push(Span::styled("</>", Style::default().fg(Color::Cyan)));
  spans.push(Span::styled(" search", Style::default().fg(Color::DarkGray)));
  spans.push(Span::raw("   "));
  spans.push(Span::styled("<q>", Style::default().fg(Color::Cyan)));
  spans.push(Span::styled(" back", Style::default().fg(Color::DarkGray)));

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}

/// Extract the domain from the server URL for the default header title
pub fn extract_domain(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_extract_domain() {
    assert_eq!(extract_domain("http://localhost"), "localhost");
    assert_eq!(extract_domain("http://localhost:8000/"), "localhost:8000");
    assert_eq!(
      extract_domain("https://tasks.example.com/api"),
      "tasks.example.com"
    );
  }
}
