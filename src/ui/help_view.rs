use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::centered_rect;

fn key_line(key: &'static str, description: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(key, Style::default().fg(Color::Yellow)),
        Span::raw(description),
    ])
}

fn section(title: &'static str) -> Line<'static> {
    Line::from(vec![Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD),
    )])
}

/// ヘルプオーバーレイを描画
pub fn render(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);

    // 背景をクリア
    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        section("Navigation"),
        Line::from(""),
        key_line("  j/↓  ", "  Move down"),
        key_line("  k/↑  ", "  Move up"),
        key_line("  r    ", "  Re-read logs now"),
        Line::from(""),
        section("Items"),
        Line::from(""),
        key_line("  a    ", "  Add item (name,quota)"),
        key_line("  d    ", "  Delete selected item"),
        Line::from(vec![Span::styled(
            "         Built-in items are shown in magenta and cannot be deleted",
            Style::default().fg(Color::DarkGray),
        )]),
        Line::from(""),
        section("Other"),
        Line::from(""),
        key_line("  ?    ", "  Toggle this help"),
        key_line("  Esc  ", "  Close overlay / Back"),
        key_line("  q    ", "  Quit (saves edited items)"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .title_alignment(Alignment::Center)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .alignment(Alignment::Left);

    frame.render_widget(help, popup_area);
}
