use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::AppState;

/// ステータスバーを描画
pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let total = state.items.len();
    let completed = state.completed_count();

    let left_content = if let Some(ref msg) = state.status_message {
        Span::styled(msg.clone(), Style::default().fg(Color::Cyan))
    } else {
        let last_poll = state
            .last_polled
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        let unreadable = state
            .last_report
            .map(|r| r.unreadable_files)
            .unwrap_or(0);
        let mut text = format!(
            " {} items | {} completed | last poll {} ",
            total, completed, last_poll
        );
        if unreadable > 0 {
            text.push_str(&format!("| {} unreadable ", unreadable));
        }
        Span::styled(text, Style::default().fg(Color::Gray))
    };

    let help_hint = Span::styled(
        " Press ? for help ",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    );

    // 左右に分けて表示
    let left = Paragraph::new(Line::from(left_content));
    let right = Paragraph::new(Line::from(help_hint));

    let left_area = Rect {
        x: area.x,
        y: area.y,
        width: area.width.saturating_sub(20),
        height: area.height,
    };

    let right_area = Rect {
        x: area.x + area.width.saturating_sub(20),
        y: area.y,
        width: 20.min(area.width),
        height: area.height,
    };

    frame.render_widget(left, left_area);
    frame.render_widget(right, right_area);
}
