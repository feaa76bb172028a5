use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Row, Table, TableState},
    Frame,
};

use crate::app::{AppState, ItemRow};

/// アイテム一覧を描画
pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let header = Row::new(vec!["アイテム", "取得数", "ノルマ", "完了"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .height(1);

    let mut rows: Vec<Row> = state
        .items
        .iter()
        .enumerate()
        .map(|(idx, row)| create_row(row, idx == state.selected_index))
        .collect();
    rows.push(placeholder_row());

    let widths = [
        Constraint::Min(20),    // アイテム
        Constraint::Length(8),  // 取得数
        Constraint::Length(8),  // ノルマ
        Constraint::Length(4),  // 完了
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title(state))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .row_highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

    let mut table_state = TableState::default();
    table_state.select(Some(state.selected_index));

    frame.render_stateful_widget(table, area, &mut table_state);
}

/// 現在日時と採取日
fn title(state: &AppState) -> String {
    match (state.last_polled, state.logical_day) {
        (Some(now), Some(day)) => format!(
            " {} (採取日 {}) ",
            now.format("%Y/%m/%d %H時"),
            day.format("%Y/%m/%d")
        ),
        _ => " Gathering Counter ".to_string(),
    }
}

fn create_row(row: &ItemRow, is_selected: bool) -> Row<'static> {
    let (mark, mark_style) = if row.progress.completed {
        ("✔", Style::default().fg(Color::Green))
    } else {
        ("", Style::default())
    };

    let mut name_style = if row.item.read_only {
        Style::default().fg(Color::Magenta)
    } else {
        Style::default()
    };
    if is_selected {
        name_style = name_style.add_modifier(Modifier::BOLD);
    }

    let count_style = if row.progress.completed {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::White)
    };

    Row::new(vec![
        Line::from(Span::styled(row.item.name.clone(), name_style)),
        Line::from(Span::styled(row.progress.count.to_string(), count_style)),
        Line::from(Span::styled(
            row.item.quota.to_string(),
            Style::default().fg(Color::Gray),
        )),
        Line::from(Span::styled(format!(" {}", mark), mark_style)),
    ])
    .height(1)
}

/// 末尾の新規追加用の行
fn placeholder_row() -> Row<'static> {
    Row::new(vec![
        Line::from(Span::styled(
            "+ a で追加",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
        Line::from(""),
        Line::from(""),
        Line::from(""),
    ])
    .height(1)
}
