//! Results page: tabbed enrichment report, raw output for other stages, and
//! the full-panel run error view.

use super::state::{FileView, UiState};
use crate::classify::FileCategory;
use crate::model::Stage;
use crate::report::TableData;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

pub(super) fn draw_results(area: Rect, f: &mut Frame, state: &UiState) {
    if let Some(err) = &state.run_error {
        draw_run_error(area, f, state, err);
        return;
    }

    if let Some(stage) = state.running {
        let loading = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("Running {} ({})…", stage.tool_name(), stage.human_name()),
                Style::default().fg(Color::Yellow),
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title("Results"));
        f.render_widget(loading, area);
        return;
    }

    let Some(report) = &state.last_report else {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from("No analysis has been run yet."),
            Line::from("Pick a log on the Setup page and press 's' to scan it."),
        ])
        .block(Block::default().borders(Borders::ALL).title("Results"));
        f.render_widget(empty, area);
        return;
    };

    // Only enrichment output gets the tabbed viewer; scan and stub runs
    // show their raw output.
    if report.stage != Stage::Enrich {
        draw_raw_output(area, f, state, report);
        return;
    }

    let categories = state.categories();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let labels: Vec<Line> = categories
        .iter()
        .map(|c| {
            if c.files.is_empty() {
                Line::from(c.label.to_string())
            } else {
                Line::from(format!("{} ({})", c.label, c.files.len()))
            }
        })
        .collect();
    let tabs = Tabs::new(labels)
        .select(state.active_category.min(categories.len().saturating_sub(1)))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} report (←/→ switch)", report.result.tool)),
        )
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, chunks[0]);

    match categories.get(state.active_category) {
        Some(category) if !category.files.is_empty() => {
            draw_category(chunks[1], f, state, category)
        }
        _ => draw_summary(chunks[1], f, state, report),
    }
}

/// Raw output for scan and stub runs: no file classification, just what the
/// tool reported.
fn draw_raw_output(
    area: Rect,
    f: &mut Frame,
    state: &UiState,
    report: &crate::model::StageReport,
) {
    let mut lines = Vec::new();
    if let Some(msg) = report.result.message.as_deref() {
        lines.push(Line::from(msg.to_string()));
    }
    if let Some(loc) = report.result.output_location.as_deref() {
        lines.push(Line::from(vec![
            Span::styled("Output: ", Style::default().fg(Color::Gray)),
            Span::raw(loc.to_string()),
        ]));
    }
    if let Some(cmd) = report.result.command_run.as_deref() {
        lines.push(Line::from(vec![
            Span::styled("Command: ", Style::default().fg(Color::Gray)),
            Span::raw(cmd.to_string()),
        ]));
    }
    if let Some(stdout) = report.result.stdout.as_deref() {
        if !stdout.is_empty() {
            lines.push(Line::from(""));
            for l in stdout.lines() {
                lines.push(Line::from(l.to_string()));
            }
        }
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "The tool reported no output",
            Style::default().fg(Color::Gray),
        )));
    }

    let raw = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((state.content_scroll, 0))
        .block(Block::default().borders(Borders::ALL).title(format!(
            "{} ({})",
            report.result.tool,
            report.stage.human_name()
        )));
    f.render_widget(raw, area);
}

fn draw_summary(area: Rect, f: &mut Frame, state: &UiState, report: &crate::model::StageReport) {
    let mut lines = vec![Line::from(vec![
        Span::styled("Tool: ", Style::default().fg(Color::Gray)),
        Span::raw(report.result.tool.clone()),
    ])];
    if let Some(msg) = report.result.message.as_deref() {
        lines.push(Line::from(msg.to_string()));
    }
    if let Some(loc) = report.result.output_location.as_deref() {
        lines.push(Line::from(vec![
            Span::styled("Output: ", Style::default().fg(Color::Gray)),
            Span::raw(loc.to_string()),
        ]));
    }
    match report.result.generated_files.as_deref() {
        None => lines.push(Line::from(Span::styled(
            "Generated files: not reported by the backend",
            Style::default().fg(Color::Gray),
        ))),
        Some([]) => lines.push(Line::from("Generated files: none")),
        Some(files) => lines.push(Line::from(format!("Generated files: {}", files.len()))),
    }
    if let Some(cmd) = report.result.command_run.as_deref() {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Command: ", Style::default().fg(Color::Gray)),
            Span::raw(cmd.to_string()),
        ]));
    }
    if let Some(stdout) = report.result.stdout.as_deref() {
        if !stdout.is_empty() {
            lines.push(Line::from(""));
            for l in stdout.lines() {
                lines.push(Line::from(l.to_string()));
            }
        }
    }

    let summary = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((state.content_scroll, 0))
        .block(Block::default().borders(Borders::ALL).title("Summary"));
    f.render_widget(summary, area);
}

fn draw_category(area: Rect, f: &mut Frame, state: &UiState, category: &FileCategory) {
    let row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(area);

    let mut file_lines: Vec<Line> = Vec::new();
    for (i, name) in category.files.iter().enumerate() {
        if i == state.file_selected {
            file_lines.push(Line::from(vec![
                Span::styled("> ", Style::default().fg(Color::Yellow)),
                Span::styled(name.clone(), Style::default().fg(Color::Yellow)),
            ]));
        } else {
            file_lines.push(Line::from(vec![Span::raw("  "), Span::raw(name.clone())]));
        }
    }
    let files = Paragraph::new(file_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("{} (↑/↓, Enter opens)", category.label)),
    );
    f.render_widget(files, row[0]);

    draw_file_view(row[1], f, state);
}

fn draw_file_view(area: Rect, f: &mut Frame, state: &UiState) {
    let title = state
        .selected_file
        .as_ref()
        .map(|s| s.name.clone())
        .unwrap_or_else(|| "Content".to_string());
    let block = Block::default().borders(Borders::ALL).title(title);

    match &state.file_view {
        None => {
            let hint = Paragraph::new(Line::from(Span::styled(
                "Press Enter on a file to view it",
                Style::default().fg(Color::Gray),
            )))
            .block(block);
            f.render_widget(hint, area);
        }
        Some(FileView::Loading) => {
            let loading = Paragraph::new(Line::from(Span::styled(
                "Loading…",
                Style::default().fg(Color::Yellow),
            )))
            .block(block);
            f.render_widget(loading, area);
        }
        Some(FileView::Plain(content)) => {
            let text: Vec<Line> = content.lines().map(|l| Line::from(l.to_string())).collect();
            let view = Paragraph::new(text)
                .scroll((state.content_scroll, 0))
                .block(block);
            f.render_widget(view, area);
        }
        Some(FileView::Table(table)) => draw_table(area, f, state, table, block),
        Some(FileView::Failed(message)) => {
            let failed = Paragraph::new(vec![
                Line::from(Span::styled(
                    "Could not display this file",
                    Style::default().fg(Color::Red),
                )),
                Line::from(message.clone()),
            ])
            .wrap(Wrap { trim: false })
            .block(block);
            f.render_widget(failed, area);
        }
    }
}

fn draw_table(area: Rect, f: &mut Frame, state: &UiState, table: &TableData, block: Block) {
    // A header-only file parsed fine; make that legible instead of drawing
    // an empty grid.
    if table.rows.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(table.columns.join(", ")),
            Line::from(Span::styled(
                "(no rows)",
                Style::default().fg(Color::Gray),
            )),
        ])
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let header = Row::new(
        table
            .columns
            .iter()
            .map(|c| Cell::from(c.as_str()).style(Style::default().add_modifier(Modifier::BOLD))),
    );
    // Vertical scroll is a plain row offset; PageUp/PageDown adjust it.
    let rows = table
        .rows
        .iter()
        .skip(state.content_scroll as usize)
        .map(|r| Row::new(r.iter().map(|c| Cell::from(c.as_str()))));
    let widths = vec![Constraint::Min(8); table.columns.len()];

    let widget = Table::new(rows, widths)
        .header(header)
        .column_spacing(2)
        .block(block);
    f.render_widget(widget, area);
}

fn draw_run_error(area: Rect, f: &mut Frame, state: &UiState, err: &super::state::RunErrorView) {
    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} ({}) failed", err.stage.tool_name(), err.stage.human_name()),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for l in err.message.lines() {
        lines.push(Line::from(l.to_string()));
    }

    if state.expert {
        if let Some(raw) = &err.raw {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Raw error payload:",
                Style::default().fg(Color::Gray),
            )));
            let pretty =
                serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string());
            for l in pretty.lines() {
                lines.push(Line::from(Span::styled(
                    l.to_string(),
                    Style::default().fg(Color::Gray),
                )));
            }
        }
    }

    let error = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((state.content_scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Run failed")
                .border_style(Style::default().fg(Color::Red)),
        );
    f.render_widget(error, area);
}
