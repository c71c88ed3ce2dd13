//! Help page listing all keybinds.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn bind(key: &str, what: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("  {key:<12}"),
            Style::default().fg(Color::Magenta),
        ),
        Span::raw(what.to_string()),
    ])
}

fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    ))
}

pub(super) fn draw_help(area: Rect, f: &mut Frame) {
    let lines = vec![
        section("Global"),
        bind("q / Ctrl-C", "Quit (waits for a running stage to finish)"),
        bind("Tab", "Cycle pages"),
        bind("?", "This help page"),
        bind("Esc", "Back to the Setup page"),
        bind("x", "Toggle expert view (raw error payloads)"),
        Line::from(""),
        section("Pipeline"),
        bind("s", "Scan the selected log with Hayabusa"),
        bind("e", "Enrich the last scan report with Takajo"),
        bind("c", "Stub run with Chainsaw"),
        Line::from(""),
        section("Setup page"),
        bind("↑/↓, k/j", "Select a log file"),
        bind("r", "Refresh the log list"),
        Line::from(""),
        section("Results page"),
        bind("←/→, h/l", "Switch report category"),
        bind("↑/↓, k/j", "Select a file in the category"),
        bind("Enter", "Open the selected file"),
        bind("PgUp/PgDn", "Scroll the content pane"),
    ];

    let help = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Keybinds"));
    f.render_widget(help, area);
}
