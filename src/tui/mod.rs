mod help;
mod report_view;
mod state;

use crate::backend::HttpBackend;
use crate::cli::{self, Cli};
use crate::model::Stage;
use crate::orchestrator::{self, PipelineEvent, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Terminal,
};
use state::{Page, UiState};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    // Unbounded channels avoid backpressure between the UI thread and the
    // controller task.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<PipelineEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let backend = Arc::new(HttpBackend::new(&cli::build_config(&args))?);

    // TUI runs in a dedicated thread to keep all blocking I/O out of the
    // Tokio runtime.
    let ui_args = args.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_args, event_rx, cmd_tx));

    let res = orchestrator::run_controller(backend, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    args: Cli,
    mut event_rx: UnboundedReceiver<PipelineEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState::new(args.expert);

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep the UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut state, ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match k.code {
                    KeyCode::Char('c') if k.modifiers.contains(KeyModifiers::CONTROL) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    KeyCode::Char('q') => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    KeyCode::Tab => {
                        state.page = match state.page {
                            Page::Setup => Page::Results,
                            Page::Results => Page::Help,
                            Page::Help => Page::Setup,
                        };
                    }
                    KeyCode::Char('?') => state.page = Page::Help,
                    KeyCode::Esc => state.page = Page::Setup,
                    KeyCode::Char('x') => {
                        state.expert = !state.expert;
                        state.info = if state.expert {
                            "Expert view enabled (raw error payloads)".into()
                        } else {
                            "Expert view disabled".into()
                        };
                    }
                    KeyCode::Char('s') => trigger_stage(&mut state, &cmd_tx, Stage::Scan),
                    KeyCode::Char('e') => trigger_stage(&mut state, &cmd_tx, Stage::Enrich),
                    KeyCode::Char('c') => trigger_stage(&mut state, &cmd_tx, Stage::Stub),
                    code => handle_page_key(&mut state, &cmd_tx, code),
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

/// Start a stage from the UI. The trigger is a no-op while another stage is
/// running; the missing-log precondition is reported without leaving the
/// page.
fn trigger_stage(state: &mut UiState, cmd_tx: &UnboundedSender<UiCommand>, stage: Stage) {
    if state.running.is_some() {
        state.info = "A stage is already running".into();
        return;
    }
    let cmd = match stage {
        Stage::Scan | Stage::Stub => {
            let Some(log_file) = state.logs.get(state.log_selected).cloned() else {
                state.info = "Select a log file on the Setup page first".into();
                return;
            };
            match stage {
                Stage::Scan => UiCommand::RunScan { log_file },
                _ => UiCommand::RunStub { log_file },
            }
        }
        // The enrichment guard lives in the controller; a missing scan
        // comes back as a local precondition failure.
        Stage::Enrich => UiCommand::RunEnrich,
    };
    let _ = cmd_tx.send(cmd);
}

fn handle_page_key(state: &mut UiState, cmd_tx: &UnboundedSender<UiCommand>, code: KeyCode) {
    match state.page {
        Page::Setup => match code {
            KeyCode::Up | KeyCode::Char('k') => {
                state.log_selected = state.log_selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if !state.logs.is_empty() {
                    state.log_selected = (state.log_selected + 1).min(state.logs.len() - 1);
                }
            }
            KeyCode::Char('r') => {
                state.info = "Refreshing log list…".into();
                let _ = cmd_tx.send(UiCommand::RefreshLogs);
            }
            _ => {}
        },
        Page::Results => match code {
            KeyCode::Left | KeyCode::Char('h') => state.prev_category(),
            KeyCode::Right | KeyCode::Char('l') => state.next_category(),
            KeyCode::Up | KeyCode::Char('k') => state.move_file_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => state.move_file_selection(1),
            KeyCode::Enter => {
                if let Some(cmd) = state.select_file() {
                    let _ = cmd_tx.send(cmd);
                }
            }
            KeyCode::PageUp => {
                state.content_scroll = state.content_scroll.saturating_sub(10);
            }
            KeyCode::PageDown => {
                state.content_scroll = state.content_scroll.saturating_add(10);
            }
            _ => {}
        },
        Page::Help => {}
    }
}

fn apply_event(state: &mut UiState, ev: PipelineEvent) {
    match ev {
        PipelineEvent::BackendStatus { reachable, message } => {
            state.backend_reachable = Some(reachable);
            state.info = message;
        }
        PipelineEvent::ToolsLoaded(tools) => state.tools = tools,
        PipelineEvent::LogsLoaded(logs) => {
            if !logs.is_empty() {
                state.log_selected = state.log_selected.min(logs.len() - 1);
            } else {
                state.log_selected = 0;
            }
            state.info = format!("{} log file(s) available", logs.len());
            state.logs = logs;
        }
        PipelineEvent::StageStarted(stage) => state.stage_started(stage),
        PipelineEvent::StageSucceeded(report) => {
            state.info = report.result.message.clone().unwrap_or_default();
            state.stage_succeeded(report);
        }
        PipelineEvent::StageFailed {
            stage,
            message,
            raw,
        } => state.stage_failed(stage, message, raw),
        PipelineEvent::FileLoaded {
            generation,
            directory,
            file_name,
            content,
        } => state.commit_file_content(generation, &directory, &file_name, Ok(content)),
        PipelineEvent::FileLoadFailed {
            generation,
            directory,
            file_name,
            message,
        } => state.commit_file_content(generation, &directory, &file_name, Err(message)),
        PipelineEvent::Info(msg) => state.info = msg,
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);

    let tabs = Tabs::new(vec![
        Line::from("Setup"),
        Line::from("Results"),
        Line::from("Help"),
    ])
    .select(match state.page {
        Page::Setup => 0,
        Page::Results => 1,
        Page::Help => 2,
    })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("dfir-workbench-cli"),
    )
    .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.page {
        Page::Setup => draw_setup(chunks[1], f, state),
        Page::Results => report_view::draw_results(chunks[1], f, state),
        Page::Help => help::draw_help(chunks[1], f),
    }

    draw_status(chunks[2], f, state);
}

fn draw_setup(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)].as_ref())
        .split(area);

    // Log file picker (left)
    let mut log_lines: Vec<Line> = Vec::new();
    if state.logs.is_empty() {
        log_lines.push(Line::from(Span::styled(
            "No log files available (press 'r' to refresh)",
            Style::default().fg(Color::Gray),
        )));
    }
    for (i, name) in state.logs.iter().enumerate() {
        if i == state.log_selected {
            log_lines.push(Line::from(vec![
                Span::styled("> ", Style::default().fg(Color::Yellow)),
                Span::styled(name.clone(), Style::default().fg(Color::Yellow)),
            ]));
        } else {
            log_lines.push(Line::from(vec![Span::raw("  "), Span::raw(name.clone())]));
        }
    }
    let logs = Paragraph::new(log_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Input logs (↑/↓ select, 'r' refresh)"),
    );
    f.render_widget(logs, row[0]);

    // Backend and tool inventory (right)
    let col = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)].as_ref())
        .split(row[1]);

    let mut tool_lines = vec![Line::from(vec![
        Span::styled("Backend: ", Style::default().fg(Color::Gray)),
        match state.backend_reachable {
            Some(true) => Span::styled("reachable", Style::default().fg(Color::Green)),
            Some(false) => Span::styled("unreachable", Style::default().fg(Color::Red)),
            None => Span::styled("probing…", Style::default().fg(Color::Gray)),
        },
    ])];
    for tool in &state.tools {
        tool_lines.push(Line::from(vec![
            Span::raw(format!("{}: ", tool.name)),
            if tool.exists {
                Span::styled("installed", Style::default().fg(Color::Green))
            } else {
                Span::styled("missing", Style::default().fg(Color::Red))
            },
        ]));
    }
    let tools = Paragraph::new(tool_lines).block(Block::default().borders(Borders::ALL).title("Workbench"));
    f.render_widget(tools, col[0]);

    let actions = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("s", Style::default().fg(Color::Magenta)),
            Span::raw("  Scan selected log (Hayabusa)"),
        ]),
        Line::from(vec![
            Span::styled("e", Style::default().fg(Color::Magenta)),
            Span::raw("  Enrich last scan report (Takajo)"),
        ]),
        Line::from(vec![
            Span::styled("c", Style::default().fg(Color::Magenta)),
            Span::raw("  Stub run (Chainsaw)"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Press '?' for all keybinds",
            Style::default().fg(Color::Gray),
        )),
    ])
    .block(Block::default().borders(Borders::ALL).title("Pipeline"));
    f.render_widget(actions, col[1]);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let text = if let Some(stage) = state.running {
        format!("Running {} ({})…", stage.tool_name(), stage.human_name())
    } else {
        state.info.clone()
    };
    let status = Paragraph::new(Line::from(text))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, area);
}
