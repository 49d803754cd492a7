// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use nudgedash_app::{
    AppCommand, AppState, DisplayTable, NavigationState, RefreshScheduler, STEP_COUNT,
    StatisticsPayload, TableBoard, apply_payload,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

const KEY_POLL: Duration = Duration::from_millis(120);
const STATUS_TTL: Duration = Duration::from_secs(4);
const LOCK_MARK: &str = "(locked)";
const APP_TITLE: &str = "nudgedash";

pub trait DashboardRuntime {
    fn fetch_statistics(&mut self) -> Result<StatisticsPayload>;

    /// Starts one fetch and reports it on `tx`. Hosts that can fetch off the
    /// UI thread override this; the default fetches inline.
    fn spawn_refresh(&mut self, cycle: u64, tx: Sender<InternalEvent>) -> Result<()> {
        let outcome = match self.fetch_statistics() {
            Ok(payload) => RefreshOutcome::Fetched(payload),
            Err(error) => RefreshOutcome::Failed(format!("{error:#}")),
        };
        tx.send(InternalEvent::Refresh { cycle, outcome })
            .map_err(|_| anyhow!("refresh event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Fetched(StatisticsPayload),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Refresh { cycle: u64, outcome: RefreshOutcome },
}

#[derive(Debug, Clone, PartialEq)]
struct ViewData {
    board: TableBoard,
    scheduler: RefreshScheduler,
    help_visible: bool,
    in_flight: usize,
    last_refreshed: Option<String>,
    status_token: u64,
}

impl ViewData {
    fn new(board: TableBoard, scheduler: RefreshScheduler) -> Self {
        Self {
            board,
            scheduler,
            help_visible: false,
            in_flight: 0,
            last_refreshed: None,
            status_token: 0,
        }
    }
}

pub fn run_app<R: DashboardRuntime>(
    state: &mut AppState,
    board: TableBoard,
    scheduler: RefreshScheduler,
    runtime: &mut R,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(board, scheduler);
    let (internal_tx, internal_rx) = mpsc::channel();
    info!(
        interval_secs = view_data.scheduler.interval().as_secs(),
        "dashboard started"
    );

    let mut result = Ok(());
    loop {
        start_due_refresh(state, runtime, &mut view_data, &internal_tx, Instant::now());
        process_internal_events(state, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(KEY_POLL).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    info!("dashboard stopped");
    result
}

fn start_due_refresh<R: DashboardRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    now: Instant,
) {
    if let Some(cycle) = view_data.scheduler.poll(now) {
        start_refresh(state, runtime, view_data, internal_tx, cycle);
    }
}

fn start_refresh<R: DashboardRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    cycle: u64,
) {
    debug!(cycle, "starting refresh cycle");
    view_data.in_flight += 1;
    if let Err(error) = runtime.spawn_refresh(cycle, internal_tx.clone()) {
        view_data.in_flight = view_data.in_flight.saturating_sub(1);
        warn!(cycle, "could not start refresh: {error:#}");
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("refresh failed to start: {error}"),
        );
    }
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Refresh { cycle, outcome } => {
                handle_refresh_event(state, view_data, tx, cycle, outcome);
            }
        }
    }
}

fn handle_refresh_event(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    cycle: u64,
    outcome: RefreshOutcome,
) {
    view_data.in_flight = view_data.in_flight.saturating_sub(1);
    if view_data.scheduler.is_stale(cycle) {
        debug!(cycle, "discarding result of superseded refresh cycle");
        return;
    }

    match outcome {
        RefreshOutcome::Fetched(payload) => {
            let report = apply_payload(&payload, &mut view_data.board);
            view_data.scheduler.mark_applied(cycle);
            let stamp = clock_stamp();
            view_data.last_refreshed = Some(stamp.clone());
            emit_status(
                state,
                view_data,
                tx,
                format!("{} at {stamp}", report.summary()),
            );
        }
        RefreshOutcome::Failed(error) => {
            warn!(cycle, "refresh failed: {error}");
            emit_status(
                state,
                view_data,
                tx,
                format!("refresh failed: {error}; showing previous data"),
            );
        }
    }
}

fn clock_stamp() -> String {
    OffsetDateTime::now_utc()
        .format(&time::macros::format_description!(
            "[hour]:[minute]:[second] UTC"
        ))
        .unwrap_or_else(|_| "now".to_owned())
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_TTL);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event<R: DashboardRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q')
        || (matches!(key.code, KeyCode::Char('c' | 'q'))
            && key.modifiers.contains(KeyModifiers::CONTROL))
    {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return false;
    }

    match key.code {
        KeyCode::Right | KeyCode::Tab | KeyCode::Char('l') | KeyCode::Char('n') => {
            state.dispatch(AppCommand::NextStep);
        }
        KeyCode::Left | KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Char('p') => {
            state.dispatch(AppCommand::PrevStep);
        }
        KeyCode::Char('r') => {
            let cycle = view_data.scheduler.trigger(Instant::now());
            info!(cycle, "manual refresh requested");
            start_refresh(state, runtime, view_data, internal_tx, cycle);
        }
        KeyCode::Char('?') => {
            view_data.help_visible = true;
        }
        _ => {}
    }
    false
}

fn step_title(nav: &NavigationState, step: usize, label: &str) -> String {
    if nav.is_locked(step) {
        format!(" {label} {LOCK_MARK} ")
    } else {
        format!(" {label} ")
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let nav = &state.nav;
    let (tabs_area, body_area, status_area) = if nav.bottom {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(frame.area());
        (layout[1], layout[0], layout[2])
    } else {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(3),
            ])
            .split(frame.area());
        (layout[0], layout[1], layout[2])
    };

    let titles = nav
        .step_labels()
        .iter()
        .enumerate()
        .map(|(step, label)| {
            let style = if nav.is_locked(step) {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };
            Line::styled(step_title(nav, step, label), style)
        })
        .collect::<Vec<_>>();
    let tabs = Tabs::new(titles)
        .block(Block::default().title(APP_TITLE).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(nav.selected_index());
    frame.render_widget(tabs, tabs_area);

    render_step(frame, body_area, state, view_data);

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, status_area);

    if view_data.help_visible {
        let area = centered_rect(60, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_step(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState, view_data: &ViewData) {
    let step = state.nav.selected_index();
    let tables = view_data.board.tables_for_step(step).collect::<Vec<_>>();
    if tables.is_empty() {
        let labels = state.nav.step_labels();
        let empty = Paragraph::new(format!("no tables on step {}", labels[step]))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    }

    let count = tables.len() as u32;
    let areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(tables.iter().map(|_| Constraint::Ratio(1, count)))
        .split(area);
    for (table, table_area) in tables.into_iter().zip(areas.iter()) {
        render_table(frame, *table_area, table);
    }
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, table: &DisplayTable) {
    let block = Block::default()
        .title(table_title(table))
        .borders(Borders::ALL);
    if table.columns.is_empty() {
        let waiting = Paragraph::new("waiting for first refresh").block(block);
        frame.render_widget(waiting, area);
        return;
    }

    let header = Row::new(table.columns.iter().map(|column| {
        Cell::from(column.clone()).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));
    let rows = table
        .rows
        .iter()
        .map(|row| Row::new(row.iter().map(|cell| Cell::from(cell.to_string()))));
    let widths = vec![Constraint::Fill(1); table.columns.len()];

    let widget = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(block);
    frame.render_widget(widget, area);
}

fn table_title(table: &DisplayTable) -> String {
    let count = table.rows.len();
    format!(
        "{} ({count} {})",
        table.title(),
        if count == 1 { "row" } else { "rows" }
    )
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    let labels = state.nav.step_labels();
    let step = state.nav.selected_index();
    let mut parts = vec![format!("step {} of {STEP_COUNT}", labels[step])];
    if view_data.in_flight > 0 {
        parts.push("fetching".to_owned());
    }
    match (&state.status_line, &view_data.last_refreshed) {
        (Some(status), _) => parts.push(status.clone()),
        (None, Some(at)) => parts.push(format!("last refresh {at}")),
        (None, None) => parts.push("waiting for data".to_owned()),
    }
    parts.push("h/l step | r refresh | ? help | q quit".to_owned());
    parts.join(" | ")
}

fn help_overlay_text() -> &'static str {
    "steps: l/n/right/tab next | h/p/left/shift+tab previous\n\
refresh: r fetch now (also runs on the configured interval)\n\
general: ? help | esc close help | q quit"
}

/// Plain-text rendering of every table, grouped by step.
pub fn board_text(nav: &NavigationState, board: &TableBoard) -> String {
    let labels = nav.step_labels();
    let mut out = String::new();
    for (step, label) in labels.iter().enumerate() {
        let tables = board.tables_for_step(step).collect::<Vec<_>>();
        if tables.is_empty() {
            continue;
        }
        out.push_str(&format!("== step {label} ==\n"));
        for table in tables {
            out.push_str(&format!("{}\n", table_title(table)));
            if !table.columns.is_empty() {
                out.push_str(&table.columns.join(" | "));
                out.push('\n');
            }
            for row in &table.rows {
                let cells = row.iter().map(ToString::to_string).collect::<Vec<_>>();
                out.push_str(&cells.join(" | "));
                out.push('\n');
            }
            out.push('\n');
        }
    }
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
