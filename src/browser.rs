use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::api::ApiClient;
use crate::controller::{ControllerState, NewsController};
use crate::models::{Category, NewsRecord, Notification, Severity};

const TITLE_COLUMN_WIDTH: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    List,
    Search,
    Detail,
    ConfirmDelete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    SelectNext,
    SelectPrev,
    NextPage,
    PrevPage,
    StartSearch,
    SearchInput(char),
    SearchBackspace,
    CancelSearch,
    CycleCategory,
    Apply,
    Reset,
    Refresh,
    OpenDetail,
    CloseDetail,
    ScrollDown,
    ScrollUp,
    RequestDelete,
    ConfirmDelete,
    CancelDelete,
}

/// Translates a key press into a browser action for the current mode
pub fn map_key(mode: Mode, key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match mode {
        Mode::Search => match key.code {
            KeyCode::Enter => Some(Action::Apply),
            KeyCode::Esc => Some(Action::CancelSearch),
            KeyCode::Backspace => Some(Action::SearchBackspace),
            KeyCode::Char(c) => Some(Action::SearchInput(c)),
            _ => None,
        },
        Mode::ConfirmDelete => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => Some(Action::ConfirmDelete),
            KeyCode::Char('n') | KeyCode::Esc => Some(Action::CancelDelete),
            _ => None,
        },
        Mode::Detail => match key.code {
            KeyCode::Char('q') | KeyCode::Esc | KeyCode::Backspace => Some(Action::CloseDetail),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::ScrollDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::ScrollUp),
            KeyCode::Char('d') => Some(Action::RequestDelete),
            _ => None,
        },
        Mode::List => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::SelectPrev),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::PageDown => Some(Action::NextPage),
            KeyCode::Char('h') | KeyCode::Left | KeyCode::PageUp => Some(Action::PrevPage),
            KeyCode::Char('/') => Some(Action::StartSearch),
            KeyCode::Char('c') => Some(Action::CycleCategory),
            KeyCode::Char('a') => Some(Action::Apply),
            KeyCode::Char('r') => Some(Action::Reset),
            KeyCode::Char('R') => Some(Action::Refresh),
            KeyCode::Enter => Some(Action::OpenDetail),
            KeyCode::Char('d') | KeyCode::Delete => Some(Action::RequestDelete),
            _ => None,
        },
    }
}

/// Next category in the filter cycle; `None` means all categories
pub fn next_category(current: Option<Category>) -> Option<Category> {
    match current {
        None => Some(Category::ALL[0]),
        Some(category) => {
            let idx = Category::ALL.iter().position(|c| *c == category).unwrap_or(0);
            Category::ALL.get(idx + 1).copied()
        }
    }
}

/// Cuts `text` to at most `width` display columns, marking the cut with `…`
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

struct BrowserApp {
    searching: bool,
    detail: Option<NewsRecord>,
    detail_lines: Vec<String>,
    scroll: u16,
    table_state: TableState,
    status: Option<Notification>,
}

impl BrowserApp {
    fn mode(&self, state: &ControllerState) -> Mode {
        if state.pending_deletion.dialog_open {
            Mode::ConfirmDelete
        } else if self.searching {
            Mode::Search
        } else if self.detail.is_some() {
            Mode::Detail
        } else {
            Mode::List
        }
    }

    fn selected<'a>(&self, state: &'a ControllerState) -> Option<&'a NewsRecord> {
        self.table_state.selected().and_then(|i| state.result.news.get(i))
    }
}

/// Runs the interactive news browser until the user quits
pub async fn run_browser<C: ApiClient>(controller: &NewsController<C>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = BrowserApp {
        searching: false,
        detail: None,
        detail_lines: Vec::new(),
        scroll: 0,
        table_state: TableState::default().with_selected(Some(0)),
        status: None,
    };

    let res = run_app(&mut terminal, &mut app, controller).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

async fn run_app<C: ApiClient>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut BrowserApp,
    controller: &NewsController<C>,
) -> Result<()> {
    controller.change_page(0).await;
    collect_status(app, controller);

    loop {
        let state = controller.snapshot();
        terminal.draw(|f| ui(f, app, &state))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        let Some(action) = map_key(app.mode(&state), key) else {
            continue;
        };

        match action {
            Action::Quit => return Ok(()),
            Action::SelectNext => {
                let len = state.result.news.len();
                if len > 0 {
                    let next = app.table_state.selected().map_or(0, |i| (i + 1).min(len - 1));
                    app.table_state.select(Some(next));
                }
            }
            Action::SelectPrev => {
                let prev = app.table_state.selected().map_or(0, |i| i.saturating_sub(1));
                app.table_state.select(Some(prev));
            }
            Action::NextPage => {
                if state.page + 1 < state.result.page_count {
                    controller.change_page(state.page + 1).await;
                    app.table_state.select(Some(0));
                }
            }
            Action::PrevPage => {
                if state.page > 0 {
                    controller.change_page(state.page - 1).await;
                    app.table_state.select(Some(0));
                }
            }
            Action::StartSearch => app.searching = true,
            Action::SearchInput(c) => {
                let mut search = state.draft.search.clone();
                search.push(c);
                controller.set_search(search);
            }
            Action::SearchBackspace => {
                let mut search = state.draft.search.clone();
                search.pop();
                controller.set_search(search);
            }
            Action::CancelSearch => app.searching = false,
            Action::CycleCategory => controller.set_category(next_category(state.draft.category)),
            Action::Apply => {
                app.searching = false;
                controller.apply_filters().await;
                app.table_state.select(Some(0));
            }
            Action::Reset => {
                controller.reset_filters().await;
                app.table_state.select(Some(0));
            }
            Action::Refresh => controller.refresh().await,
            Action::OpenDetail => {
                if let Some(selected) = app.selected(&state) {
                    let id = selected.id.clone();
                    if let Some(record) = controller.fetch_record_by_id(&id).await {
                        let width = terminal.size()?.width.saturating_sub(4).max(20) as usize;
                        app.detail_lines = detail_lines(&record, width);
                        app.detail = Some(record);
                        app.scroll = 0;
                    }
                }
            }
            Action::CloseDetail => {
                app.detail = None;
                app.detail_lines.clear();
            }
            Action::ScrollDown => {
                let max_scroll = app.detail_lines.len().saturating_sub(1) as u16;
                app.scroll = app.scroll.saturating_add(1).min(max_scroll);
            }
            Action::ScrollUp => app.scroll = app.scroll.saturating_sub(1),
            Action::RequestDelete => {
                let target = app
                    .detail
                    .as_ref()
                    .or_else(|| app.selected(&state))
                    .map(|r| r.id.clone());
                if let Some(id) = target {
                    controller.request_deletion(id);
                }
            }
            Action::ConfirmDelete => {
                if controller.confirm_deletion().await {
                    app.detail = None;
                    app.detail_lines.clear();
                    controller.refresh().await;
                }
            }
            Action::CancelDelete => controller.cancel_deletion(),
        }

        collect_status(app, controller);
    }
}

fn collect_status<C: ApiClient>(app: &mut BrowserApp, controller: &NewsController<C>) {
    if let Some(last) = controller.drain_notifications().pop() {
        app.status = Some(last);
    }
}

/// Plain-text rendering of a record for the detail pane
pub fn detail_lines(record: &NewsRecord, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for title in [&record.title_english, &record.title_arabic] {
        if !title.is_empty() {
            lines.extend(textwrap::wrap(title, width).into_iter().map(|l| l.into_owned()));
        }
    }
    lines.push(String::new());
    lines.push(format!("Category: {}", record.category.label()));
    if let Some(date) = record.date {
        lines.push(format!("Date: {}", date.format("%Y-%m-%d")));
    }
    if let Some(image) = record.image.as_deref().filter(|i| !i.is_empty()) {
        lines.push(format!("Image: {}", image));
    }
    lines.push("────────────────────────────────────────".to_string());

    for description in [&record.description_english, &record.description_arabic] {
        if !description.is_empty() {
            lines.push(String::new());
            let text = html2text::from_read(description.as_bytes(), width);
            lines.extend(text.lines().map(String::from));
        }
    }
    lines
}

fn ui(f: &mut Frame, app: &mut BrowserApp, state: &ControllerState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Min(8),    // Body
            Constraint::Length(3), // Footer
        ])
        .split(f.size());

    render_header(f, chunks[0], app, state);
    if app.detail.is_some() {
        render_detail(f, chunks[1], app);
    } else {
        render_table(f, chunks[1], app, state);
    }
    render_footer(f, chunks[2], app, state);

    if state.pending_deletion.dialog_open {
        render_confirm(f, state);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &BrowserApp, state: &ControllerState) {
    let total = if state.loading.news {
        "…".to_string()
    } else {
        state.result.total_count.to_string()
    };
    let category = state.draft.category.map_or("All Categories", |c| c.label());
    let search_style = if app.searching {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let cursor = if app.searching { "▏" } else { "" };

    let header_text = vec![
        Line::from(vec![Span::styled(
            format!("News {}", total),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )]),
        Line::from(vec![
            Span::raw("Search: "),
            Span::styled(format!("{}{}", state.draft.search, cursor), search_style),
            Span::raw("   Category: "),
            Span::styled(category, Style::default().fg(Color::Yellow)),
        ]),
    ];

    let header = Paragraph::new(header_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue))
            .title(" Newsdesk ")
            .title_alignment(Alignment::Center),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut BrowserApp, state: &ControllerState) {
    let rows: Vec<Row> = state
        .result
        .news
        .iter()
        .map(|record| {
            Row::new(vec![
                Cell::from(truncate_to_width(record.display_title(), TITLE_COLUMN_WIDTH)),
                Cell::from(record.category.label()),
                Cell::from(
                    record
                        .date
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ),
            ])
        })
        .collect();

    let title = if state.loading.news {
        " Loading… ".to_string()
    } else if rows.is_empty() {
        " No news found ".to_string()
    } else {
        format!(" Page {}/{} ", state.page + 1, state.result.page_count)
    };

    let table = Table::new(
        rows,
        [Constraint::Min(20), Constraint::Length(15), Constraint::Length(12)],
    )
    .header(
        Row::new(vec!["Title", "Category", "Date"])
            .style(Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)),
    )
    .highlight_style(Style::default().bg(Color::DarkGray))
    .highlight_symbol("> ")
    .block(
        Block::default()
            .borders(Borders::LEFT | Borders::RIGHT | Borders::BOTTOM)
            .border_style(Style::default().fg(Color::Gray))
            .title(title)
            .title_alignment(Alignment::Right),
    );

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_detail(f: &mut Frame, area: Rect, app: &BrowserApp) {
    let viewport_height = area.height as usize;
    let start = (app.scroll as usize).min(app.detail_lines.len());
    let end = (start + viewport_height).min(app.detail_lines.len());
    let content = app.detail_lines[start..end].join("\n");

    let paragraph = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::RIGHT | Borders::BOTTOM)
                .border_style(Style::default().fg(Color::Gray))
                .title(format!(" [{}/{}] ", start + 1, app.detail_lines.len().max(1)))
                .title_alignment(Alignment::Right),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, area);
}

fn render_footer(f: &mut Frame, area: Rect, app: &BrowserApp, state: &ControllerState) {
    let key = |k: &'static str| Span::styled(k, Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut spans = match app.mode(state) {
        Mode::Search => vec![key(" Enter "), Span::raw(" Apply  "), key(" Esc "), Span::raw(" Done  ")],
        Mode::Detail => vec![
            key(" q "),
            Span::raw(" Back  "),
            key(" j/k "),
            Span::raw(" Scroll  "),
            key(" d "),
            Span::raw(" Delete  "),
        ],
        Mode::ConfirmDelete => vec![key(" y "), Span::raw(" Delete  "), key(" n "), Span::raw(" Cancel  ")],
        Mode::List => vec![
            key(" q "),
            Span::raw(" Quit  "),
            key(" / "),
            Span::raw(" Search  "),
            key(" c "),
            Span::raw(" Category  "),
            key(" a "),
            Span::raw(" Apply  "),
            key(" r "),
            Span::raw(" Reset  "),
            key(" h/l "),
            Span::raw(" Page  "),
            key(" d "),
            Span::raw(" Delete  "),
        ],
    };

    if let Some(status) = &app.status {
        let color = match status.severity {
            Severity::Success => Color::Green,
            Severity::Error => Color::Red,
        };
        spans.push(Span::styled(format!(" {}", status.message), Style::default().fg(color)));
    }

    let footer = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .alignment(Alignment::Center);

    f.render_widget(footer, area);
}

fn render_confirm(f: &mut Frame, state: &ControllerState) {
    let area = centered_rect(50, 7, f.size());
    let message = if state.loading.delete {
        "Deleting…".to_string()
    } else {
        "Are you sure you want to delete this news article?\nThis action cannot be undone.\n\n[y] Delete   [n] Cancel"
            .to_string()
    };

    let dialog = Paragraph::new(message)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Delete News ")
                .title_alignment(Alignment::Center),
        );

    f.render_widget(Clear, area);
    f.render_widget(dialog, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
