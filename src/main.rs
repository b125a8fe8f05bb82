mod config;
mod engine;
mod error;
mod logging;
mod models;
mod store;
mod texts;

use std::collections::VecDeque;
use std::io;
use std::panic;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tracing::{error, info};

use config::{program_dir, AppConfig, Settings, Theme, LOG_FILE};
use error::Error;
use models::Step;
use store::ManifestStore;
use texts::{count, Texts};

enum InputMode {
    Editing,
    Message,
    Confirm,
}

#[derive(Clone, Copy)]
enum Tone {
    Info,
    Warning,
    Danger,
}

struct Palette {
    bg: Color,
    fg: Color,
    muted: Color,
    accent: Color,
    warning: Color,
    danger: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Palette {
                bg: Color::White,
                fg: Color::Black,
                muted: Color::DarkGray,
                accent: Color::Blue,
                warning: Color::Rgb(176, 96, 0),
                danger: Color::Red,
            },
            Theme::Dark => Palette {
                bg: Color::Rgb(32, 32, 32),
                fg: Color::White,
                muted: Color::Gray,
                accent: Color::Cyan,
                warning: Color::Yellow,
                danger: Color::LightRed,
            },
        }
    }

    fn tone(&self, tone: Tone) -> Color {
        match tone {
            Tone::Info => self.accent,
            Tone::Warning => self.warning,
            Tone::Danger => self.danger,
        }
    }
}

struct App {
    texts: &'static Texts,
    palette: Palette,
    store: ManifestStore,

    input_text: String,
    input_mode: InputMode,
    status_msg: String,

    dialog_title: String,
    dialog_lines: Vec<String>,
    dialog_tone: Tone,
    dialog_scroll: u16,

    // Root under review and the policy steps not shown yet.
    review_root: Option<PathBuf>,
    pending: VecDeque<Step>,
    offer: Option<Step>,
}

impl App {
    fn new(settings: Settings, store: ManifestStore, initial_path: String) -> Self {
        let texts = settings.locale.texts();
        App {
            texts,
            palette: Palette::for_theme(settings.theme),
            store,
            input_text: initial_path,
            input_mode: InputMode::Editing,
            status_msg: texts.ready.into(),
            dialog_title: String::new(),
            dialog_lines: vec![],
            dialog_tone: Tone::Info,
            dialog_scroll: 0,
            review_root: None,
            pending: VecDeque::new(),
            offer: None,
        }
    }

    // ----------------------------- dialogs ---------------------------------

    fn show_message(&mut self, tone: Tone, title: &str, lines: Vec<String>) {
        self.dialog_title = title.to_string();
        self.dialog_lines = lines;
        self.dialog_tone = tone;
        self.dialog_scroll = 0;
        self.input_mode = InputMode::Message;
    }

    fn show_offer(&mut self, title: &str, lines: Vec<String>, step: Step) {
        self.show_message(Tone::Warning, title, lines);
        self.offer = Some(step);
        self.input_mode = InputMode::Confirm;
    }

    fn show_error(&mut self, err: &Error) {
        error!(error = %err, "operation failed");
        let title = self.texts.error_title;
        self.show_message(Tone::Danger, title, vec![err.to_string()]);
    }

    fn dismiss(&mut self) {
        self.input_mode = InputMode::Editing;
        self.advance();
    }

    // --------------------------- operations --------------------------------

    fn validated_root(&mut self) -> Option<PathBuf> {
        let raw = self.input_text.trim().trim_matches('"');
        let root = PathBuf::from(raw);
        if raw.is_empty() || !root.exists() {
            let (title, msg) = (self.texts.error_title, self.texts.error_path);
            self.show_message(Tone::Danger, title, vec![msg.into()]);
            return None;
        }
        Some(root)
    }

    fn action_create_list(&mut self) {
        let root = match self.validated_root() {
            Some(r) => r,
            None => return,
        };

        match engine::snapshot(&self.store, &root) {
            Ok(path) => {
                let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
                self.status_msg = format!("{} ({stamp})", self.texts.list_created_title);
                let title = self.texts.list_created_title;
                let lines = vec![
                    self.texts.list_created.to_string(),
                    path.display().to_string(),
                ];
                self.show_message(Tone::Info, title, lines);
            }
            Err(e) => self.show_error(&e),
        }
    }

    fn action_clean(&mut self) {
        let root = match self.validated_root() {
            Some(r) => r,
            None => return,
        };

        match engine::review(&self.store, &root) {
            Ok(review) => {
                self.status_msg = match snapshot_time(review.created_at) {
                    Some(taken) => format!("{} ({taken})", self.texts.check_done),
                    None => self.texts.check_done.into(),
                };
                self.review_root = Some(root);
                self.pending = review.diff.steps().into();
                self.advance();
            }
            Err(e) if e.is_recoverable() => {
                info!(error = %e, "no manifest for root");
                let (title, msg) = (self.texts.error_title, self.texts.error_no_list);
                let mut lines = vec![msg.to_string()];
                if let Ok(expected) = self.store.manifest_path(&root) {
                    lines.push(expected.display().to_string());
                }
                self.show_message(Tone::Warning, title, lines);
            }
            Err(e) => self.show_error(&e),
        }
    }

    /// Opens the dialog for the next pending step, if any.
    fn advance(&mut self) {
        let step = match self.pending.pop_front() {
            Some(s) => s,
            None => {
                self.review_root = None;
                return;
            }
        };

        let t = self.texts;
        match step {
            Step::NoChanges => {
                self.show_message(Tone::Info, t.no_changes_title, vec![t.no_changes.into()]);
            }
            Step::ReportMissingFiles(ref files) => {
                let mut lines = vec![t.missing_files.to_string(), String::new()];
                lines.extend(files.iter().cloned());
                self.show_message(Tone::Warning, t.missing_files_title, lines);
            }
            Step::OfferDeleteFiles(ref files) => {
                let mut lines = vec![count(t.unlisted_files, files.len()), String::new()];
                lines.extend(files.iter().cloned());
                self.show_offer(t.unlisted_files_title, lines, step.clone());
            }
            Step::OfferDeleteFolders(ref folders) => {
                let mut lines = vec![count(t.delete_folders, folders.len()), String::new()];
                lines.extend(folders.iter().cloned());
                self.show_offer(t.new_folders_title, lines, step.clone());
            }
        }
    }

    fn answer_offer(&mut self, accepted: bool) {
        let step = self.offer.take();
        self.input_mode = InputMode::Editing;

        let root = match self.review_root.clone() {
            Some(root) if accepted => root,
            _ => {
                self.advance();
                return;
            }
        };

        let t = self.texts;
        match step {
            Some(Step::OfferDeleteFiles(files)) => {
                let report = engine::delete_files(&root, &files);
                self.status_msg = count(t.files_deleted, report.deleted.len());
                if !report.is_complete() {
                    let mut lines = vec![count(t.delete_failed, report.failed.len()), String::new()];
                    lines.extend(
                        report
                            .failed
                            .iter()
                            .map(|(path, reason)| format!("{path}: {reason}")),
                    );
                    self.show_message(Tone::Danger, t.delete_failed_title, lines);
                    return;
                }
            }
            Some(Step::OfferDeleteFolders(folders)) => match engine::delete_folders(&root, &folders) {
                Ok(removed) => self.status_msg = count(t.folders_deleted, removed.len()),
                Err(e) => {
                    self.show_error(&e);
                    return;
                }
            },
            _ => {}
        }
        self.advance();
    }
}

// ------------------------- UI helpers / main ------------------------------

/// Local time of a snapshot; manifests without a timestamp have none.
fn snapshot_time(created_at: u64) -> Option<String> {
    if created_at == 0 {
        return None;
    }
    let taken = DateTime::from_timestamp(i64::try_from(created_at).ok()?, 0)?;
    Some(taken.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn draw(f: &mut Frame, app: &App) {
    let p = &app.palette;
    let t = app.texts;
    let base = Style::default().fg(p.fg).bg(p.bg);

    f.render_widget(Block::default().style(base), f.size());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.size());

    let header = Paragraph::new(format!(" -- {} -- {}", t.title, app.store.backup_dir().display()))
        .style(Style::default().fg(p.bg).bg(p.accent).add_modifier(Modifier::BOLD));
    f.render_widget(header, chunks[0]);

    let editing = matches!(app.input_mode, InputMode::Editing);
    let input_style = if app.input_text.is_empty() {
        Style::default().fg(p.muted)
    } else {
        base
    };
    let shown = if app.input_text.is_empty() {
        t.placeholder.to_string()
    } else {
        app.input_text.clone()
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .title(t.path_label)
        .border_style(Style::default().fg(if editing { p.accent } else { p.muted }));
    let input_inner = input_block.inner(chunks[1]);
    f.render_widget(
        Paragraph::new(shown).style(input_style).block(input_block),
        chunks[1],
    );

    let body = vec![
        Line::from(vec![
            Span::styled("[F1] ", Style::default().fg(p.accent).add_modifier(Modifier::BOLD)),
            Span::raw(t.create_list),
        ]),
        Line::from(vec![
            Span::styled("[F2] ", Style::default().fg(p.accent).add_modifier(Modifier::BOLD)),
            Span::raw(t.clean_mods),
        ]),
        Line::from(vec![
            Span::styled("[Esc] ", Style::default().fg(p.accent).add_modifier(Modifier::BOLD)),
            Span::raw(t.quit),
        ]),
    ];
    f.render_widget(
        Paragraph::new(body).block(Block::default().borders(Borders::ALL)),
        chunks[2],
    );

    f.render_widget(
        Paragraph::new(app.status_msg.clone())
            .style(Style::default().fg(p.muted))
            .block(Block::default().borders(Borders::ALL)),
        chunks[3],
    );

    if editing {
        let max_width = input_inner.width.saturating_sub(1);
        let len = app.input_text.chars().count() as u16;
        f.set_cursor(input_inner.x + len.min(max_width), input_inner.y);
        return;
    }

    let r = centered_rect(70, 60, f.size());
    f.render_widget(Clear, r);
    let color = p.tone(app.dialog_tone);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", app.dialog_title))
        .border_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .style(base);
    let inner = block.inner(r);
    f.render_widget(block, r);

    let parts = Layout::default()
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let lines: Vec<Line> = app
        .dialog_lines
        .iter()
        .map(|l| Line::from(l.as_str()))
        .collect();
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((app.dialog_scroll, 0)),
        parts[0],
    );

    let hint = match app.input_mode {
        InputMode::Confirm => t.hint_confirm,
        _ => t.hint_continue,
    };
    f.render_widget(
        Paragraph::new(hint).style(Style::default().fg(color)),
        parts[1],
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base_dir = program_dir();
    let config = AppConfig::load(&base_dir)?;
    let _ = logging::init(&base_dir.join(LOG_FILE));

    let settings = config.settings();
    let store = ManifestStore::new(config.store_config());
    info!(
        backup_dir = %store.backup_dir().display(),
        theme = ?settings.theme,
        locale = ?settings.locale,
        "starting"
    );
    let initial_path = std::env::args().nth(1).unwrap_or_default();

    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut app = App::new(settings, store, initial_path);

    loop {
        terminal.draw(|f| draw(f, &app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let key = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => key,
            _ => continue,
        };

        match app.input_mode {
            InputMode::Editing => match key.code {
                KeyCode::Esc => break,
                KeyCode::F(1) => app.action_create_list(),
                KeyCode::F(2) => app.action_clean(),
                KeyCode::Backspace => {
                    app.input_text.pop();
                }
                KeyCode::Char(c) => app.input_text.push(c),
                _ => {}
            },
            InputMode::Message => match key.code {
                KeyCode::Enter | KeyCode::Esc => app.dismiss(),
                KeyCode::Down => app.dialog_scroll = app.dialog_scroll.saturating_add(1),
                KeyCode::Up => app.dialog_scroll = app.dialog_scroll.saturating_sub(1),
                _ => {}
            },
            InputMode::Confirm => match key.code {
                KeyCode::Char(c) if app.texts.yes_keys.contains(&c) => app.answer_offer(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.answer_offer(false),
                KeyCode::Down => app.dialog_scroll = app.dialog_scroll.saturating_add(1),
                KeyCode::Up => app.dialog_scroll = app.dialog_scroll.saturating_sub(1),
                _ => {}
            },
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    info!("exiting");
    Ok(())
}
