// Terminal UI: the root view mounted by the client bootstrap
// Renders the server's view of a game and turns key presses into API calls

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Span, Spans, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::error::Error;
use std::io;
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

use crate::ms_client::ApiClient;
use crate::ms_color::Palette;
use crate::ms_config::{Config, Difficulty, save_config};
use crate::ms_game::{CellView, Status};
use crate::ms_lang::{Lang, fill};
use crate::ms_wire::GameView;

const MENU: [(&str, MenuAction); 8] = [
    ("F1", MenuAction::Help),
    ("F2", MenuAction::New),
    ("F3", MenuAction::Games),
    ("F4", MenuAction::Records),
    ("F5", MenuAction::Difficulty),
    ("F7", MenuAction::Options),
    ("F9", MenuAction::About),
    ("Esc", MenuAction::Exit),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Help,
    New,
    Games,
    Records,
    Difficulty,
    Options,
    About,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Modal {
    None,
    SignIn,
    Help,
    Games { selected: usize },
    Records,
    Difficulty { selected: usize },
    Options { focus: u8 },
    About,
    Win { secs: u64, new_record: bool },
    Loss,
}

struct UiState {
    modal: Modal,
    game: Option<GameView>,
    cursor: (usize, usize),
    recent: Vec<GameView>,
    email_input: String,
    // last server error, shown in the status row for a while
    error: Option<(String, Instant)>,
    board_rect: Option<Rect>,
    exit: bool,
}

impl UiState {
    fn new(email: &str) -> Self {
        UiState {
            modal: Modal::SignIn,
            game: None,
            cursor: (0, 0),
            recent: Vec::new(),
            email_input: email.to_string(),
            error: None,
            board_rect: None,
            exit: false,
        }
    }

    fn set_game(&mut self, game: GameView) {
        if self.cursor.0 >= game.cols || self.cursor.1 >= game.rows {
            self.cursor = (0, 0);
        }
        self.game = Some(game);
    }

    fn step_cursor(&mut self, dx: isize, dy: isize) {
        if let Some(g) = &self.game {
            let nx = (self.cursor.0 as isize + dx).clamp(0, g.cols as isize - 1) as usize;
            let ny = (self.cursor.1 as isize + dy).clamp(0, g.rows as isize - 1) as usize;
            self.cursor = (nx, ny);
        }
    }

    fn fail(&mut self, e: impl std::fmt::Display) {
        log::warn!("{e}");
        self.error = Some((e.to_string(), Instant::now()));
    }

    fn elapsed_secs(&self) -> u64 {
        match &self.game {
            Some(g) => g
                .duration_secs()
                .unwrap_or_else(|| (chrono::Utc::now() - g.created_at).num_seconds().max(0) as u64),
            None => 0,
        }
    }
}

/// Run the UI until the player exits. The terminal is restored even when
/// the loop fails.
pub fn run(client: ApiClient, cfg: &mut Config, lang: &mut Lang) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnableMouseCapture, terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, client, cfg, lang);

    save_config(cfg);
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, terminal::LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    mut client: ApiClient,
    cfg: &mut Config,
    lang: &mut Lang,
) -> Result<(), Box<dyn Error>> {
    let palette = Palette::detect();
    let mut ui = UiState::new(&cfg.player);
    if !cfg.player.is_empty() {
        sign_in(&mut client, &mut ui, cfg);
    }

    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    while !ui.exit {
        let mut board_rect = None;
        terminal.draw(|f| {
            board_rect = draw(f, &ui, cfg, lang, &palette, client.base_url());
        })?;
        ui.board_rect = board_rect;

        if let Some((_, t0)) = &ui.error {
            if t0.elapsed() > Duration::from_secs(5) {
                ui.error = None;
            }
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. }) => {
                    on_key(code, &mut client, &mut ui, cfg, lang)
                }
                Event::Mouse(me) => on_mouse(me, &client, &mut ui, cfg),
                _ => {}
            }
        }
        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
    Ok(())
}

fn sign_in(client: &mut ApiClient, ui: &mut UiState, cfg: &mut Config) {
    let email = ui.email_input.trim().to_string();
    if email.is_empty() {
        return;
    }
    match client.sign_in(&email) {
        Ok(games) => {
            cfg.player = email;
            save_config(cfg);
            ui.modal = Modal::None;
            ui.error = None;
            // pick up where the player left off
            if let Some(open) = games.iter().find(|g| !g.finished) {
                ui.set_game(open.clone());
            }
            ui.recent = games;
        }
        Err(e) => {
            ui.modal = Modal::SignIn;
            ui.fail(e);
        }
    }
}

fn new_game(client: &ApiClient, ui: &mut UiState, cfg: &Config) {
    let (cols, rows, bombs) = cfg.difficulty.params();
    match client.create_game(cols, rows, bombs) {
        Ok(game) => {
            ui.cursor = (game.cols / 2, game.rows / 2);
            ui.set_game(game);
        }
        Err(e) => ui.fail(e),
    }
}

/// Send a cell change and react to the end of the game.
fn change_cell(client: &ApiClient, ui: &mut UiState, cfg: &mut Config, (x, y): (usize, usize), status: Status) {
    let Some(uuid) = ui.game.as_ref().map(|g| g.uuid) else {
        return;
    };
    match client.update_cell(uuid, x, y, status) {
        Ok(game) => {
            if game.finished {
                ui.modal = if game.won {
                    let secs = game.duration_secs().unwrap_or(0);
                    let new_record = Difficulty::for_board(game.cols, game.rows, game.bombs)
                        .is_some_and(|d| cfg.set_record(&d, secs));
                    if new_record {
                        save_config(cfg);
                    }
                    Modal::Win { secs, new_record }
                } else {
                    Modal::Loss
                };
            }
            ui.set_game(game);
        }
        Err(e) => ui.fail(e),
    }
}

fn reveal(client: &ApiClient, ui: &mut UiState, cfg: &mut Config, at: (usize, usize)) {
    let covered = ui
        .game
        .as_ref()
        .filter(|g| !g.finished)
        .and_then(|g| g.cell(at.0, at.1))
        == Some(CellView::Covered);
    if covered {
        change_cell(client, ui, cfg, at, Status::Uncovered);
    }
}

fn toggle_flag(client: &ApiClient, ui: &mut UiState, cfg: &mut Config, at: (usize, usize)) {
    let next = match ui.game.as_ref().filter(|g| !g.finished).and_then(|g| g.cell(at.0, at.1)) {
        Some(CellView::Covered) => Status::Flagged,
        Some(CellView::Flagged) => Status::Covered,
        _ => return,
    };
    change_cell(client, ui, cfg, at, next);
}

fn open_menu(action: MenuAction, client: &ApiClient, ui: &mut UiState, cfg: &mut Config) {
    match action {
        MenuAction::Help => ui.modal = Modal::Help,
        MenuAction::New => new_game(client, ui, cfg),
        MenuAction::Games => match client.list_games() {
            Ok(games) => {
                ui.recent = games;
                ui.modal = Modal::Games { selected: 0 };
            }
            Err(e) => ui.fail(e),
        },
        MenuAction::Records => ui.modal = Modal::Records,
        MenuAction::Difficulty => {
            ui.modal = Modal::Difficulty {
                selected: cfg.difficulty.to_index(),
            }
        }
        MenuAction::Options => ui.modal = Modal::Options { focus: 0 },
        MenuAction::About => ui.modal = Modal::About,
        MenuAction::Exit => ui.exit = true,
    }
}

fn on_key(code: KeyCode, client: &mut ApiClient, ui: &mut UiState, cfg: &mut Config, lang: &mut Lang) {
    match ui.modal.clone() {
        Modal::SignIn => match code {
            KeyCode::Char(c) if !c.is_whitespace() && ui.email_input.len() < 254 => ui.email_input.push(c),
            KeyCode::Backspace => {
                ui.email_input.pop();
            }
            KeyCode::Enter => sign_in(client, ui, cfg),
            KeyCode::Esc => ui.exit = true,
            _ => {}
        },
        Modal::Games { selected } => match code {
            KeyCode::Up => ui.modal = Modal::Games { selected: selected.saturating_sub(1) },
            KeyCode::Down => {
                let last = ui.recent.len().saturating_sub(1);
                ui.modal = Modal::Games { selected: (selected + 1).min(last) }
            }
            KeyCode::Enter => {
                if let Some(uuid) = ui.recent.get(selected).map(|g| g.uuid) {
                    match client.game(uuid) {
                        Ok(game) => ui.set_game(game),
                        Err(e) => ui.fail(e),
                    }
                }
                ui.modal = Modal::None;
            }
            _ => ui.modal = Modal::None,
        },
        Modal::Difficulty { selected } => match code {
            KeyCode::Up => ui.modal = Modal::Difficulty { selected: selected.saturating_sub(1) },
            KeyCode::Down => ui.modal = Modal::Difficulty { selected: (selected + 1).min(3) },
            KeyCode::Char(c @ '1'..='4') => {
                ui.modal = Modal::Difficulty {
                    selected: c as usize - '1' as usize,
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                cfg.difficulty = Difficulty::from_index(selected, cfg.custom_cols, cfg.custom_rows, cfg.custom_bombs);
                save_config(cfg);
                ui.modal = Modal::None;
                new_game(client, ui, cfg);
            }
            _ => ui.modal = Modal::None,
        },
        Modal::Options { focus } => match code {
            KeyCode::Up => ui.modal = Modal::Options { focus: focus.saturating_sub(1) },
            KeyCode::Down => ui.modal = Modal::Options { focus: (focus + 1).min(2) },
            KeyCode::Enter | KeyCode::Char(' ') => {
                match focus {
                    0 => cfg.show_indicator = !cfg.show_indicator,
                    1 => cfg.ascii_icons = !cfg.ascii_icons,
                    _ => {
                        lang.switch_to(lang.toggled_code());
                        cfg.language = lang.current_lang.clone();
                    }
                }
                save_config(cfg);
            }
            _ => ui.modal = Modal::None,
        },
        Modal::None => match code {
            KeyCode::Esc => ui.exit = true,
            KeyCode::F(n) => {
                let key = format!("F{n}");
                if let Some((_, action)) = MENU.iter().find(|(k, _)| *k == key) {
                    open_menu(*action, client, ui, cfg);
                }
            }
            KeyCode::Left => ui.step_cursor(-1, 0),
            KeyCode::Right => ui.step_cursor(1, 0),
            KeyCode::Up => ui.step_cursor(0, -1),
            KeyCode::Down => ui.step_cursor(0, 1),
            KeyCode::Char(' ') | KeyCode::Enter => {
                let at = ui.cursor;
                reveal(client, ui, cfg, at);
            }
            KeyCode::Char('f') | KeyCode::Char('F') => {
                let at = ui.cursor;
                toggle_flag(client, ui, cfg, at);
            }
            _ => {}
        },
        // informational modals close on any key
        _ => ui.modal = Modal::None,
    }
}

fn on_mouse(me: MouseEvent, client: &ApiClient, ui: &mut UiState, cfg: &mut Config) {
    if ui.modal != Modal::None {
        return;
    }
    let (Some(brect), Some(game)) = (ui.board_rect, ui.game.as_ref()) else {
        return;
    };
    let inner = Rect::new(
        brect.x + 1,
        brect.y + 1,
        brect.width.saturating_sub(2),
        brect.height.saturating_sub(2),
    );
    if me.column < inner.x || me.row < inner.y {
        return;
    }
    // every cell is two columns wide
    let cx = ((me.column - inner.x) / 2) as usize;
    let cy = (me.row - inner.y) as usize;
    if cx >= game.cols || cy >= game.rows {
        return;
    }
    match me.kind {
        MouseEventKind::Moved => ui.cursor = (cx, cy),
        MouseEventKind::Down(MouseButton::Left) => {
            ui.cursor = (cx, cy);
            reveal(client, ui, cfg, (cx, cy));
        }
        MouseEventKind::Down(MouseButton::Right) => {
            ui.cursor = (cx, cy);
            toggle_flag(client, ui, cfg, (cx, cy));
        }
        _ => {}
    }
}

fn menu_label(action: MenuAction, lang: &Lang) -> &'static str {
    let a = &lang.assets;
    match action {
        MenuAction::Help => a.menu_help,
        MenuAction::New => a.menu_new,
        MenuAction::Games => a.menu_games,
        MenuAction::Records => a.menu_records,
        MenuAction::Difficulty => a.menu_difficulty,
        MenuAction::Options => a.menu_options,
        MenuAction::About => a.menu_about,
        MenuAction::Exit => a.menu_exit,
    }
}

/// Text and style for one cell
fn glyph(cell: CellView, ascii: bool, palette: &Palette) -> (String, Style) {
    let base = Style::default().bg(palette.board_bg);
    match cell {
        CellView::Covered => ((if ascii { "#" } else { "■" }).to_string(), base.fg(palette.covered)),
        CellView::Flagged => ((if ascii { "F" } else { "⚑" }).to_string(), base.fg(palette.flag)),
        CellView::Bomb => (
            (if ascii { "*" } else { "☼" }).to_string(),
            base.fg(palette.bomb).bg(palette.bomb_bg),
        ),
        CellView::Count(0) => (" ".to_string(), base),
        CellView::Count(n) => (n.to_string(), base.fg(palette.number(n)).add_modifier(Modifier::BOLD)),
    }
}

/// Draw one frame; returns the board area for mouse hit-testing.
fn draw<B: Backend>(
    f: &mut Frame<B>,
    ui: &UiState,
    cfg: &Config,
    lang: &Lang,
    palette: &Palette,
    server: &str,
) -> Option<Rect> {
    let a = &lang.assets;
    let size = f.size();
    let (min_width, min_height) = min_size(ui.game.as_ref());
    if size.width < min_width || size.height < min_height {
        let warn = Paragraph::new(Text::from(vec![
            Spans::from(Span::raw(a.tsmsg_line1)),
            Spans::from(Span::raw(fill(a.tsmsg_line2_fmt, &[&min_width, &min_height]))),
        ]))
        .block(Block::default().borders(Borders::ALL).title(a.tsmsg_title))
        .alignment(Alignment::Center);
        f.render_widget(Clear, size);
        let area = center_rect(40u16.min(size.width), 5u16.min(size.height), size);
        f.render_widget(warn, area);
        return None;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(6), Constraint::Length(3)].as_ref())
        .split(size);

    // menu row, Esc lives in the status row
    let key_style = Style::default().fg(palette.menu_key).add_modifier(Modifier::BOLD);
    let mut menu = vec![Span::raw(" ")];
    for (i, (key, action)) in MENU.iter().take(MENU.len() - 1).enumerate() {
        if i > 0 {
            menu.push(Span::raw("  "));
        }
        menu.push(Span::styled(*key, key_style));
        menu.push(Span::raw(format!(": {}", menu_label(*action, lang))));
    }
    f.render_widget(
        Paragraph::new(Spans::from(menu)).block(Block::default().borders(Borders::ALL)),
        chunks[0],
    );

    // status row: counters or the last error on the left, Esc on the right
    let (left, left_style) = match (&ui.error, &ui.game) {
        (Some((msg, _)), _) => (fill(a.error_fmt, &[msg]), Style::default().fg(palette.error)),
        (None, Some(g)) => (
            fill(a.status_fmt, &[&g.remaining_bombs(), &ui.elapsed_secs()]),
            Style::default(),
        ),
        (None, None) => (a.status_no_game.to_string(), Style::default()),
    };
    let player = format!("{}  ", cfg.player);
    let right = format!("Esc: {} ", a.menu_exit);
    let inner_w = chunks[2].width.saturating_sub(2) as usize;
    let used = left.as_str().width() + player.as_str().width() + right.as_str().width();
    let gap = inner_w.saturating_sub(used).max(1);
    let status = Spans::from(vec![
        Span::styled(left, left_style),
        Span::raw(" ".repeat(gap)),
        Span::raw(player),
        Span::styled("Esc", key_style),
        Span::raw(format!(": {} ", a.menu_exit)),
    ]);
    f.render_widget(
        Paragraph::new(status).block(Block::default().borders(Borders::ALL)),
        chunks[2],
    );

    // board
    let mut board_rect = None;
    if let Some(game) = &ui.game {
        let area = center_rect((game.cols as u16) * 2 + 3, game.rows as u16 + 2, chunks[1]);
        let mut lines = Vec::with_capacity(game.rows);
        for y in 0..game.rows {
            let mut spans = Vec::with_capacity(game.cols * 2 + 1);
            for x in 0..game.cols {
                let cell = game.cell(x, y).unwrap_or(CellView::Covered);
                let (s, mut style) = glyph(cell, cfg.ascii_icons, palette);
                if ui.cursor == (x, y) && !game.finished {
                    style = style.bg(palette.cursor_bg);
                }
                if cfg.show_indicator && ui.cursor == (x, y) {
                    spans.push(Span::styled("▸", style.fg(palette.indicator)));
                    spans.push(Span::styled(s, style));
                } else {
                    spans.push(Span::styled(format!(" {s}"), style));
                }
            }
            spans.push(Span::styled(" ", Style::default().bg(palette.board_bg)));
            lines.push(Spans::from(spans));
        }
        let title = match Difficulty::for_board(game.cols, game.rows, game.bombs) {
            Some(d) => lang.diff_name(d.to_index()).to_string(),
            None => fill(a.diff_size_fmt, &[&game.cols, &game.rows, &game.bombs]),
        };
        f.render_widget(
            Paragraph::new(Text::from(lines)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .title_alignment(Alignment::Center),
            ),
            area,
        );
        board_rect = Some(area);
    }

    draw_modal(f, ui, cfg, lang, palette, server, size);
    board_rect
}

fn draw_modal<B: Backend>(
    f: &mut Frame<B>,
    ui: &UiState,
    cfg: &Config,
    lang: &Lang,
    palette: &Palette,
    server: &str,
    size: Rect,
) {
    let a = &lang.assets;
    let selected = Style::default().bg(palette.cursor_bg).add_modifier(Modifier::BOLD);
    let (title, lines): (String, Vec<Spans>) = match &ui.modal {
        Modal::None => return,
        Modal::SignIn => (
            a.sign_in_title.to_string(),
            vec![
                Spans::from(Span::raw("")),
                Spans::from(vec![
                    Span::raw(format!(" {} ", a.sign_in_prompt)),
                    Span::styled(format!("{}_", ui.email_input), selected),
                ]),
                Spans::from(Span::raw("")),
                Spans::from(Span::raw(format!(" {}", a.sign_in_waiting))),
            ],
        ),
        Modal::Help => (
            a.menu_help.to_string(),
            [a.help_controls, a.help_move, a.help_reveal, a.help_flag, a.help_games]
                .into_iter()
                .map(|l| Spans::from(Span::raw(l)))
                .collect(),
        ),
        Modal::Games { selected: sel } => {
            let mut lines = vec![];
            if ui.recent.is_empty() {
                lines.push(Spans::from(Span::raw(format!(" {}", a.games_empty))));
            }
            for (i, g) in ui.recent.iter().enumerate() {
                let state = match (g.finished, g.won) {
                    (false, _) => a.games_playing,
                    (true, true) => a.games_won,
                    (true, false) => a.games_lost,
                };
                let uuid = g.uuid.simple().to_string();
                let line = format!(
                    " {}  {}x{}/{}  {}  {} ",
                    &uuid[..8],
                    g.cols,
                    g.rows,
                    g.bombs,
                    g.created_at.with_timezone(&chrono::Local).format("%m-%d %H:%M"),
                    state
                );
                let style = if i == *sel { selected } else { Style::default() };
                lines.push(Spans::from(Span::styled(line, style)));
            }
            (a.games_title.to_string(), lines)
        }
        Modal::Records => {
            let mut lines = vec![Spans::from(Span::raw(format!(" {}", a.rec_best_time)))];
            for d in [Difficulty::Beginner, Difficulty::Intermediate, Difficulty::Expert] {
                let value = match cfg.get_record_detail(&d) {
                    Some((secs, date)) => format!("{secs}s  {}", lang.format_date(&date)),
                    None => a.rec_no_record.to_string(),
                };
                lines.push(Spans::from(Span::raw(format!("  {:<14}{}", lang.diff_name(d.to_index()), value))));
            }
            (a.menu_records.to_string(), lines)
        }
        Modal::Difficulty { selected: sel } => {
            let lines = (0..4)
                .map(|i| {
                    let d = Difficulty::from_index(i, cfg.custom_cols, cfg.custom_rows, cfg.custom_bombs);
                    let (c, r, b) = d.params();
                    let line = format!(
                        " {}. {:<14}{} ",
                        i + 1,
                        lang.diff_name(i),
                        fill(a.diff_size_fmt, &[&c, &r, &b])
                    );
                    let style = if i == *sel { selected } else { Style::default() };
                    Spans::from(Span::styled(line, style))
                })
                .collect();
            (a.menu_difficulty.to_string(), lines)
        }
        Modal::Options { focus } => {
            let check = |on: bool| if on { "[x]" } else { "[ ]" };
            let items = [
                format!(" {} {}", check(cfg.show_indicator), a.opt_show_indicator),
                format!(" {} {}", check(cfg.ascii_icons), a.opt_ascii_icons),
                format!("     {}: {}", a.opt_language, lang.language_name()),
            ];
            let lines = items
                .into_iter()
                .enumerate()
                .map(|(i, s)| {
                    let style = if i as u8 == *focus { selected } else { Style::default() };
                    Spans::from(Span::styled(s, style))
                })
                .collect();
            (a.menu_options.to_string(), lines)
        }
        Modal::About => (
            a.menu_about.to_string(),
            vec![
                Spans::from(Span::raw(a.about_description)),
                Spans::from(Span::raw(fill(
                    a.about_version_fmt,
                    &[&env!("CARGO_PKG_VERSION"), &env!("CARGO_PKG_AUTHORS")],
                ))),
                Spans::from(Span::raw(fill(a.about_server_fmt, &[&server]))),
            ],
        ),
        Modal::Win { secs, new_record } => {
            let fmt = if *new_record { a.win_time_record_fmt } else { a.win_time_fmt };
            (
                a.win_title.to_string(),
                vec![
                    Spans::from(Span::raw(a.win_message)),
                    Spans::from(Span::raw(fill(fmt, &[secs]))),
                ],
            )
        }
        Modal::Loss => (
            a.loss_title.to_string(),
            vec![Spans::from(Span::styled(a.loss_message, Style::default().fg(palette.error)))],
        ),
    };

    let width = lines
        .iter()
        .map(|l| l.width() as u16)
        .max()
        .unwrap_or(0)
        .max(title.as_str().width() as u16 + 4)
        .saturating_add(4)
        .min(size.width);
    let height = (lines.len() as u16 + 4).min(size.height);
    let area = center_rect(width, height, size);
    let mut body = lines;
    body.push(Spans::from(Span::raw("")));
    body.push(Spans::from(Span::styled(
        format!("[ {} ]", a.btn_close),
        Style::default().add_modifier(Modifier::DIM),
    )));
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(Text::from(body))
            .block(Block::default().borders(Borders::ALL).title(title))
            .alignment(if matches!(ui.modal, Modal::Win { .. } | Modal::Loss | Modal::About) {
                Alignment::Center
            } else {
                Alignment::Left
            }),
        area,
    );
}

/// Smallest terminal that shows the menu, the status row and the whole board
fn min_size(game: Option<&GameView>) -> (u16, u16) {
    let (cols, rows) = game.map_or((0, 0), |g| (g.cols, g.rows));
    // cells are two columns wide, plus the trailing pad and borders
    let width = 80u16.max((cols * 2 + 3) as u16);
    let height = 24u16 + rows.saturating_sub(16) as u16;
    (width, height)
}

fn center_rect(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + r.width.saturating_sub(width) / 2;
    let y = r.y + r.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ms_color::Depth;

    #[test]
    fn center_rect_stays_inside() {
        let outer = Rect::new(0, 0, 80, 24);
        assert_eq!(center_rect(20, 10, outer), Rect::new(30, 7, 20, 10));
        let small = center_rect(100, 50, outer);
        assert_eq!(small, Rect::new(0, 0, 80, 24));
    }

    #[test]
    fn glyphs_for_each_cell_kind() {
        let palette = Palette::new(Depth::Basic);
        assert_eq!(glyph(CellView::Covered, true, &palette).0, "#");
        assert_eq!(glyph(CellView::Flagged, true, &palette).0, "F");
        assert_eq!(glyph(CellView::Bomb, false, &palette).0, "☼");
        assert_eq!(glyph(CellView::Count(0), false, &palette).0, " ");
        assert_eq!(glyph(CellView::Count(3), false, &palette).0, "3");
    }

    #[test]
    fn menu_keys_are_unique() {
        for (i, (a, _)) in MENU.iter().enumerate() {
            assert!(MENU.iter().skip(i + 1).all(|(b, _)| a != b));
        }
    }

    fn game(cols: usize, rows: usize) -> GameView {
        GameView {
            uuid: uuid::Uuid::new_v4(),
            board: vec![vec![CellView::Covered; rows]; cols],
            cols,
            rows,
            bombs: 1,
            finished: false,
            won: false,
            created_at: chrono::Utc::now(),
            finished_at: None,
        }
    }

    #[test]
    fn wide_and_tall_boards_need_a_bigger_terminal() {
        assert_eq!(min_size(None), (80, 24));
        assert_eq!(min_size(Some(&game(30, 16))), (80, 24));
        assert_eq!(min_size(Some(&game(100, 20))), (203, 28));
    }

    #[test]
    fn cursor_is_clamped_to_the_board() {
        let mut ui = UiState::new("");
        ui.set_game(game(3, 2));
        ui.step_cursor(-1, -1);
        assert_eq!(ui.cursor, (0, 0));
        ui.step_cursor(5, 5);
        assert_eq!(ui.cursor, (2, 1));
    }
}
