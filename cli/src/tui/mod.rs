pub mod app;
pub mod form;
pub mod ui;

use std::io;
use anyhow::{bail, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use taskdesk_core::{AppConfig, HttpTaskService, TaskApi, TaskService, TokenStore};

use crate::tui::app::{App, Mode};

pub fn run(config: &AppConfig, store: &TokenStore) -> Result<()> {
    // Nothing is drawn without a live session.
    let session = store.require_session()?;
    let api = HttpTaskService::new(config, Some(session.token))?;
    let mut app = App::new(TaskService::new(api));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res?;

    if app.session_lost {
        bail!("session rejected by the server; run `taskdesk login`");
    }
    if app.logout_requested {
        crate::commands::logout(store)?;
    }
    Ok(())
}

fn run_app<B: Backend, A: TaskApi>(terminal: &mut Terminal<B>, app: &mut App<A>) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))
            .map_err(|e| io::Error::other(e.to_string()))?;

        if app.should_quit {
            return Ok(());
        }

        if app.needs_reload() {
            app.reload();
            continue;
        }

        if event::poll(std::time::Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key);
                }
            }
        }
    }
}

fn handle_key<A: TaskApi>(app: &mut App<A>, key: KeyEvent) {
    match app.mode {
        Mode::Normal => {
            app.flash = None;
            match key.code {
                KeyCode::Char('q') => app.should_quit = true,
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Char('n') => app.open_create_form(),
                KeyCode::Char('e') | KeyCode::Enter => app.open_edit_form(),
                KeyCode::Char('s') | KeyCode::Char(' ') => app.open_status_picker(),
                KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
                KeyCode::Char('a') => app.enter_add_mode(),
                KeyCode::Char('f') => app.cycle_status_filter(),
                KeyCode::Char('p') => app.cycle_priority_filter(),
                KeyCode::Char('o') => app.cycle_sort(),
                KeyCode::Char('r') => app.retry(),
                KeyCode::Char('L') => app.request_logout(),
                _ => {}
            }
        },
        Mode::QuickAdd => {
            match key.code {
                KeyCode::Enter => app.submit_quick_add(),
                KeyCode::Esc => app.close_modal(),
                KeyCode::Char(c) => app.input_char(c),
                KeyCode::Backspace => app.delete_char(),
                KeyCode::Left => app.move_cursor_left(),
                KeyCode::Right => app.move_cursor_right(),
                _ => {}
            }
        },
        Mode::Form(_) => handle_form_key(app, key),
        Mode::ConfirmDelete { .. } => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(),
                KeyCode::Char('n') | KeyCode::Esc => app.close_modal(),
                _ => {}
            }
        },
        Mode::StatusPicker { .. } => {
            match key.code {
                KeyCode::Down | KeyCode::Char('j') => app.picker_move(true),
                KeyCode::Up | KeyCode::Char('k') => app.picker_move(false),
                KeyCode::Enter => app.confirm_status(),
                KeyCode::Esc => app.close_modal(),
                _ => {}
            }
        }
    }
}

fn handle_form_key<A: TaskApi>(app: &mut App<A>, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => return app.submit_form(),
        KeyCode::Esc => return app.close_modal(),
        _ => {}
    }
    let Some(state) = app.form_mut() else { return };
    match key.code {
        KeyCode::Tab | KeyCode::Down => state.focus_next(),
        KeyCode::BackTab | KeyCode::Up => state.focus_previous(),
        KeyCode::Left => state.left(),
        KeyCode::Right => state.right(),
        KeyCode::Backspace => state.delete_char(),
        KeyCode::Char(c) => state.input_char(c),
        _ => {}
    }
}
