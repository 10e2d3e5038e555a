use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use brainely_core::auth::Route;

use crate::app::{App, AppState, FormFocus};

/// Handle a key press. Returns `true` when the app should exit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Debug overlay toggles from anywhere
    if key.code == KeyCode::F(12) {
        app.toggle_debug();
        return Ok(false);
    }

    // A blocking alert swallows everything until dismissed
    if app.alert.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            app.dismiss_alert();
        }
        return Ok(false);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        return Ok(handle_quit_confirm(app, key));
    }

    match app.route() {
        Route::Home => handle_home_input(app, key),
        Route::SignIn | Route::SignUp => handle_form_input(app, key),
        Route::Dashboard => handle_dashboard_input(app, key),
    }
    Ok(matches!(app.state, AppState::Quitting))
}

fn handle_quit_confirm(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            app.state = AppState::Quitting;
            true
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.state = AppState::Normal;
            false
        }
        _ => false,
    }
}

fn handle_home_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('s') | KeyCode::Enter => app.go_to(Route::SignIn),
        KeyCode::Char('u') => app.go_to(Route::SignUp),
        KeyCode::Char('q') | KeyCode::Esc => app.state = AppState::ConfirmingQuit,
        _ => {}
    }
}

fn handle_dashboard_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('l') => app.sign_out(),
        KeyCode::Char('q') | KeyCode::Esc => app.state = AppState::ConfirmingQuit,
        _ => {}
    }
}

fn handle_form_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.go_to(Route::Home),
        KeyCode::F(2) => {
            let other = if app.route() == Route::SignIn {
                Route::SignUp
            } else {
                Route::SignIn
            };
            app.go_to(other);
        }
        KeyCode::Down | KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::Up | KeyCode::BackTab => app.focus = app.focus.prev(),
        KeyCode::Enter => match app.focus {
            FormFocus::Username => app.focus = FormFocus::Password,
            FormFocus::Password | FormFocus::Button => app.submit(),
        },
        KeyCode::Backspace => app.pop_char(),
        KeyCode::Char(c) => app.push_char(c),
        _ => {}
    }
}
