use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use brainely_core::auth::{AuthMode, FlowState, Route, TOKEN_KEY};

use crate::app::{App, AppState, FormFocus};

use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[2]);

    match app.route() {
        Route::Home => render_home(frame, chunks[1]),
        Route::SignIn | Route::SignUp => render_form(frame, app, chunks[1]),
        Route::Dashboard => render_dashboard(frame, app, chunks[1]),
    }

    // Render overlays
    if app.show_debug {
        render_debug_overlay(frame, app);
    }

    if let Some(ref alert) = app.alert {
        render_alert(frame, alert);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!("  {}", app.config.app_name);
    let hint = "[F12] Debug";

    let title_line = Line::from(vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title.len() as u16 + hint.len() as u16 + 2)
                as usize,
        )),
        Span::styled(hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if app.is_submitting() {
        "Contacting server...".to_string()
    } else if app.flow.is_authenticated() {
        "Signed in".to_string()
    } else {
        "Not signed in".to_string()
    };

    let line = Line::from(vec![
        Span::raw(format!(" {} ", status)),
        Span::styled(format!("| {} ", app.config.backend_url), styles::muted_style()),
    ]);
    frame.render_widget(
        Paragraph::new(line).style(styles::status_bar_style()),
        area,
    );
}

fn key_hint<'a>(key: &'a str, desc: &'a str) -> Vec<Span<'a>> {
    vec![
        Span::styled(key, styles::help_key_style()),
        Span::styled(desc, styles::muted_style()),
    ]
}

fn render_home(frame: &mut Frame, area: Rect) {
    let dialog = centered_rect_fixed(46, 9, area);
    frame.render_widget(Clear, dialog);

    let mut hints = vec![Span::raw("  ")];
    hints.extend(key_hint("[S]", " Sign in  "));
    hints.extend(key_hint("[U]", " Sign up  "));
    hints.extend(key_hint("[Q]", " Quit"));

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("  Welcome to Brainely", styles::title_style())),
        Line::from(Span::styled(
            "  Your second brain, in the terminal.",
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(hints),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), dialog);
}

fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let Some(mode) = app.form_mode() else {
        return;
    };
    let height = if app.notice.is_some() { 15 } else { 13 };
    let dialog = centered_rect_fixed(48, height, area);
    frame.render_widget(Clear, dialog);

    let subtitle = match app.route() {
        Route::SignUp => "Create your Brainely account",
        _ => "Welcome back to Brainely",
    };

    let mut lines = vec![
        Line::from(Span::styled(format!("  {}", mode.title()), styles::title_style())),
        Line::from(Span::styled(format!("  {}", subtitle), styles::muted_style())),
        Line::from(""),
    ];

    // Username field
    let username_focused = app.focus == FormFocus::Username;
    let cursor = if username_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled("Username: [", styles::muted_style()),
        Span::styled(
            format!("{:<20}{}", app.username, cursor),
            styles::field_style(username_focused),
        ),
        Span::styled("]", styles::muted_style()),
    ]));

    // Password field (masked)
    let password_focused = app.focus == FormFocus::Password;
    let masked = "*".repeat(app.password.chars().count().min(20));
    let cursor = if password_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled("Password: [", styles::muted_style()),
        Span::styled(
            format!("{:<20}{}", masked, cursor),
            styles::field_style(password_focused),
        ),
        Span::styled("]", styles::muted_style()),
    ]));

    // Submit button, disabled while a request is in flight
    let button_focused = app.focus == FormFocus::Button;
    let label = if let FlowState::Submitting(in_flight) = app.flow.state() {
        match in_flight {
            AuthMode::SignUp => "Signing up…".to_string(),
            AuthMode::SignIn => "Signing in…".to_string(),
        }
    } else if button_focused {
        format!("▶ {} ◀", mode.title())
    } else {
        mode.title().to_string()
    };
    let button_style = if app.is_submitting() {
        styles::muted_style()
    } else {
        styles::field_style(button_focused)
    };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("             ["),
        Span::styled(format!(" {:^15} ", label), button_style),
        Span::raw("]"),
    ]));

    lines.push(Line::from(""));
    let switch = match app.route() {
        Route::SignUp => " Already have an account? Sign in",
        _ => " New user? Create an account",
    };
    let mut footer = vec![Span::raw("  ")];
    footer.extend(key_hint("[F2]", switch));
    lines.push(Line::from(footer));
    let mut back = vec![Span::raw("  ")];
    back.extend(key_hint("[Esc]", " Back to Home"));
    lines.push(Line::from(back));

    if let Some(ref notice) = app.notice {
        lines.push(Line::from(""));
        let style = if app.route() == Route::SignIn && notice.ends_with("Please sign in.") {
            styles::success_style()
        } else {
            styles::error_style()
        };
        lines.push(Line::from(Span::styled(format!("  {}", notice), style)));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), dialog);
}

fn render_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    let dialog = centered_rect_fixed(52, 9, area);
    frame.render_widget(Clear, dialog);

    let mut hints = vec![Span::raw("  ")];
    hints.extend(key_hint("[L]", " Sign out  "));
    hints.extend(key_hint("[Q]", " Quit"));

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("  Dashboard", styles::title_style())),
        Line::from(Span::styled(
            format!("  Signed in to {}", app.config.backend_url),
            styles::success_style(),
        )),
        Line::from(Span::styled(
            format!("  Session token stored under \"{}\"", TOKEN_KEY),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(hints),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), dialog);
}

fn render_debug_overlay(frame: &mut Frame, app: &App) {
    let report = &app.diagnostics;
    let width = 60u16;
    let height = report.entries.len() as u16 + 2;
    let full = frame.area();
    // Bottom-right corner
    let area = Rect::new(
        full.x + full.width.saturating_sub(width + 1),
        full.y + full.height.saturating_sub(height + 2),
        width.min(full.width),
        height.min(full.height),
    );
    frame.render_widget(Clear, area);

    let label_width = report.label_width();
    let lines: Vec<Line> = report
        .entries
        .iter()
        .map(|entry| {
            Line::from(vec![
                Span::styled(
                    format!(" {:<width$} ", entry.label, width = label_width),
                    styles::muted_style(),
                ),
                Span::styled(entry.value.clone(), styles::debug_value_style()),
            ])
        })
        .collect();

    let block = Block::default()
        .title(Span::styled(" Debug Info ", styles::help_key_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_alert(frame: &mut Frame, message: &str) {
    let area = centered_rect_fixed(50, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!(" {}", message), styles::error_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled(" Press ", styles::muted_style()),
            Span::styled("[Enter]", styles::help_key_style()),
            Span::styled(" to continue", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::error_style());

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 5, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::title_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use ratatui::{backend::TestBackend, Terminal};

    use brainely_core::api::ApiClient;
    use brainely_core::auth::{AuthFlow, MemoryTokenStore, TokenStore};
    use brainely_core::config::{resolve, BuildMode};

    use super::*;

    fn app() -> App {
        let api = ApiClient::new("http://localhost:3000").expect("client");
        let flow: AuthFlow<Box<dyn TokenStore>> =
            AuthFlow::new(api, Box::new(MemoryTokenStore::new()));
        App::new(resolve(BuildMode::Development, "localhost"), flow)
    }

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).expect("terminal");
        terminal.draw(|f| render(f, app)).expect("draw");
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_signin_screen_masks_password() {
        let mut app = app();
        app.go_to(Route::SignIn);
        app.username = "alice".to_string();
        app.password = "hunter22".to_string();

        let screen = draw(&app);
        assert!(screen.contains("Welcome back to Brainely"));
        assert!(screen.contains("alice"));
        assert!(screen.contains("********"));
        assert!(!screen.contains("hunter22"));
    }

    #[test]
    fn test_button_label_follows_request_in_flight() {
        let mut app = app();
        app.go_to(Route::SignIn);
        app.flow
            .begin(AuthMode::SignIn, "alice", "hunter22")
            .expect("begin");

        app.go_to(Route::SignUp);
        let screen = draw(&app);
        assert!(screen.contains("Signing in…"));
        assert!(!screen.contains("Signing up…"));
    }

    #[test]
    fn test_debug_overlay_lists_backend_url() {
        let mut app = app();
        app.show_debug = true;
        let screen = draw(&app);
        assert!(screen.contains("Debug Info"));
        assert!(screen.contains("http://localhost:3000"));
        assert!(screen.contains("HARDCODED"));
    }
}
