//! Render functions for the TUI.
//!
//! The screen is the list panel (or one of its forms) on the left, the cat
//! panel on the right and the status bar along the bottom.

use crate::app::App;
use crate::list::ListState;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    widgets::Paragraph,
    Frame,
};

use super::{cat, form, help, items, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 50;
pub(super) const MIN_HEIGHT: u16 = 10;

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    // Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    render_main_panels(f, app, rows[0]);
    status::render(f, app, rows[1]);

    if app.show_help {
        help::render(f, app);
    }
}

/// List (60%) on the left, cat (40%) on the right.
fn render_main_panels(f: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    match app.list.state() {
        ListState::Unauthenticated => form::render_login(f, app, columns[0]),
        ListState::AddingItem => form::render_add(f, app, columns[0]),
        ListState::Sending if !app.list.form().name.trim().is_empty() => {
            form::render_add(f, app, columns[0])
        }
        ListState::Loading if app.list.items().is_empty() => {
            form::render_login(f, app, columns[0])
        }
        _ => items::render(f, app, columns[0]),
    }
    cat::render(f, app, columns[1]);
}
