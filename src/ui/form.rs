//! The password form and the add-item form.

use crate::app::{App, Focus};
use crate::list::Shopper;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

fn panel_block(app: &App, title: &str) -> Block<'static> {
    let border_style = if app.focus == Focus::List {
        app.style("panel_border_focused")
    } else {
        app.style("panel_border")
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title.to_string())
}

/// One line holding what was typed, with a cursor when the form is focused.
fn input_line(app: &App, label: &str, value: String) -> Line<'static> {
    let cursor = if app.focus == Focus::List { "_" } else { "" };
    Line::from(vec![
        Span::styled(format!("{}: ", label), app.style("form_label")),
        Span::styled(format!("{}{}", value, cursor), app.style("form_input")),
    ])
}

/// Password prompt, with the last error (or the loading message) below it.
pub fn render_login(f: &mut Frame, app: &App, area: Rect) {
    let block = panel_block(app, "Shopping list - sign in");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let masked = "*".repeat(app.list.credential().expose().chars().count());
    let mut lines = vec![
        Line::from(""),
        input_line(app, "Password", masked),
        Line::from(""),
    ];

    if let Some(busy) = app.busy_message() {
        lines.push(Line::from(Span::styled(busy, app.style("loading_text"))));
    } else if let Some(err) = app.list.error() {
        lines.push(Line::from(Span::styled(
            err.to_string(),
            app.style("error_text"),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "Enter the list password and press Enter",
            app.style("item_meta"),
        )));
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

/// Item name with autocomplete, and who is ordering it.
pub fn render_add(f: &mut Frame, app: &App, area: Rect) {
    let block = panel_block(app, "Add an item");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(inner);

    let form = app.list.form();
    let shopper_span = |shopper: Shopper| {
        let style = if form.ordered_by == shopper {
            app.style("shopper_active")
        } else {
            app.style("item_meta")
        };
        Span::styled(
            format!(" {} ", shopper.display_name(&app.shoppers)),
            style,
        )
    };

    let header = vec![
        Line::from(""),
        input_line(app, "Item", form.name.clone()),
        Line::from(vec![
            Span::styled("Ordered by: ", app.style("form_label")),
            shopper_span(Shopper::UserA),
            Span::raw(" "),
            shopper_span(Shopper::UserB),
        ]),
    ];
    f.render_widget(Paragraph::new(header), rows[0]);

    let suggestions: Vec<ListItem> = app
        .list
        .matching_suggestions()
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            let style = if app.selected_suggestion == Some(i) {
                app.style("suggestion_selected")
            } else {
                app.style("suggestion")
            };
            ListItem::new(Span::styled(format!("  {}", s), style))
        })
        .collect();
    f.render_widget(List::new(suggestions), rows[1]);

    let footer = match (app.busy_message(), app.list.error()) {
        (Some(busy), _) => Line::from(Span::styled(busy, app.style("loading_text"))),
        (None, Some(err)) => Line::from(Span::styled(err.to_string(), app.style("error_text"))),
        (None, None) => Line::from(Span::styled(
            "Enter add  Tab complete  Left/Right who  Esc cancel",
            app.style("item_meta"),
        )),
    };
    f.render_widget(Paragraph::new(footer).wrap(Wrap { trim: true }), rows[2]);
}
