use crate::app::{App, Focus};
use crate::util::truncate_to_width;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Render the cat panel.
///
/// A terminal can't show the picture itself, so the panel shows its link and
/// the controls; `o` opens it in the browser.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus == Focus::Cat;
    let cat = &app.cat;
    let inner_width = (area.width as usize).saturating_sub(2);

    let mut lines = vec![
        Line::from(Span::styled(cat.heading(), app.style("cat_heading"))),
        Line::from(""),
    ];

    if cat.opted_in() {
        let url = cat.image_url(&app.cat_api_base);
        lines.push(Line::from(Span::styled(
            truncate_to_width(&url, inner_width).into_owned(),
            app.style("cat_link"),
        )));
        lines.push(Line::from(""));
        lines.push(hint(app, "o", "Open this cat"));
        lines.push(hint(app, "n", "I don't like the look of this cat"));
        lines.push(hint(app, "g", cat.toggle_label()));
        lines.push(hint(app, "c", "I don't want to see cats"));
    } else {
        lines.push(hint(app, "c", "I'd like to see cats again"));
    }

    let border_style = if is_focused {
        app.style("panel_border_focused")
    } else {
        app.style("panel_border")
    };

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title("Cat"),
    );
    f.render_widget(paragraph, area);
}

fn hint(app: &App, key: &'static str, label: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("[{}] ", key), app.style("form_label")),
        Span::raw(label),
    ])
}
