use crate::app::{App, Focus};
use crate::util::{clean_remote_text, display_width, format_age, truncate_to_width};
use chrono::Utc;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Render the shopping list panel
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus == Focus::List;
    let now = Utc::now();
    // The " 12h Name" column, then whatever is left inside the borders
    let longest_shopper =
        display_width(&app.shoppers.user_a).max(display_width(&app.shoppers.user_b));
    let meta_width = 6 + longest_shopper;
    let name_width = (area.width as usize).saturating_sub(2 + meta_width);

    let items: Vec<ListItem> = if app.list.items().active_len() == 0 {
        vec![ListItem::new(Span::styled(
            "Nothing to buy. Press a to add an item.",
            app.style("item_meta"),
        ))]
    } else {
        app.list
            .items()
            .active()
            .enumerate()
            .map(|(i, item)| {
                let name = clean_remote_text(&item.name);
                let name = truncate_to_width(&name, name_width);
                let padding = name_width.saturating_sub(display_width(&name));

                let name_style = if i == app.selected_item && is_focused {
                    app.style("item_selected")
                } else {
                    app.style("item_name")
                };

                let meta = format!(
                    " {:>4} {}",
                    format_age(item.ordered_on, now),
                    item.ordered_by.display_name(&app.shoppers)
                );

                ListItem::new(Line::from(vec![
                    Span::styled(name.into_owned(), name_style),
                    Span::raw(" ".repeat(padding)),
                    Span::styled(meta, app.style("item_meta")),
                ]))
            })
            .collect()
    };

    let border_style = if is_focused {
        app.style("panel_border_focused")
    } else {
        app.style("panel_border")
    };

    let title = match app.busy_message() {
        Some(busy) => format!("Shopping list - {}", busy),
        None => format!("Shopping list ({})", app.list.items().active_len()),
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title),
    );

    f.render_widget(list, area);
}
