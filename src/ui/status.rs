use crate::app::App;
use crate::keybindings::Context;
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else if let Some(busy) = app.busy_message() {
        Cow::Borrowed(busy)
    } else if let (Context::List, Some(err)) = (app.input_context(), app.list.error()) {
        // Errors outside the forms have nowhere else to go
        Cow::Owned(format!("Error: {}", err))
    } else {
        Cow::Borrowed(hints(app.input_context()))
    };

    let paragraph = Paragraph::new(text).style(app.style("status_bar"));
    f.render_widget(paragraph, area);
}

/// Static keybinding hints for the current screen.
fn hints(context: Context) -> &'static str {
    match context {
        Context::Login => "Type password | ENTER sign in | Tab cat | ? help | Ctrl+c quit",
        Context::AddForm => "ENTER add | Tab complete | Left/Right who | ESC cancel",
        Context::Cat => "[n]ext cat [g]if [c]ats on/off [o]pen [Tab]list [q]uit",
        Context::Help => "? or ESC to close",
        Context::List | Context::Global => {
            "[a]dd [d]elete [r]eload [L]ogout [Tab]cat [T]heme [?]help [q]uit"
        }
    }
}
