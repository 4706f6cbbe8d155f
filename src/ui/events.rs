//! Application event handling.
//!
//! Settles remote outcomes into the list controller and reports task panics.

use crate::app::{App, AppEvent};
use crate::list::ListState;
use tokio::sync::mpsc;

use super::helpers::dispatch;

/// Handle application events from background tasks.
pub(super) async fn handle_app_event(
    app: &mut App,
    event: AppEvent,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match event {
        AppEvent::List(outcome) => {
            let was_signed_in = app.list.state() != ListState::Unauthenticated;
            let effects = app.list.settle(outcome);
            dispatch(app, effects, event_tx).await;
            app.clamp_selection();

            if was_signed_in && app.list.state() == ListState::Unauthenticated {
                if let Some(err) = app.list.error() {
                    let msg = format!("Signed out: {}", err);
                    app.set_status(msg);
                }
            }
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error, "Background task panicked");
            app.set_status(format!("Internal error in {} task", task));
        }
    }
}
