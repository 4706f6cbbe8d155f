//! Helper functions for UI operations.
//!
//! Effect dispatch lives here: local effects are awaited inline, remote ones
//! run as background tasks and report back through [`AppEvent::List`].

use crate::app::{App, AppEvent};
use crate::list::{execute, Effect, Outcome};
use crate::remote::StoreError;
use futures::FutureExt;
use ratatui::layout::Rect;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;

/// Wraps a future to catch panics and convert them to errors.
///
/// Instead of the task silently disappearing, a panic becomes `Err` carrying
/// the panic message.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// The outcome that settles `effect` when its task died before producing one.
fn interrupted(effect: &Effect, reason: &str) -> Option<Outcome> {
    let error = || StoreError::Interrupted(reason.to_string());
    match effect {
        Effect::Fetch { generation, .. } => Some(Outcome::Fetched {
            generation: *generation,
            result: Err(error()),
        }),
        Effect::Write { generation, .. } => Some(Outcome::Written {
            generation: *generation,
            result: Err(error()),
        }),
        _ => None,
    }
}

/// Perform the effects returned by a controller transition.
pub(super) async fn dispatch(
    app: &mut App,
    effects: Vec<Effect>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let mut queue: VecDeque<Effect> = effects.into();
    while let Some(effect) = queue.pop_front() {
        if effect.is_remote() {
            spawn_remote(app, effect, event_tx);
            continue;
        }
        let outcome = execute(effect, &app.backend, &app.db).await;
        if let Some(outcome) = outcome {
            queue.extend(app.list.settle(outcome));
        }
    }
}

fn spawn_remote(app: &mut App, effect: Effect, event_tx: &mpsc::Sender<AppEvent>) {
    // The controller only issues one remote effect at a time, so anything
    // still running belongs to a superseded generation.
    if let Some(handle) = app.remote_task.take() {
        handle.abort();
        tracing::debug!("Aborted superseded remote task");
    }

    let backend = app.backend.clone();
    let db = app.db.clone();
    let tx = event_tx.clone();
    let fallback = interrupted(&effect, "request task panicked");

    app.remote_task = Some(tokio::spawn(async move {
        let outcome = match catch_task_panic(execute(effect, &backend, &db)).await {
            Ok(outcome) => outcome,
            Err(panic_msg) => {
                tracing::error!(error = %panic_msg, "Remote task panicked");
                let _ = tx
                    .send(AppEvent::TaskPanicked {
                        task: "remote",
                        error: panic_msg,
                    })
                    .await;
                fallback
            }
        };

        if let Some(outcome) = outcome {
            if let Err(e) = tx.send(AppEvent::List(outcome)).await {
                tracing::warn!(error = %e, "Failed to send remote outcome (receiver dropped)");
            }
        }
    }));
}

/// Create a centered rectangle with the given percentage of the parent area.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
