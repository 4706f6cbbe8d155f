use std::collections::VecDeque;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};

use crate::remote::{Credential, RemoteStore};
use crate::storage::{keys, KeyValueStore};

use super::controller::{ListController, ListState};
use super::effects::{execute, Effect};
use super::suggestions::Suggestions;
use super::types::Shopper;

/// What [`ListSession::remove`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    /// Someone else removed the item before our write; nothing was sent.
    AlreadyGone,
}

/// Drives a [`ListController`] to completion one command at a time.
///
/// Effects run inline (each remote call is awaited before the next input),
/// which suits the command-line subcommands and integration tests. The TUI
/// instead spawns remote effects and feeds outcomes back through its event loop.
pub struct ListSession<R, L> {
    controller: ListController,
    remote: R,
    local: L,
    writes: usize,
}

impl<R: RemoteStore, L: KeyValueStore> ListSession<R, L> {
    /// Build a session, loading remembered suggestions from local state.
    pub async fn open(remote: R, local: L, refresh_before_edit: bool) -> Result<Self> {
        let stored = local.get(keys::SUGGESTIONS).await?;
        let suggestions = Suggestions::from_stored(stored.as_deref());
        Ok(Self {
            controller: ListController::new(suggestions, refresh_before_edit),
            remote,
            local,
            writes: 0,
        })
    }

    pub fn controller(&self) -> &ListController {
        &self.controller
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    /// Execute effects, feeding outcomes back until nothing is left to do.
    pub async fn run(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            if matches!(effect, Effect::Write { .. }) {
                self.writes += 1;
            }
            if let Some(outcome) = execute(effect, &self.remote, &self.local).await {
                queue.extend(self.controller.settle(outcome));
            }
        }
    }

    /// Sign in with `password`, or with the remembered password when `None`.
    pub async fn start(&mut self, password: Option<Credential>) -> Result<()> {
        let effects = match password {
            Some(credential) => {
                self.controller.set_credential(credential);
                self.controller.submit_credential()
            }
            None => {
                let stored = self.local.get(keys::CREDENTIAL).await?;
                self.controller.startup(stored.map(Credential::new))
            }
        };
        if effects.is_empty() && self.controller.state() == ListState::Unauthenticated {
            bail!(self
                .controller
                .error()
                .unwrap_or("No password remembered; pass --password")
                .to_string());
        }
        self.run(effects).await;
        self.ensure_loaded()
    }

    pub async fn refresh(&mut self) -> Result<()> {
        let effects = self.controller.refresh();
        self.run(effects).await;
        self.ensure_loaded()
    }

    pub async fn add(&mut self, name: &str, ordered_by: Shopper, now: DateTime<Utc>) -> Result<()> {
        let effects = self.controller.begin_add();
        self.run(effects).await;
        if self.controller.state() != ListState::AddingItem {
            return self.ensure_loaded();
        }

        self.controller.set_form_name(name);
        self.controller.set_ordered_by(ordered_by);
        let effects = self.controller.submit_item(now);
        if effects.is_empty() {
            let reason = self
                .controller
                .error()
                .unwrap_or("Item name is empty")
                .to_string();
            self.controller.cancel_add();
            bail!(reason);
        }
        self.run(effects).await;
        if self.controller.state() == ListState::AddingItem {
            let reason = self.controller.error().unwrap_or("Add failed").to_string();
            self.controller.cancel_add();
            bail!(reason);
        }
        self.ensure_loaded()
    }

    pub async fn remove(&mut self, name: &str) -> Result<Removal> {
        if !self.controller.items().contains_active(name) {
            bail!("{} is not on the list", name);
        }
        let writes_before = self.writes;
        let effects = self.controller.remove_item(name);
        self.run(effects).await;
        self.ensure_loaded()?;
        if self.writes == writes_before {
            Ok(Removal::AlreadyGone)
        } else {
            Ok(Removal::Removed)
        }
    }

    pub async fn sign_out(&mut self) {
        let effects = self.controller.sign_out();
        self.run(effects).await;
    }

    fn ensure_loaded(&self) -> Result<()> {
        match self.controller.state() {
            ListState::Loaded => match self.controller.error() {
                Some(err) => bail!(err.to_string()),
                None => Ok(()),
            },
            _ => bail!(self
                .controller
                .error()
                .unwrap_or("Not signed in")
                .to_string()),
        }
    }
}
