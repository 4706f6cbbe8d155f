use crate::remote::{Credential, RemoteStore, StoreError};
use crate::storage::{keys, KeyValueStore};

use super::types::{Mutation, ShoppingList};

/// Work the controller asks its driver to do.
///
/// Remote effects carry the generation they were issued under; the matching
/// [`Outcome`] must echo it back.
#[derive(Debug, Clone)]
pub enum Effect {
    Fetch {
        generation: u64,
        credential: Credential,
    },
    Write {
        generation: u64,
        credential: Credential,
        base: ShoppingList,
        mutation: Mutation,
    },
    StoreCredential(Credential),
    ForgetCredential,
    SaveSuggestions(Vec<String>),
}

impl Effect {
    /// Remote effects take a network round trip and settle with an [`Outcome`];
    /// local ones are quick and settle with nothing.
    pub fn is_remote(&self) -> bool {
        matches!(self, Effect::Fetch { .. } | Effect::Write { .. })
    }
}

/// Result of a remote effect, fed back into the controller.
#[derive(Debug)]
pub enum Outcome {
    Fetched {
        generation: u64,
        result: Result<ShoppingList, StoreError>,
    },
    Written {
        generation: u64,
        result: Result<(), StoreError>,
    },
}

/// Perform one effect.
///
/// Local storage failures are logged and swallowed: losing a remembered
/// suggestion must not block the list.
pub async fn execute<R, L>(effect: Effect, remote: &R, local: &L) -> Option<Outcome>
where
    R: RemoteStore,
    L: KeyValueStore,
{
    match effect {
        Effect::Fetch {
            generation,
            credential,
        } => {
            let result = remote.fetch_list(&credential).await;
            if let Err(ref e) = result {
                tracing::warn!(generation, error = %e, "Fetching the list failed");
            }
            Some(Outcome::Fetched { generation, result })
        }
        Effect::Write {
            generation,
            credential,
            base,
            mutation,
        } => {
            let result = remote.write(&credential, &base, &mutation).await;
            if let Err(ref e) = result {
                tracing::warn!(
                    generation,
                    item = %mutation.name(),
                    error = %e,
                    "Writing the list failed"
                );
            }
            Some(Outcome::Written { generation, result })
        }
        Effect::StoreCredential(credential) => {
            if let Err(e) = local.set(keys::CREDENTIAL, credential.expose()).await {
                tracing::warn!(error = %e, "Failed to remember password");
            }
            None
        }
        Effect::ForgetCredential => {
            if let Err(e) = local.remove(keys::CREDENTIAL).await {
                tracing::warn!(error = %e, "Failed to forget password");
            }
            None
        }
        Effect::SaveSuggestions(names) => {
            match serde_json::to_string(&names) {
                Ok(json) => {
                    if let Err(e) = local.set(keys::SUGGESTIONS, &json).await {
                        tracing::warn!(error = %e, "Failed to save suggestions");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Failed to encode suggestions"),
            }
            None
        }
    }
}
