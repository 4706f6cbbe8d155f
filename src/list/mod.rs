//! The shopping list: data types, the state machine behind the list screen,
//! and the effect executor that connects it to the remote and local stores.

mod controller;
mod effects;
mod session;
mod suggestions;
mod types;

pub use controller::{ItemForm, ListController, ListState};
pub use effects::{execute, Effect, Outcome};
pub use session::{ListSession, Removal};
pub use suggestions::{Suggestions, MAX_MATCHES, MAX_REMEMBERED};
pub use types::{KeyedEntry, Mutation, Shopper, ShoppingItem, ShoppingList};
