//! A terminal shopping list shared by two people.
//!
//! The list itself lives in a hosted JSON bin (see [`remote`]); this crate is
//! the client: a state machine over the list ([`list`]), the adapters for the
//! two storage API shapes, a small local key-value store for the remembered
//! password, suggestions and cat preferences ([`storage`]), and a ratatui
//! front end ([`ui`]) that also shows a cat picture link ([`cat`]).

pub mod app;
pub mod cat;
pub mod config;
pub mod keybindings;
pub mod list;
pub mod remote;
pub mod storage;
pub mod theme;
pub mod ui;
pub mod util;
