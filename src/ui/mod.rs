//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `render` - Layout and view dispatch
//! - `helpers` - Effect dispatch and shared utilities
//! - `items` - Shopping list panel
//! - `form` - Password and add-item forms
//! - `cat` - Cat panel
//! - `help` - Keybinding overlay
//! - `status` - Status bar widget

mod cat;
mod events;
mod form;
mod help;
mod helpers;
mod input;
mod items;
mod loop_runner;
mod render;
mod status;

pub use loop_runner::{run, Action};
