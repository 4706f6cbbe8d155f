//! Utility functions shared by the list, the cat panel and the terminal UI.
//!
//! - **URL validation**: the store URL must be HTTPS (localhost excepted) and
//!   links handed to the system browser must be plain http(s)
//! - **Text processing**: Unicode-aware truncation, stripping terminal control
//!   sequences from names that came over the network, relative timestamps
//!
//! # Examples
//!
//! ```
//! use shoplist::util::{clean_remote_text, truncate_to_width};
//!
//! assert_eq!(clean_remote_text("\x1b[31mMilk\x1b[0m"), "Milk");
//! assert_eq!(truncate_to_width("Strawberry jam", 8), "Straw...");
//! ```

mod text;
mod url_validator;

pub use text::{clean_remote_text, display_width, format_age, truncate_to_width};
pub use url_validator::{validate_store_url, validate_url_for_open, UrlValidationError};
