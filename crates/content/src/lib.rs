//! `guidesync-content` - local HTML corpus loader.
//!
//! Walks a content root, extracts title and body text from every `.html`
//! file, and derives the stable identity key that binds each document to its
//! remote record. Read-only: nothing here touches the network.

pub mod error;
pub mod html;
pub mod identity;
pub mod loader;

pub use error::ContentError;
pub use html::{Extracted, HtmlReader, Selector};
pub use identity::identity_key;
pub use loader::{load_all, LoadOptions, LocalDocument};
