//! Turning web pages into plain-text [`Document`](crate::types::Document)s.
//!
//! * [`loader`] — fetches a page and extracts text, optionally scoped to a
//!   CSS selector list.
//! * [`cache`] — disk-backed cache so repeated runs skip the network.

pub mod cache;
pub mod loader;

pub use cache::PageCache;
pub use loader::{PageLoader, extract_text};
