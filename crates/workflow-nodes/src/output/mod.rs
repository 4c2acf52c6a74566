//! Output nodes
//!
//! Nodes that publish results to the UI instead of downstream ports.

mod preview_text;

pub use preview_text::{PreviewText, PreviewTextNode};
