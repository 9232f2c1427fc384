//! Structural perception for locator repair.
//!
//! Loads the page's accessibility snapshot into a [`SnapshotNode`] tree,
//! searches it for text while tracking the enclosing landmark and parent,
//! and captures failure artifacts through the [`PageCapture`] port.

pub mod collector;
pub mod errors;
pub mod ports;
pub mod search;
pub mod snapshot;

pub use collector::ArtifactCollector;
pub use errors::PerceiverError;
pub use ports::PageCapture;
pub use search::{find_elements_by_text, TextMatch};
pub use snapshot::{load_snapshot, parse_snapshot, SnapshotNode};
