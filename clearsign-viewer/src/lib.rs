//! Viewer boundary on top of the `clearsign` engine: a signing
//! session holding the loaded metadata collection and the current
//! transaction, a render pipeline producing device screens, and HTTP
//! loaders for metadata documents and demo sample sets.
//!
//! The engine itself stays pure; everything async or networked lives
//! here.

pub mod loader;
pub mod render;
pub mod session;

pub use loader::{LoaderError, MetadataLoader, SampleSet, SampleSetsConfig};
pub use render::{render_operations, OperationScreens, RenderedOperation};
pub use session::SigningSession;
