//! Application layer - Use cases and port interfaces
//!
//! The session controller, the persistence protocol and the traits
//! infrastructure adapters implement.

pub mod audio_graph;
pub mod blob_store;
pub mod persistence;
pub mod ports;
pub mod session;

pub use audio_graph::AudioGraph;
pub use blob_store::{Blob, BlobStore, ObjectUrl};
pub use persistence::{PersistenceError, PersistenceProtocol, SaveReport};
pub use session::{
    ControllerConfig, ErrorKind, RecordingController, SessionCallbacks, SessionError, SessionPorts,
};
