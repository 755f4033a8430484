//! Client side of the remote question-answering and session-storage service.
//!
//! `RemoteStore` is the seam the chat controller talks through. `HttpRemote`
//! speaks the service's JSON-over-HTTP API; `MemoryRemote` keeps everything
//! in process for tests and offline use.

pub mod error;
pub mod http;
pub mod memory;
pub mod store;

pub use error::RemoteError;
pub use http::HttpRemote;
pub use memory::MemoryRemote;
pub use store::{AskRequest, AskResponse, CreateSessionResponse, RemoteStore, RenameRequest, SessionHistory};
