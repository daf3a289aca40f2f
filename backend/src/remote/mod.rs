//! Access to the remote satellite analysis service.
//!
//! - [`ExplorerBackend`]: the async trait every implementation provides
//! - [`HttpBackend`]: JSON over HTTP (`reqwest`)
//! - [`LocalBackend`]: scripted/synthetic in-memory implementation
//! - [`BackendFactory`]: selects one from configuration

pub mod backend;
pub mod error;
pub mod factory;
pub mod http;
pub mod local;

pub use backend::ExplorerBackend;
pub use error::{Operation, RemoteError, RemoteResult};
pub use factory::{BackendFactory, BackendType};
pub use http::HttpBackend;
pub use local::{LocalBackend, RecordedCall};
