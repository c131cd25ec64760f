//! API middleware components

pub mod logging;
pub mod provider;

pub use logging::{logging_middleware, REQUEST_ID_HEADER};
pub use provider::{attach_repositories, RepositoryLayerState, RequestCancellation};
