//! HTTP client for the PDF QA backend.

pub mod backend;
pub mod config;
pub mod viewer;

pub use backend::{endpoints, ClientError, HttpBackend, QaBackend};
pub use config::{ClientConfig, CLIENT_DEFAULTS};
pub use viewer::ViewerLinks;
