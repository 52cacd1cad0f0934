//! Operator-facing façade over the reader subsystem.
//!
//! [`ReaderService`] is the composition root: it owns one connection manager,
//! one network scanner and the persisted [`ReaderConfig`], and funnels every
//! event (status, tag reads, scan progress) into one broadcast stream.

mod config;
mod error;
mod service;

pub use config::ReaderConfig;
pub use error::{ServiceError, ServiceResult};
pub use service::ReaderService;
