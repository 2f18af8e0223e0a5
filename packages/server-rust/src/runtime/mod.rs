//! The messaging runtime that tenant message stores are wired into.
//!
//! - [`RuntimeOptions`]: node-level settings (startup provisioning policy,
//!   refresh interval)
//! - [`MessagingRuntime`]: ordered, name-addressable registry of the stores
//!   participating in send/receive pipelines

pub mod config;
pub mod registry;

pub use config::RuntimeOptions;
pub use registry::MessagingRuntime;
