//! Client side of the cache protocol.
//!
//! [`ClientCacheAgent`] sits between the transport and the renderer. It
//! decodes inits into its [`AdaptiveCache`], answers references from it,
//! and queues the messages that flow back to the server:
//!
//! - `hash-report` when a lossy decode hashed to something other than the
//!   id the server assigned
//! - `eviction-notify` for every id the cache evicted
//! - `query` for references it could not satisfy, when configured to
//!   recover instead of failing
//!
//! Queued messages leave through [`ClientCacheAgent::flush`], which should
//! run at least once per framebuffer update.
//!
//! [`AdaptiveCache`]: crate::cache::AdaptiveCache

mod agent;
mod error;

pub use agent::{ClientCacheAgent, MessageOutcome};
pub use error::ClientError;

#[cfg(test)]
mod tests;
