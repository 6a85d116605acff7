//! Server side of the cache protocol.
//!
//! One [`EncodeDecisionEngine`] runs per connection. For every outgoing
//! rectangle it hashes the pixels and consults its [`PeerSyncState`] to pick
//! one of three outcomes:
//!
//! - `reference` when the client is known to hold the content (directly or
//!   through a learned alias)
//! - `init` when the client asked for the content or a [`SeedPolicy`]
//!   decided to announce it
//! - fallback to the ordinary uncached encoding path otherwise
//!
//! Client messages (`query`, `hash-report`, `eviction-notify`) are fed back
//! through [`EncodeDecisionEngine::handle_client_message`].
//!
//! # State machine
//!
//! Each id is `Unknown`, `Requested` or `Known`. A query or seed moves an
//! id to `Requested`, sending its init moves it to `Known` right away
//! without waiting for acknowledgement, and an eviction notify moves it back
//! to `Unknown`. A reference is never produced for an id that is not
//! `Known`.

mod engine;
mod error;
mod peer_state;
mod policy;

pub use engine::{EncodeDecision, EncodeDecisionEngine, EncodeOutput};
pub use error::ServerError;
pub use peer_state::{PeerSyncState, SyncState};
pub use policy::{MinAreaSeed, NeverSeed, SeedPolicy};
