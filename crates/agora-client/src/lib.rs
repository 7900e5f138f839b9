//! Agora Client - Backend Collaborators
//!
//! Everything the forum core needs from its hosted backend, expressed as
//! async collaborator traits plus the two concrete transports that talk to
//! it: a GraphQL-over-HTTP executor for reads and writes, and a WebSocket
//! realtime client for live subscriptions.
//!
//! The traits are the seam: views are generic over them, tests substitute
//! the in-memory backend from `agora-testkit`, and deployments wire up
//! [`GraphQlClient`] and [`RealtimeClient`] from one [`ClientConfig`].

#![forbid(unsafe_code)]

/// Cancellable live event channels
pub mod channel;

/// Client configuration
pub mod config;

/// Collaborator traits consumed by the view layer
pub mod effects;

/// GraphQL operation documents and wire envelope
pub mod graphql;

/// HTTP executor for queries and mutations
pub mod http;

/// WebSocket realtime client for subscriptions
pub mod realtime;

pub use channel::{ChannelHandle, EventChannel, EventReceiver, EventSender};
pub use config::{AuthMode, ClientConfig};
pub use effects::{AuthEffects, ForumEffects, MutationEffects, QueryEffects, SubscriptionEffects};
pub use http::GraphQlClient;
pub use realtime::RealtimeClient;
