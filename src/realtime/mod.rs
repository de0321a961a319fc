//! Realtime push layer: an in-process client registry, an event
//! broadcaster fanning out to registered SSE streams, and the axum
//! endpoints that open those streams.
//!
//! State is process-local by design: registrations are created on
//! stream connect, destroyed on disconnect or write failure, and lost
//! on restart. There is no cross-instance fan-out; a multi-process
//! deployment would need an external pub/sub backbone behind the
//! broadcaster seam.

pub mod broadcaster;
pub mod registry;
pub mod sse;

pub use broadcaster::EventBroadcaster;
pub use registry::{ChannelKey, ClientId, ClientRegistry};
