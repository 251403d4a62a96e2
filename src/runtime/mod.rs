//! Runtime support consumed by generated bindings and fakes.
//!
//! Nothing here is contract-specific: generated code wires these primitives
//! together. The event channel and the log/slot types carry the only shared
//! mutable state in the system; the compilation pipeline itself is pure.

pub mod channel;
pub mod client;
pub mod fake;

pub use channel::{ChannelError, EventChannel};
pub use client::{
    connection_uri, resolve_policy, BackoffTier, ClientError, ConnectionOptions, EventHandler,
    Lifetime, ReconnectPolicy, RelayClient, RelayConnector, ServiceRegistry,
};
pub use fake::{dispatch_invoke, simulate, CallLog, CallbackSlot, FakeError, OverrideSlot};
