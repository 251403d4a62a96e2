//! External collaborator seams and connection configuration
//!
//! The messaging client, the connection builder, and the service registry
//! are opaque primitives behind traits; generated bindings delegate to them
//! and no transport or container logic lives in this crate. Reconnect
//! defaults are a pure configuration value passed through the call chain,
//! never a mutable singleton.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

/// Failures surfaced by the relay client seam.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connect to '{uri}' failed: {reason}")]
    Connect { uri: String, reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("result decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Handler installed for a named push event.
pub type EventHandler = Box<dyn Fn(Value) -> BoxFuture<'static, ()> + Send + Sync>;

/// The messaging client consumed by generated bindings: start/stop the
/// connection, invoke a named method, subscribe to a named event.
#[async_trait]
pub trait RelayClient: Send + Sync {
    async fn start(&self) -> Result<(), ClientError>;

    async fn stop(&self) -> Result<(), ClientError>;

    /// Invoke a named method with serialized arguments, resolving with the
    /// serialized result.
    async fn invoke(&self, method: &str, args: Value) -> Result<Value, ClientError>;

    /// Install the handler dispatched when the named event arrives.
    fn on_event(&self, method: &str, handler: EventHandler);
}

/// Builds a client connected to a resolved uri under a reconnect policy.
pub trait RelayConnector {
    type Client: RelayClient;

    fn connect(&self, uri: &str, policy: &ReconnectPolicy) -> Result<Self::Client, ClientError>;
}

/// One tier of reconnect attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffTier {
    pub attempts: u32,
    pub delay: Duration,
}

impl BackoffTier {
    #[must_use]
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }
}

/// Tiered reconnect backoff applied to a binding's connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub tiers: Vec<BackoffTier>,
}

impl ReconnectPolicy {
    #[must_use]
    pub fn total_attempts(&self) -> u32 {
        self.tiers.iter().map(|t| t.attempts).sum()
    }

    /// The delay before the given zero-based attempt, or `None` once every
    /// tier is exhausted.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        let mut remaining = attempt;
        for tier in &self.tiers {
            if remaining < tier.attempts {
                return Some(tier.delay);
            }
            remaining -= tier.attempts;
        }
        None
    }
}

impl Default for ReconnectPolicy {
    /// Three tiers: 10 attempts at 1s, 5 at 3s, 2 at 10s.
    fn default() -> Self {
        Self {
            tiers: vec![
                BackoffTier::new(10, Duration::from_secs(1)),
                BackoffTier::new(5, Duration::from_secs(3)),
                BackoffTier::new(2, Duration::from_secs(10)),
            ],
        }
    }
}

/// Apply the default backoff only when the caller supplied none.
#[must_use]
pub fn resolve_policy(requested: Option<ReconnectPolicy>) -> ReconnectPolicy {
    requested.unwrap_or_default()
}

/// Registration lifetime for a generated binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifetime {
    #[default]
    Singleton,
    Scoped,
    Transient,
}

/// The dependency container seam: register a binding under a lifetime.
pub trait ServiceRegistry {
    fn register_binding(&mut self, name: &str, lifetime: Lifetime);
}

/// Options accepted by generated registration helpers.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOptions {
    /// Reconnect backoff; the default tiers apply when absent.
    pub reconnect: Option<ReconnectPolicy>,
    pub lifetime: Lifetime,
}

/// Join the base uri and a bridge's uri segment with exactly one separator.
#[must_use]
pub fn connection_uri(base: &str, route: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        route.trim_start_matches('/')
    )
}
