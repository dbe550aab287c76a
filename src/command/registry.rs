//! Command registry — verb to handler mapping.
//!
//! The registry is constructed once at bootstrap, wrapped in an [`Arc`],
//! and shared read-only by every server's dispatch loop. Handlers are typed
//! async closures; there is no dynamic downcasting at dispatch time.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::supervisor::server::ServerContext;
use crate::Result;

/// A registered command handler.
///
/// Receives the commanding server's context and the argument list (the
/// tokens after the verb, or a single empty string when there are none).
/// The dispatch loop does not interpret the outcome beyond logging.
pub type CommandHandler =
    Arc<dyn Fn(Arc<ServerContext>, Vec<String>) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Immutable-after-construction mapping from command verb to handler.
///
/// Verbs are case-sensitive and unique; registering a verb twice replaces
/// the earlier handler.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, CommandHandler>,
}

impl CommandRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `verb`.
    pub fn register<F, Fut>(&mut self, verb: &str, handler: F)
    where
        F: Fn(Arc<ServerContext>, Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.handlers.insert(
            verb.to_owned(),
            Arc::new(move |ctx, args| handler(ctx, args).boxed()),
        );
    }

    /// Look up the handler for `verb`.
    #[must_use]
    pub fn get(&self, verb: &str) -> Option<&CommandHandler> {
        self.handlers.get(verb)
    }

    /// Number of registered verbs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry holds no handlers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Iterate over the registered verbs.
    pub fn verbs(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("verbs", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
