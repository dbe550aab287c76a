//! Built-in command handlers.
//!
//! These cover the day-to-day console verbs; operators extend the set by
//! registering additional handlers before the registry is shared. All
//! handlers go through the
//! [`ServerContext`](crate::supervisor::server::ServerContext) capability
//! surface only.

use tracing::info;

use crate::command::registry::CommandRegistry;

/// Build the default registry with the built-in verbs.
///
/// - `say <text…>` — broadcast a chat message through the server console.
/// - `stop` — ask the server to shut down via its own stop command.
/// - `status` — log the server's name and online state.
#[must_use]
pub fn default_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    registry.register("say", |ctx, args| async move {
        ctx.send_raw(&format!("say {}", args.join(" "))).await
    });

    registry.register("stop", |ctx, _args| async move {
        ctx.send_raw("stop").await
    });

    registry.register("status", |ctx, _args| async move {
        info!(
            server = %ctx.name(),
            online = ctx.is_online(),
            "server status"
        );
        Ok(())
    });

    registry
}
