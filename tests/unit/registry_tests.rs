//! Unit tests for the command registry.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use game_warden::command::builtin::default_registry;
use game_warden::command::registry::CommandRegistry;
use game_warden::supervisor::server::ServerContext;

fn test_context() -> Arc<ServerContext> {
    let (stdin_tx, _stdin_rx) = mpsc::channel::<String>(8);
    Arc::new(ServerContext::new("survival", stdin_tx))
}

/// Lookup is case-sensitive and exact.
#[test]
fn lookup_is_case_sensitive() {
    let mut registry = CommandRegistry::new();
    registry.register("say", |_ctx, _args| async move { Ok(()) });

    assert!(registry.get("say").is_some());
    assert!(registry.get("Say").is_none());
    assert!(registry.get("says").is_none());
}

/// Registering the same verb twice replaces the earlier handler.
#[tokio::test]
async fn reregistering_replaces_handler() {
    let counter = Arc::new(AtomicUsize::new(0));

    let mut registry = CommandRegistry::new();
    registry.register("tick", |_ctx, _args| async move { Ok(()) });
    {
        let counter = Arc::clone(&counter);
        registry.register("tick", move |_ctx, _args| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
    }

    assert_eq!(registry.len(), 1, "verbs stay unique");

    let handler = registry.get("tick").expect("handler present");
    handler(test_context(), vec![String::new()])
        .await
        .expect("handler runs");
    assert_eq!(counter.load(Ordering::SeqCst), 1, "second handler won");
}

/// An empty registry reports itself as such.
#[test]
fn empty_registry_has_no_verbs() {
    let registry = CommandRegistry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
    assert_eq!(registry.verbs().count(), 0);
}

/// The default registry ships the built-in verbs.
#[test]
fn default_registry_has_builtins() {
    let registry = default_registry();

    for verb in ["say", "stop", "status"] {
        assert!(registry.get(verb).is_some(), "built-in `{verb}` missing");
    }
}

/// The built-in `say` relays through the server's stdin channel.
#[tokio::test]
async fn builtin_say_writes_to_stdin_channel() {
    let (stdin_tx, mut stdin_rx) = mpsc::channel::<String>(8);
    let ctx = Arc::new(ServerContext::new("survival", stdin_tx));

    let registry = default_registry();
    let handler = registry.get("say").expect("say registered");
    handler(ctx, vec!["hello".to_owned(), "world".to_owned()])
        .await
        .expect("handler runs");

    assert_eq!(stdin_rx.recv().await.as_deref(), Some("say hello world"));
}

/// The built-in `stop` writes the server's own stop command.
#[tokio::test]
async fn builtin_stop_writes_stop_command() {
    let (stdin_tx, mut stdin_rx) = mpsc::channel::<String>(8);
    let ctx = Arc::new(ServerContext::new("survival", stdin_tx));

    let registry = default_registry();
    let handler = registry.get("stop").expect("stop registered");
    handler(ctx, vec![String::new()]).await.expect("handler runs");

    assert_eq!(stdin_rx.recv().await.as_deref(), Some("stop"));
}
