//! Server-only procedure demonstration.
//!
//! This example shows:
//! 1. Startup: the server registers `updateDisplayName` under the configured policy
//! 2. A client call over the network being rejected
//! 3. Trusted server code calling the same procedure successfully
//!
//! Run with: `cargo run --example server_only_call`
//! Select the token policy with `ORIGIN_GATE_POLICY=token`.

use std::sync::Arc;

use origin_gate::{Config, MemoryUserStore, Server, UPDATE_DISPLAY_NAME};
use serde_json::json;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{}", error);
            std::process::exit(2);
        }
    };

    let store = Arc::new(MemoryUserStore::new());
    store.insert_user("u1");

    let server = match Server::start(&config, Arc::clone(&store)) {
        Ok(server) => server,
        Err(error) => {
            eprintln!("{}", error);
            std::process::exit(1);
        }
    };
    println!("=== Server-only call ({} policy) ===\n", server.policy());

    println!("--- Client call ---");
    let client_args = json!({ "id": "u1", "name": "Mallory" });
    match server.dispatch_external(UPDATE_DISPLAY_NAME, &client_args) {
        Ok(_) => println!("Unexpected success"),
        Err(error) => println!("Rejected (expected): {}", error),
    }

    println!("\n--- Trusted server call ---");
    match server.caller().update_display_name("u1", "John Doe") {
        Ok(()) => println!(
            "Display name is now {:?}",
            store.display_name("u1").unwrap_or_default()
        ),
        Err(error) => println!("Unexpected failure: {}", error),
    }

    println!("\n--- Audit trail ---");
    for event in server.audit().events() {
        println!("{}", event);
    }
}
