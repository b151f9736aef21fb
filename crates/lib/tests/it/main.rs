/*! Integration tests for Intentions.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - store: Users, intentions and chat history in SQLite
 * - tools: The assistant's tools run against a real store
 * - chat: The chat service end to end with a scripted model
 * - llm: Assistant tool loop, fallback and the HTTP providers
 * - widget: The chat sidebar state machine and its HTTP backend
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("intentions=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod chat;
mod context;
mod llm;
mod store;
mod tools;
mod widget;
