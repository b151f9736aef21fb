//! Assistant and provider tests
//!
//! Tool-loop behavior uses the scripted provider; the HTTP providers are
//! exercised against a local mock server.

mod assistant_tests;
mod provider_tests;
