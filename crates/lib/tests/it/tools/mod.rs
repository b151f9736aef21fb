//! Tool integration tests
//!
//! Every tool runs through `ToolExecutor::execute` against a real store, the
//! same path the assistant takes.
