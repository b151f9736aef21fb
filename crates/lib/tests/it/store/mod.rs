//! Store integration tests
//!
//! Users, intentions and chat history against a real SQLite database.

mod chat_tests;
mod intentions_tests;
mod users_tests;
