//! Chat widget tests
//!
//! The widget is driven through a fake backend and host so every state
//! transition can be observed without a browser or a server. The HTTP
//! backend is checked against a mock of the server's session handling.

mod helpers;
mod http_tests;
mod widget_tests;
