//! Chat service tests
//!
//! The service runs against a real store and a scripted model, so these
//! cover persistence, rate limiting and the tool loop together.
