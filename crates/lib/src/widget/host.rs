//! Seams between the widget and its environment.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::Result;
use crate::chat::{ClearResponse, HistoryResponse, SendRequest, SendResponse};

/// The three chat endpoints.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn history(&self) -> Result<HistoryResponse>;

    async fn send(&self, request: &SendRequest) -> Result<SendResponse>;

    async fn clear(&self) -> Result<ClearResponse>;
}

/// Environment services the widget needs: a blocking confirmation prompt,
/// persistent flag storage, input focus and deferred reloads.
pub trait Host: Send {
    /// Ask the user a yes/no question. Returns `true` to proceed.
    fn confirm(&mut self, prompt: &str) -> bool;

    fn load_flag(&self, key: &str) -> Option<bool>;

    fn store_flag(&mut self, key: &str, value: bool);

    fn focus_input(&mut self);

    /// Refresh the surrounding view after `delay`.
    fn schedule_reload(&mut self, delay: Duration);
}

/// A [`Host`] that keeps everything in memory.
///
/// Confirmations are answered with `confirm_answer` and every prompt,
/// focus request and reload is recorded.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    pub flags: HashMap<String, bool>,
    pub confirm_answer: bool,
    pub prompts: Vec<String>,
    pub focus_requests: usize,
    pub reloads: Vec<Duration>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host that accepts every confirmation.
    pub fn confirming() -> Self {
        Self {
            confirm_answer: true,
            ..Self::default()
        }
    }

    pub fn with_flag(mut self, key: &str, value: bool) -> Self {
        self.flags.insert(key.to_string(), value);
        self
    }
}

impl Host for MemoryHost {
    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_string());
        self.confirm_answer
    }

    fn load_flag(&self, key: &str) -> Option<bool> {
        self.flags.get(key).copied()
    }

    fn store_flag(&mut self, key: &str, value: bool) {
        self.flags.insert(key.to_string(), value);
    }

    fn focus_input(&mut self) {
        self.focus_requests += 1;
    }

    fn schedule_reload(&mut self, delay: Duration) {
        self.reloads.push(delay);
    }
}
