//! Offline provider returning queued completions.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::{CompletionRequest, ContentBlock, LlmError, LlmProvider, LlmRole};
use crate::Result;

#[derive(Debug)]
enum Step {
    Reply(Vec<ContentBlock>),
    Fail(String),
}

#[derive(Debug, Default)]
struct ScriptState {
    steps: VecDeque<Step>,
    requests: Vec<CompletionRequest>,
}

/// Provider that plays back a queue of canned completions.
///
/// Every request is recorded so callers can inspect what the assistant sent.
/// Once the queue is empty, an echoing provider repeats the last user text
/// and a plain one fails with [`LlmError::ScriptExhausted`].
#[derive(Debug)]
pub struct ScriptedProvider {
    name: String,
    echo_when_empty: bool,
    state: Mutex<ScriptState>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::named("scripted")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            echo_when_empty: false,
            state: Mutex::new(ScriptState::default()),
        }
    }

    /// A provider that echoes the user once its script runs out.
    pub fn echo() -> Self {
        Self {
            echo_when_empty: true,
            ..Self::new()
        }
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push_blocks(&self, blocks: Vec<ContentBlock>) -> &Self {
        self.lock().steps.push_back(Step::Reply(blocks));
        self
    }

    pub fn push_text(&self, text: impl Into<String>) -> &Self {
        self.push_blocks(vec![ContentBlock::text(text)])
    }

    pub fn push_tool_use(&self, id: &str, name: &str, input: Value) -> &Self {
        self.push_blocks(vec![ContentBlock::tool_use(id, name, input)])
    }

    /// Queue a failed completion.
    pub fn push_failure(&self, message: impl Into<String>) -> &Self {
        self.lock().steps.push_back(Step::Fail(message.into()));
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.lock().requests.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    pub fn remaining(&self) -> usize {
        self.lock().steps.len()
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn echo_reply(request: &CompletionRequest) -> Vec<ContentBlock> {
    let last = request
        .messages
        .iter()
        .rev()
        .find(|m| m.role == LlmRole::User)
        .map(|m| m.plain_text())
        .unwrap_or_default();
    vec![ContentBlock::text(format!("You said: {last}"))]
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<ContentBlock>> {
        let mut state = self.lock();
        state.requests.push(request.clone());
        match state.steps.pop_front() {
            Some(Step::Reply(blocks)) => Ok(blocks),
            Some(Step::Fail(message)) => Err(LlmError::Scripted { message }.into()),
            None if self.echo_when_empty => Ok(echo_reply(request)),
            None => Err(LlmError::ScriptExhausted.into()),
        }
    }
}
