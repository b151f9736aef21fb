use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use intentions::{
    Result,
    chat::{ChatMessage, ClearResponse, HistoryResponse, Role, SendRequest, SendResponse},
    tools::ToolExecution,
    widget::{ChatBackend, ChatWidget, ClientError, MemoryHost, WidgetConfig},
};

/// A [`ChatBackend`] that answers from queues and records what it was sent.
#[derive(Default)]
pub struct FakeBackend {
    history: Mutex<VecDeque<Result<HistoryResponse>>>,
    sends: Mutex<VecDeque<Result<SendResponse>>>,
    clears: Mutex<VecDeque<Result<ClearResponse>>>,
    sent: Mutex<Vec<SendRequest>>,
    clear_calls: Mutex<usize>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(self, messages: Vec<ChatMessage>) -> Self {
        self.history.lock().unwrap().push_back(Ok(HistoryResponse {
            messages,
            show_tool_confirmations: true,
        }));
        self
    }

    pub fn push_reply(&self, response: SendResponse) {
        self.sends.lock().unwrap().push_back(Ok(response));
    }

    pub fn push_send_error(&self, status: u16, message: Option<&str>) {
        self.sends.lock().unwrap().push_back(Err(status_error(status, message)));
    }

    pub fn push_clear(&self, result: Result<ClearResponse>) {
        self.clears.lock().unwrap().push_back(result);
    }

    pub fn push_history_error(&self, status: u16, message: Option<&str>) {
        self.history
            .lock()
            .unwrap()
            .push_back(Err(status_error(status, message)));
    }

    /// Requests received by `send`, in order.
    pub fn sent(&self) -> Vec<SendRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) -> usize {
        *self.clear_calls.lock().unwrap()
    }
}

pub fn status_error(status: u16, message: Option<&str>) -> intentions::Error {
    ClientError::Status {
        status,
        message: message.map(str::to_string),
    }
    .into()
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn history(&self) -> Result<HistoryResponse> {
        self.history.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(HistoryResponse {
                messages: Vec::new(),
                show_tool_confirmations: true,
            })
        })
    }

    async fn send(&self, request: &SendRequest) -> Result<SendResponse> {
        self.sent.lock().unwrap().push(request.clone());
        self.sends
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(status_error(500, None)))
    }

    async fn clear(&self) -> Result<ClearResponse> {
        *self.clear_calls.lock().unwrap() += 1;
        self.clears
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(ClearResponse { deleted_count: 0 }))
    }
}

/// An assistant reply carrying the given tool executions.
pub fn reply(content: &str, executions: Vec<ToolExecution>) -> SendResponse {
    let mut assistant_message = ChatMessage::new(Role::Assistant, content);
    if !executions.is_empty() {
        assistant_message.tool_executions = Some(executions);
    }
    SendResponse {
        user_message: None,
        assistant_message,
        show_tool_confirmations: true,
    }
}

/// An open widget over `backend`.
pub fn open_widget(backend: FakeBackend) -> ChatWidget<FakeBackend, MemoryHost> {
    let host = MemoryHost::new().with_flag("chat-sidebar-open", true);
    ChatWidget::new(backend, host, WidgetConfig::default())
}
