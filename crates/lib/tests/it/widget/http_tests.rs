//! `HttpChatBackend` against a mock server with cookie sessions and CSRF checks.

use axum::{
    Form, Json, Router,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use intentions::{
    chat::{ChatMessage, ErrorBody, HistoryResponse, Role, SendRequest, SendResponse},
    widget::{CSRF_HEADER, ChatBackend, ChatWidget, HttpChatBackend, MemoryHost, WidgetConfig},
};
use serde::Deserialize;

const TOKEN: &str = "tok123";

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    #[serde(default)]
    csrf_token: String,
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorBody::new(message))).into_response()
}

fn logged_in(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|c| c.contains("session=alice"))
}

async fn login_form() -> Response {
    (
        [(header::SET_COOKIE, format!("csrftoken={TOKEN}; Path=/"))],
        "<form></form>",
    )
        .into_response()
}

async fn login(Form(form): Form<LoginForm>) -> Response {
    if form.csrf_token != TOKEN || form.username != "alice" {
        return error(StatusCode::FORBIDDEN, "CSRF token missing or incorrect");
    }
    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, "session=alice; Path=/; HttpOnly".to_string()),
        ],
    )
        .into_response()
}

async fn history(headers: HeaderMap) -> Response {
    if !logged_in(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    }
    Json(HistoryResponse {
        messages: vec![ChatMessage::new(Role::Assistant, "Welcome **back**")],
        show_tool_confirmations: false,
    })
    .into_response()
}

async fn send(headers: HeaderMap, Json(request): Json<SendRequest>) -> Response {
    if !logged_in(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    }
    if headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok()) != Some(TOKEN) {
        return error(StatusCode::FORBIDDEN, "CSRF token missing or incorrect");
    }
    Json(SendResponse {
        user_message: Some(ChatMessage::new(Role::User, request.message.clone())),
        assistant_message: ChatMessage::new(Role::Assistant, format!("Echo: {}", request.message)),
        show_tool_confirmations: true,
    })
    .into_response()
}

async fn serve() -> String {
    let app = Router::new()
        .route("/login", get(login_form).post(login))
        .route("/chat/history", get(history))
        .route("/chat/send", post(send));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_requests_before_login_are_unauthorized() {
    let base = serve().await;
    let backend = HttpChatBackend::new(&base).unwrap();

    let err = backend.history().await.unwrap_err();
    assert!(err.is_authentication_error());
    assert_eq!(err.to_string(), "Authentication required");
}

#[tokio::test]
async fn test_login_then_chat() {
    let base = serve().await;
    let backend = HttpChatBackend::new(&base).unwrap();
    backend.login("alice", None).await.unwrap();
    assert_eq!(backend.csrf_token().as_deref(), Some(TOKEN));

    let history = backend.history().await.unwrap();
    assert!(!history.show_tool_confirmations);
    assert_eq!(history.messages.len(), 1);

    let response = backend.send(&SendRequest::new("hi")).await.unwrap();
    assert_eq!(response.assistant_message.content, "Echo: hi");
}

#[tokio::test]
async fn test_rejected_login() {
    let base = serve().await;
    let backend = HttpChatBackend::new(&base).unwrap();
    let err = backend.login("mallory", Some("guess")).await.unwrap_err();
    assert_eq!(err.to_string(), "Login failed for mallory");
}

#[tokio::test]
async fn test_widget_over_http() {
    let base = serve().await;
    let backend = HttpChatBackend::new(&base).unwrap();
    backend.login("alice", None).await.unwrap();

    let mut widget = ChatWidget::new(backend, MemoryHost::new(), WidgetConfig::default());
    widget.load_history().await;
    assert!(widget.transcript_html().contains("<strong>back</strong>"));

    widget.set_input("ping");
    widget.send_message().await;
    let last = widget.state().messages().last().unwrap();
    assert_eq!(last.content, "Echo: ping");
}

#[test]
fn test_invalid_base_url() {
    let err = HttpChatBackend::new("not a url").unwrap_err();
    assert!(err.to_string().starts_with("Invalid server URL not a url"));
}
