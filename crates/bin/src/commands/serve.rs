//! Serve command - runs the Intentions web server.

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::signal::unix::{SignalKind, signal};
use tower_cookies::{Cookie, CookieManagerLayer, Cookies, cookie::SameSite};

use intentions::auth::generate_token;
use intentions::chat::{ChatService, ErrorBody, SendRequest};
use intentions::llm::Assistant;
use intentions::store::{Intention, StatusFilter, Store, User};
use intentions::tools::mutating_tool_names;
use intentions::widget::{CSRF_COOKIE, CSRF_HEADER};

use crate::cli::ServeArgs;
use crate::session::{Session, SessionStore};
use crate::store::open_store;
use crate::templates::{self, HomeView};

const SESSION_COOKIE: &str = "intentions_session";

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Store,
    assistant: Arc<Assistant>,
    chat: ChatService,
    sessions: SessionStore,
    mutating_tools: Arc<Vec<String>>,
}

/// Login form data
#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: Option<String>,
    csrf_token: Option<String>,
}

/// Registration form data
#[derive(Deserialize)]
struct RegisterForm {
    username: String,
    password: Option<String>,
    password_confirm: Option<String>,
    csrf_token: Option<String>,
}

/// Logout form data
#[derive(Deserialize)]
struct LogoutForm {
    csrf_token: Option<String>,
}

/// Body of `POST /settings/tool-confirmations`
#[derive(Debug, Serialize, Deserialize)]
struct ToolConfirmationsSetting {
    show_tool_confirmations: bool,
}

/// Run the Intentions server
pub async fn run(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(args).await?;

    let llm_config = args.llm.llm_config();
    tracing::debug!(?llm_config, "LLM configuration");
    let assistant = Arc::new(Assistant::from_config(&llm_config));
    if assistant.is_configured() {
        tracing::info!(providers = ?assistant.provider_names(), "Assistant ready");
    } else {
        tracing::warn!("No LLM provider configured; chat replies will fail until an API key is set");
    }

    let chat = ChatService::new(store.clone(), assistant.clone(), args.llm.chat_config());

    let app_state = AppState {
        store: store.clone(),
        assistant,
        chat,
        sessions: SessionStore::new(),
        mutating_tools: Arc::new(mutating_tool_names()),
    };

    let app = router(app_state);

    // Bind server
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    // Print startup message
    println!("Intentions server started");
    println!();
    println!("Web Interface: http://localhost:{}", local_addr.port());
    println!();
    println!("Available endpoints:");
    println!("  GET  /                            - Today's intentions and chat sidebar");
    println!("  GET  /login, POST /login          - Login");
    println!("  GET  /register, POST /register    - User registration");
    println!("  POST /logout                      - Logout");
    println!("  GET  /health                      - Health check");
    println!("  GET  /intentions/today            - Today's intentions as JSON");
    println!("  GET  /chat/history                - Chat transcript");
    println!("  POST /chat/send                   - Send a chat message");
    println!("  POST /chat/clear                  - Delete the chat transcript");
    println!("  POST /settings/tool-confirmations - Show or hide tool badges");
    println!();
    println!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    println!("Server shut down");
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_home))
        .route("/health", get(handle_health_endpoint))
        .route("/login", get(handle_login_page).post(handle_login_submit))
        .route(
            "/register",
            get(handle_register_page).post(handle_register_submit),
        )
        .route("/logout", post(handle_logout))
        .route("/intentions/today", get(handle_intentions_today))
        .route("/chat/history", get(handle_chat_history))
        .route("/chat/send", post(handle_chat_send))
        .route("/chat/clear", post(handle_chat_clear))
        .route(
            "/settings/tool-confirmations",
            post(handle_tool_confirmations),
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

async fn shutdown_signal() {
    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(term), Ok(int)) => (term, int),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("Failed to install signal handlers ({e}), falling back to Ctrl+C");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for Ctrl+C: {e}");
                }
                return;
            }
        };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("Received SIGTERM, initiating graceful shutdown..."),
        _ = sigint.recv() => tracing::info!("Received SIGINT, initiating graceful shutdown..."),
    }
}

// ============================================================================
// Sessions and CSRF
// ============================================================================

/// JSON error response for the API endpoints.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn unauthenticated() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Authentication required")
    }

    fn csrf_failed() -> Self {
        Self::new(StatusCode::FORBIDDEN, "CSRF token missing or incorrect")
    }
}

impl From<intentions::Error> for ApiError {
    fn from(err: intentions::Error) -> Self {
        let status = if err.is_validation_error() {
            StatusCode::BAD_REQUEST
        } else if err.is_rate_limited() {
            StatusCode::TOO_MANY_REQUESTS
        } else if err.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            tracing::error!(module = err.module(), "Request failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody::new(self.message))).into_response()
    }
}

fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Lax);
    cookie
}

/// The anti-forgery cookie is read by page scripts, so it is not HttpOnly.
fn csrf_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(CSRF_COOKIE, token);
    cookie.set_http_only(false);
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Lax);
    cookie
}

/// Return the anti-forgery cookie value, issuing one if the browser has none.
fn ensure_csrf_cookie(cookies: &Cookies) -> String {
    if let Some(cookie) = cookies.get(CSRF_COOKIE) {
        return cookie.value().to_string();
    }
    let token = generate_token();
    cookies.add(csrf_cookie(token.clone()));
    token
}

/// Anonymous forms must echo the anti-forgery cookie.
fn anonymous_csrf_ok(cookies: &Cookies, submitted: Option<&str>) -> bool {
    match (cookies.get(CSRF_COOKIE), submitted) {
        (Some(cookie), Some(token)) => {
            intentions::auth::constant_time_eq(cookie.value(), token)
        }
        _ => false,
    }
}

async fn current_session(state: &AppState, cookies: &Cookies) -> Option<(String, Session)> {
    let token = cookies.get(SESSION_COOKIE)?.value().to_string();
    let session = state.sessions.get(&token).await?;
    Some((token, session))
}

/// Resolve the logged-in user for an API request.
async fn require_user(state: &AppState, cookies: &Cookies) -> Result<(Session, User), ApiError> {
    let (token, session) = current_session(state, cookies)
        .await
        .ok_or_else(ApiError::unauthenticated)?;
    match state.store.user(session.user_id).await {
        Ok(user) => Ok((session, user)),
        Err(e) if e.is_not_found() => {
            state.sessions.destroy_session(&token).await;
            Err(ApiError::unauthenticated())
        }
        Err(e) => Err(e.into()),
    }
}

/// Like [`require_user`], and the request must carry the session's CSRF header.
async fn require_user_with_csrf(
    state: &AppState,
    cookies: &Cookies,
    headers: &HeaderMap,
) -> Result<User, ApiError> {
    let (session, user) = require_user(state, cookies).await?;
    let submitted = headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok());
    if !session.csrf_matches(submitted) {
        tracing::warn!(user_id = user.id, "Rejected POST with bad CSRF token");
        return Err(ApiError::csrf_failed());
    }
    Ok(user)
}

/// Start a session and hand the browser its cookies.
async fn log_in(state: &AppState, cookies: &Cookies, user: &User) {
    let (token, session) = state.sessions.create_session(user).await;
    cookies.add(session_cookie(token));
    cookies.add(csrf_cookie(session.csrf_token));
    tracing::info!(user_id = user.id, username = %user.username, "User logged in");
}

// ============================================================================
// Authentication Handlers
// ============================================================================

/// Handler for GET /login - Show login page
async fn handle_login_page(State(state): State<AppState>, cookies: Cookies) -> Response {
    if current_session(&state, &cookies).await.is_some() {
        return Redirect::to("/").into_response();
    }

    let token = ensure_csrf_cookie(&cookies);
    Html(templates::login_page(None, &token)).into_response()
}

/// Handler for POST /login - Process login
async fn handle_login_submit(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> Response {
    if !anonymous_csrf_ok(&cookies, form.csrf_token.as_deref()) {
        return ApiError::csrf_failed().into_response();
    }

    let password = form.password.as_deref().filter(|p| !p.is_empty());
    match state.store.authenticate(&form.username, password).await {
        Ok(user) => {
            log_in(&state, &cookies, &user).await;
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::info!(username = %form.username, "Login failed: {e}");
            let token = ensure_csrf_cookie(&cookies);
            Html(templates::login_page(
                Some("Login failed: invalid username or password"),
                &token,
            ))
            .into_response()
        }
    }
}

/// Handler for POST /logout - Logout and destroy session
async fn handle_logout(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<LogoutForm>,
) -> Response {
    if let Some((token, session)) = current_session(&state, &cookies).await {
        if !session.csrf_matches(form.csrf_token.as_deref()) {
            return ApiError::csrf_failed().into_response();
        }
        state.sessions.destroy_session(&token).await;
        cookies.remove(Cookie::build(SESSION_COOKIE).path("/").into());
        cookies.add(csrf_cookie(generate_token()));
    }
    Redirect::to("/login").into_response()
}

/// Handler for GET /register - Show registration page
async fn handle_register_page(State(state): State<AppState>, cookies: Cookies) -> Response {
    if current_session(&state, &cookies).await.is_some() {
        return Redirect::to("/").into_response();
    }

    let token = ensure_csrf_cookie(&cookies);
    Html(templates::register_page(None, &token)).into_response()
}

/// Handler for POST /register - Process registration
async fn handle_register_submit(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<RegisterForm>,
) -> Response {
    if !anonymous_csrf_ok(&cookies, form.csrf_token.as_deref()) {
        return ApiError::csrf_failed().into_response();
    }

    let token = ensure_csrf_cookie(&cookies);
    let username = form.username.trim();
    if username.is_empty() {
        return Html(templates::register_page(
            Some("Username cannot be empty"),
            &token,
        ))
        .into_response();
    }

    let password = form.password.as_deref().filter(|p| !p.is_empty());
    if let Some(pwd) = password
        && form.password_confirm.as_deref() != Some(pwd)
    {
        return Html(templates::register_page(
            Some("Passwords do not match"),
            &token,
        ))
        .into_response();
    }

    match state.store.create_user(username, password).await {
        Ok(user) => {
            tracing::info!("Created new user: {}", user.username);
            log_in(&state, &cookies, &user).await;
            Redirect::to("/").into_response()
        }
        Err(e) if e.is_conflict() => Html(templates::register_page(
            Some("Username already exists"),
            &token,
        ))
        .into_response(),
        Err(e) => {
            tracing::error!("Registration failed: {e}");
            Html(templates::register_page(
                Some(&format!("Registration failed: {e}")),
                &token,
            ))
            .into_response()
        }
    }
}

// ============================================================================
// Page Handlers
// ============================================================================

/// Handler for GET / - Today's intentions with the chat sidebar
async fn handle_home(State(state): State<AppState>, cookies: Cookies) -> Response {
    let (session, user) = match require_user(&state, &cookies).await {
        Ok(found) => found,
        Err(_) => return Redirect::to("/login").into_response(),
    };

    match render_home(&state, &session, &user).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(user_id = user.id, "Failed to render home page: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to load your intentions: {e}"),
            )
                .into_response()
        }
    }
}

async fn render_home(state: &AppState, session: &Session, user: &User) -> intentions::Result<String> {
    let working_day = state.store.clock().working_day();

    let carried = state
        .store
        .carry_sticky_intentions_forward(user.id, working_day)
        .await?;
    if carried > 0 {
        tracing::info!(user_id = user.id, carried, "Carried sticky intentions forward");
    }

    let intentions = state
        .store
        .list_intentions(user.id, working_day, StatusFilter::All)
        .await?;
    let history = state.chat.history(user).await?;

    Ok(templates::home_page(&HomeView {
        username: &user.username,
        csrf_token: &session.csrf_token,
        working_day,
        intentions: &intentions,
        messages: &history.messages,
        show_tool_confirmations: history.show_tool_confirmations,
        mutating_tools: &state.mutating_tools,
    }))
}

// ============================================================================
// API Handlers
// ============================================================================

/// Handler for GET /intentions/today
async fn handle_intentions_today(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Json<Vec<Intention>>, ApiError> {
    let (_, user) = require_user(&state, &cookies).await?;
    let working_day = state.store.clock().working_day();
    let intentions = state
        .store
        .list_intentions(user.id, working_day, StatusFilter::All)
        .await?;
    Ok(Json(intentions))
}

/// Handler for GET /chat/history
async fn handle_chat_history(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Response, ApiError> {
    let (_, user) = require_user(&state, &cookies).await?;
    Ok(Json(state.chat.history(&user).await?).into_response())
}

/// Handler for POST /chat/send
async fn handle_chat_send(
    State(state): State<AppState>,
    cookies: Cookies,
    headers: HeaderMap,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let user = require_user_with_csrf(&state, &cookies, &headers).await?;
    let Json(request) =
        payload.map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;

    let mut response = state.chat.send(&user, request).await?;
    templates::render_reply(&mut response);
    Ok(Json(response).into_response())
}

/// Handler for POST /chat/clear
async fn handle_chat_clear(
    State(state): State<AppState>,
    cookies: Cookies,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user = require_user_with_csrf(&state, &cookies, &headers).await?;
    let cleared = state.chat.clear(&user).await?;
    tracing::info!(user_id = user.id, deleted = cleared.deleted_count, "Chat history cleared");
    Ok(Json(cleared).into_response())
}

/// Handler for POST /settings/tool-confirmations
async fn handle_tool_confirmations(
    State(state): State<AppState>,
    cookies: Cookies,
    headers: HeaderMap,
    payload: Result<Json<ToolConfirmationsSetting>, JsonRejection>,
) -> Result<Json<ToolConfirmationsSetting>, ApiError> {
    let user = require_user_with_csrf(&state, &cookies, &headers).await?;
    let Json(setting) =
        payload.map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;

    state
        .store
        .set_show_tool_confirmations(user.id, setting.show_tool_confirmations)
        .await?;
    Ok(Json(setting))
}

// ============================================================================
// Health Handler
// ============================================================================

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    llm_providers: Vec<String>,
    sessions: usize,
}

/// Handler for GET /health - Health check endpoint
async fn handle_health_endpoint(State(state): State<AppState>) -> Response {
    let sessions = state.sessions.session_count().await;
    match state.store.ping().await {
        Ok(()) => Json(HealthResponse {
            status: "healthy",
            llm_providers: state.assistant.provider_names(),
            sessions,
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Health check failed: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    llm_providers: state.assistant.provider_names(),
                    sessions,
                }),
            )
                .into_response()
        }
    }
}
