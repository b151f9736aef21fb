//! HTML templates for web interface
//!
//! Simple inline HTML templates without a template engine.

use intentions::chat::{ChatMessage, SendResponse};
use intentions::store::Intention;
use intentions::widget::render::{escape_html, render_empty_state, render_message};
use intentions::widget::{CLEAR_CONFIRMATION, DEFAULT_RELOAD_DELAY, SIDEBAR_STORAGE_KEY};

/// Common CSS styles for all pages
const COMMON_STYLES: &str = r#"
    body {
        font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
        max-width: 800px;
        margin: 40px auto;
        padding: 0 20px;
        background: #f5f5f5;
    }
    .container {
        background: white;
        padding: 30px;
        border-radius: 8px;
        box-shadow: 0 2px 4px rgba(0,0,0,0.1);
    }
    h1 {
        color: #333;
        border-bottom: 2px solid #2e7d32;
        padding-bottom: 10px;
    }
    .form-group {
        margin: 15px 0;
    }
    label {
        display: block;
        font-weight: bold;
        margin-bottom: 5px;
        color: #333;
    }
    input[type="text"],
    input[type="password"],
    textarea {
        width: 100%;
        padding: 10px;
        border: 1px solid #ddd;
        border-radius: 4px;
        font-size: 14px;
        box-sizing: border-box;
    }
    button {
        background: #2e7d32;
        color: white;
        padding: 10px 20px;
        border: none;
        border-radius: 4px;
        cursor: pointer;
        font-size: 14px;
        font-weight: bold;
    }
    button:hover {
        background: #1b5e20;
    }
    .logout-btn {
        background: #999;
        float: right;
    }
    .error {
        color: #d9534f;
        background: #f2dede;
        padding: 10px;
        border-radius: 4px;
        margin: 10px 0;
    }
    .intentions {
        list-style: none;
        padding: 0;
    }
    .intention {
        padding: 10px;
        border-bottom: 1px solid #eee;
    }
    .intention.completed { text-decoration: line-through; color: #888; }
    .intention.neverminded { color: #aaa; font-style: italic; }
    .marker { margin-right: 6px; }
"#;

/// Sidebar styles, only on the home page
const CHAT_STYLES: &str = r#"
    .chat-toggle {
        position: fixed;
        right: 20px;
        bottom: 20px;
        border-radius: 24px;
    }
    .chat-toggle.active { background: #555; }
    .chat-sidebar {
        position: fixed;
        top: 0;
        right: 0;
        width: 380px;
        height: 100%;
        background: white;
        box-shadow: -2px 0 6px rgba(0,0,0,0.15);
        display: none;
        flex-direction: column;
    }
    .chat-sidebar.open { display: flex; }
    .chat-header { padding: 12px; border-bottom: 1px solid #eee; }
    .chat-messages { flex: 1; overflow-y: auto; padding: 12px; }
    .chat-message { margin: 8px 0; padding: 8px 12px; border-radius: 6px; }
    .chat-message.user { background: #e8f5e9; }
    .chat-message.assistant { background: #f5f5f5; }
    .chat-message.system { color: #b71c1c; font-size: 0.9em; }
    .chat-empty-state { color: #888; font-style: italic; }
    .tool-badge { font-size: 0.85em; margin-top: 4px; }
    .tool-badge.success { color: #2e7d32; }
    .tool-badge.failure { color: #c62828; }
    .tool-badge-label { font-weight: bold; margin: 0 4px; }
    .chat-form { padding: 12px; border-top: 1px solid #eee; }
"#;

/// Client behaviour of the sidebar.
///
/// Follows `intentions::widget::ChatWidget`: one request in flight with the
/// input disabled, optimistic user message, replies inserted from the
/// server-rendered `html` block, reload after a successful mutating tool.
const CHAT_SCRIPT: &str = r#"
(function () {
    const cfg = JSON.parse(document.getElementById('chat-config').textContent);
    const sidebar = document.getElementById('chat-sidebar');
    const toggle = document.getElementById('chat-toggle');
    const list = document.getElementById('chat-messages');
    const input = document.getElementById('chat-input');
    let loading = false;
    let showBadges = cfg.showToolConfirmations;

    function csrf() {
        const m = document.cookie.match(/(?:^|; )csrftoken=([^;]*)/);
        return m ? decodeURIComponent(m[1]) : '';
    }
    function setOpen(open) {
        sidebar.classList.toggle('open', open);
        toggle.classList.toggle('active', open);
        localStorage.setItem(cfg.storageKey, open ? 'true' : 'false');
        if (open) { input.focus(); }
    }
    function append(role, text) {
        const div = document.createElement('div');
        div.className = 'chat-message ' + role;
        const body = document.createElement('div');
        body.className = 'chat-message-content';
        body.style.whiteSpace = 'pre-wrap';
        body.textContent = text;
        div.appendChild(body);
        const empty = list.querySelector('.chat-empty-state');
        if (empty && role !== 'system') { empty.remove(); }
        list.appendChild(div);
        list.scrollTop = list.scrollHeight;
        return div;
    }
    function appendHtml(html) {
        const tpl = document.createElement('template');
        tpl.innerHTML = html;
        const empty = list.querySelector('.chat-empty-state');
        if (empty) { empty.remove(); }
        list.appendChild(tpl.content);
        list.scrollTop = list.scrollHeight;
    }
    async function post(path, body) {
        const res = await fetch(path, {
            method: 'POST',
            headers: { 'Content-Type': 'application/json', 'X-CSRFToken': csrf() },
            body: JSON.stringify(body),
        });
        const data = await res.json().catch(() => ({}));
        if (!res.ok) { throw new Error(data.error || ''); }
        return data;
    }
    async function send() {
        const text = input.value.trim();
        if (!text || loading) { return; }
        loading = true;
        input.disabled = true;
        input.value = '';
        append('user', text);
        const pending = append('assistant loading', 'Thinking…');
        try {
            const data = await post('/chat/send', { message: text, include_intentions: true });
            pending.remove();
            showBadges = data.show_tool_confirmations;
            const reply = data.assistant_message;
            appendHtml(reply.html || '');
            const execs = reply.tool_executions || [];
            if (execs.some(function (e) { return e.success && cfg.mutatingTools.includes(e.tool_name); })) {
                setTimeout(function () { location.reload(); }, cfg.reloadDelayMs);
            }
        } catch (err) {
            pending.remove();
            append('system', err.message ? 'Error: ' + err.message : cfg.sendFailed);
        } finally {
            loading = false;
            input.disabled = false;
            input.focus();
        }
    }
    async function clear() {
        if (!confirm(cfg.clearConfirmation)) { return; }
        try {
            const data = await post('/chat/clear', {});
            list.innerHTML = cfg.emptyState;
            append('system', 'Chat history cleared (' + data.deleted_count + ' messages deleted)');
        } catch (err) {
            append('system', err.message ? 'Error: ' + err.message : 'Failed to clear chat history.');
        }
    }

    document.addEventListener('click', function (e) {
        const action = e.target.closest('[data-chat-action]');
        if (!action) { return; }
        e.preventDefault();
        const name = action.dataset.chatAction;
        if (name === 'toggle') { setOpen(!sidebar.classList.contains('open')); }
        else if (name === 'close') { setOpen(false); }
        else if (name === 'send') { send(); }
        else if (name === 'clear') { clear(); }
    });
    document.addEventListener('keydown', function (e) {
        const t = e.target;
        const editable = t.tagName === 'INPUT' || t.tagName === 'TEXTAREA' || t.isContentEditable;
        if (e.key === 'Escape' && sidebar.classList.contains('open')) { setOpen(false); }
        else if (t === input && e.key === 'Enter' && !e.shiftKey) { e.preventDefault(); send(); }
        else if (!editable && e.key === 'c' && !e.ctrlKey && !e.metaKey && !e.altKey) {
            e.preventDefault();
            setOpen(!sidebar.classList.contains('open'));
        }
    });

    setOpen(localStorage.getItem(cfg.storageKey) === 'true');
})();
"#;

fn error_html(error: Option<&str>) -> String {
    error.map_or(String::new(), |e| {
        format!(r#"<div class="error">{}</div>"#, escape_html(e))
    })
}

/// Render the login page
pub fn login_page(error: Option<&str>, csrf_token: &str) -> String {
    let error_html = error_html(error);
    let csrf_token = escape_html(csrf_token);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Intentions - Login</title>
    <style>{COMMON_STYLES}</style>
</head>
<body>
    <div class="container">
        <h1>Intentions</h1>
        <h2>Login</h2>
        {error_html}
        <form method="POST" action="/login">
            <input type="hidden" name="csrf_token" value="{csrf_token}">
            <div class="form-group">
                <label for="username">Username:</label>
                <input type="text" id="username" name="username" required autofocus>
            </div>
            <div class="form-group">
                <label for="password">Password:</label>
                <input type="password" id="password" name="password">
                <small style="color: #666;">Leave blank for passwordless users</small>
            </div>
            <button type="submit">Login</button>
        </form>
        <p style="margin-top: 20px; text-align: center;">
            Don't have an account? <a href="/register">Register here</a>
        </p>
    </div>
</body>
</html>"#
    )
}

/// Render the registration page
pub fn register_page(error: Option<&str>, csrf_token: &str) -> String {
    let error_html = error_html(error);
    let csrf_token = escape_html(csrf_token);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Intentions - Register</title>
    <style>{COMMON_STYLES}</style>
</head>
<body>
    <div class="container">
        <h1>Intentions</h1>
        <h2>Register New Account</h2>
        {error_html}
        <form method="POST" action="/register">
            <input type="hidden" name="csrf_token" value="{csrf_token}">
            <div class="form-group">
                <label for="username">Username:</label>
                <input type="text" id="username" name="username" required autofocus
                       pattern="[a-zA-Z0-9_-]+"
                       title="Username must contain only letters, numbers, underscores, and hyphens">
                <small style="color: #666;">Letters, numbers, underscores, and hyphens only</small>
            </div>
            <div class="form-group">
                <label for="password">Password (optional):</label>
                <input type="password" id="password" name="password">
                <small style="color: #666;">Leave blank to create a passwordless account</small>
            </div>
            <div class="form-group">
                <label for="password_confirm">Confirm Password:</label>
                <input type="password" id="password_confirm" name="password_confirm">
                <small style="color: #666;">Required only if you set a password</small>
            </div>
            <button type="submit">Create Account</button>
        </form>
        <p style="margin-top: 20px; text-align: center;">
            Already have an account? <a href="/login">Login here</a>
        </p>
    </div>
</body>
</html>"#
    )
}

/// Everything the home page shows.
pub struct HomeView<'a> {
    pub username: &'a str,
    pub csrf_token: &'a str,
    pub working_day: chrono::NaiveDate,
    pub intentions: &'a [Intention],
    pub messages: &'a [ChatMessage],
    pub show_tool_confirmations: bool,
    pub mutating_tools: &'a [String],
}

fn intention_item(intention: &Intention) -> String {
    let mut markers = String::new();
    if intention.froggy {
        markers.push_str(r#"<span class="marker" title="Frog">🐸</span>"#);
    }
    if intention.sticky {
        markers.push_str(r#"<span class="marker" title="Sticky">📌</span>"#);
    }
    if intention.anxiety_inducing {
        markers.push_str(r#"<span class="marker" title="Anxiety inducing">😰</span>"#);
    }
    format!(
        r#"<li class="intention {}" data-id="{}">{markers}{}</li>"#,
        intention.status().as_str(),
        intention.id,
        escape_html(&intention.title)
    )
}

/// Attach the rendered assistant block to a `/chat/send` response.
pub fn render_reply(response: &mut SendResponse) {
    let reply = &mut response.assistant_message;
    reply.html = Some(render_message(
        reply.role,
        &reply.content,
        reply.executions(),
        response.show_tool_confirmations,
    ));
}

/// Render the transcript the way the widget does on history load.
pub fn transcript_html(messages: &[ChatMessage], show_badges: bool) -> String {
    if messages.is_empty() {
        return render_empty_state();
    }
    messages
        .iter()
        .map(|m| render_message(m.role, &m.content, m.executions(), show_badges))
        .collect()
}

/// Render the home page with the chat sidebar
pub fn home_page(view: &HomeView<'_>) -> String {
    let intentions_html = if view.intentions.is_empty() {
        r#"<p style="color: #666; font-style: italic;">No intentions for today yet. Ask the assistant to add some.</p>"#
            .to_string()
    } else {
        let items: String = view.intentions.iter().map(intention_item).collect();
        format!(r#"<ul class="intentions">{items}</ul>"#)
    };

    let transcript = transcript_html(view.messages, view.show_tool_confirmations);
    let config = serde_json::json!({
        "storageKey": SIDEBAR_STORAGE_KEY,
        "mutatingTools": view.mutating_tools,
        "reloadDelayMs": DEFAULT_RELOAD_DELAY.as_millis() as u64,
        "showToolConfirmations": view.show_tool_confirmations,
        "clearConfirmation": CLEAR_CONFIRMATION,
        "sendFailed": "Sorry, something went wrong sending your message. Please try again.",
        "emptyState": render_empty_state(),
    })
    // Keep the JSON inert inside the script element.
    .to_string()
    .replace("</", "<\\/");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Intentions - {day}</title>
    <style>{COMMON_STYLES}{CHAT_STYLES}</style>
</head>
<body>
    <div class="container">
        <h1>{day_long}
            <form method="POST" action="/logout" style="display: inline;">
                <input type="hidden" name="csrf_token" value="{csrf}">
                <button type="submit" class="logout-btn">Logout</button>
            </form>
        </h1>
        <p style="color: #666;">Logged in as {username}</p>
        {intentions_html}
    </div>

    <button id="chat-toggle" class="chat-toggle" data-chat-action="toggle">Chat</button>
    <aside id="chat-sidebar" class="chat-sidebar">
        <div class="chat-header">
            <strong>Assistant</strong>
            <button data-chat-action="clear" style="float: right; margin-left: 6px;">Clear</button>
            <button data-chat-action="close" style="float: right;">✕</button>
        </div>
        <div id="chat-messages" class="chat-messages">{transcript}</div>
        <div class="chat-form">
            <textarea id="chat-input" rows="3" placeholder="Message the assistant (Enter to send, Shift+Enter for a new line)"></textarea>
            <button data-chat-action="send" style="margin-top: 6px;">Send</button>
        </div>
    </aside>
    <script id="chat-config" type="application/json">{config}</script>
    <script>{CHAT_SCRIPT}</script>
</body>
</html>"#,
        day = view.working_day.format("%Y-%m-%d"),
        day_long = view.working_day.format("%A, %B %-d"),
        csrf = escape_html(view.csrf_token),
        username = escape_html(view.username),
    )
}
