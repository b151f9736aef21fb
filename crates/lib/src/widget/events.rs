//! Input events routed through [`super::ChatWidget::dispatch`].

/// Where keyboard focus was when an event fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// The chat message input
    ChatInput,
    /// Any other text field on the page
    Editable,
    /// Nothing editable
    #[default]
    Page,
}

impl Focus {
    pub fn is_editable(&self) -> bool {
        !matches!(self, Focus::Page)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Backspace,
    Char(char),
}

/// A key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub shift: bool,
    /// Ctrl, Alt or Meta held
    pub modifier: bool,
    pub target: Focus,
}

impl KeyEvent {
    pub fn new(key: Key, target: Focus) -> Self {
        Self {
            key,
            shift: false,
            modifier: false,
            target,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_modifier(mut self) -> Self {
        self.modifier = true;
        self
    }
}

/// Clickable controls of the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Toggle,
    Close,
    Send,
    Clear,
}

/// Everything the widget reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    Key(KeyEvent),
    Click(Control),
    /// The input field's content was replaced
    Input(String),
}
