//! Key and mouse bindings: arrows or vim-style hjkl.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
    Select,
    Restart,
    Quit,
    None,
}

/// Map key event to an action. Supports both arrows and vim keys.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('r' | 'R') => Action::Restart,
        KeyCode::Left | KeyCode::Char('h') => Action::Left,
        KeyCode::Right | KeyCode::Char('l') => Action::Right,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Select,
        _ => Action::None,
    }
}

/// Terminal position of a left click, if this is one.
pub fn mouse_click(mouse: MouseEvent) -> Option<(u16, u16)> {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some((mouse.column, mouse.row)),
        _ => None,
    }
}
