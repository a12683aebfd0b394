//! Event handling for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Key action that can be performed in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    // Navigation
    MoveUp,
    MoveDown,
    JumpToTop,
    JumpToBottom,
    PageUp,
    PageDown,

    // Directory navigation
    DrillDown,
    NavigateBack,

    /// Toggle selection of the current item (Space).
    ToggleSelect,
    /// Delete selected items (with confirmation).
    Delete,

    /// Switch to or from the large-file spotlight.
    Spotlight,
    /// Rescan the current level.
    Refresh,

    // Current item
    /// Open with the system default application.
    Open,
    /// Show in the file manager.
    Reveal,
    /// Show details including last access.
    Info,

    // UI toggles
    ToggleHelp,
    ToggleTheme,

    // Confirmation
    Confirm,
    Cancel,

    // Application
    Quit,
    ForceQuit,

    // No action
    None,
}

impl KeyAction {
    /// Convert a key event to an action.
    pub fn from_key_event(event: KeyEvent) -> Self {
        match (event.code, event.modifiers) {
            (KeyCode::Char('q'), KeyModifiers::NONE) => KeyAction::Quit,
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => KeyAction::ForceQuit,

            (KeyCode::Esc, _) => KeyAction::Cancel,

            // Navigation - vim style
            (KeyCode::Char('j'), KeyModifiers::NONE) => KeyAction::MoveDown,
            (KeyCode::Char('k'), KeyModifiers::NONE) => KeyAction::MoveUp,

            // Arrows
            (KeyCode::Down, _) => KeyAction::MoveDown,
            (KeyCode::Up, _) => KeyAction::MoveUp,
            (KeyCode::Right, _) => KeyAction::DrillDown,
            (KeyCode::Left, _) => KeyAction::NavigateBack,

            // Jump
            (KeyCode::Char('g'), KeyModifiers::NONE) => KeyAction::JumpToTop,
            (KeyCode::Char('G'), _) => KeyAction::JumpToBottom,
            (KeyCode::Home, _) => KeyAction::JumpToTop,
            (KeyCode::End, _) => KeyAction::JumpToBottom,

            // Page navigation
            (KeyCode::PageUp, _) => KeyAction::PageUp,
            (KeyCode::PageDown, _) => KeyAction::PageDown,
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => KeyAction::PageUp,
            (KeyCode::Char('d'), KeyModifiers::CONTROL) => KeyAction::PageDown,

            // Directory navigation
            (KeyCode::Enter, _) => KeyAction::DrillDown,
            (KeyCode::Backspace, _) => KeyAction::NavigateBack,

            // Selection and deletion
            (KeyCode::Char(' '), KeyModifiers::NONE) => KeyAction::ToggleSelect,
            (KeyCode::Char('d'), KeyModifiers::NONE) => KeyAction::Delete,
            (KeyCode::Delete, _) => KeyAction::Delete,

            // Views
            (KeyCode::Char('l'), KeyModifiers::NONE) => KeyAction::Spotlight,
            (KeyCode::Char('r'), KeyModifiers::NONE) => KeyAction::Refresh,

            // Current item
            (KeyCode::Char('o'), KeyModifiers::NONE) => KeyAction::Open,
            (KeyCode::Char('f'), KeyModifiers::NONE) => KeyAction::Reveal,
            (KeyCode::Char('i'), KeyModifiers::NONE) => KeyAction::Info,

            // UI toggles
            (KeyCode::Char('?'), _) => KeyAction::ToggleHelp,
            (KeyCode::Char('t'), KeyModifiers::NONE) => KeyAction::ToggleTheme,

            // Dialog answers
            (KeyCode::Char('y'), KeyModifiers::NONE) => KeyAction::Confirm,
            (KeyCode::Char('n'), KeyModifiers::NONE) => KeyAction::Cancel,

            _ => KeyAction::None,
        }
    }
}

/// A section of key bindings for the help display.
pub struct HelpSection {
    pub title: &'static str,
    pub bindings: Vec<KeyBinding>,
}

/// Key binding for display in help.
pub struct KeyBinding {
    pub keys: &'static str,
    pub description: &'static str,
}

/// Get all key bindings organized by section for help display.
pub fn get_help_sections() -> Vec<HelpSection> {
    vec![
        HelpSection {
            title: "Navigation",
            bindings: vec![
                KeyBinding {
                    keys: "j/k ↑/↓",
                    description: "Move up/down",
                },
                KeyBinding {
                    keys: "Enter/→",
                    description: "Open directory",
                },
                KeyBinding {
                    keys: "Bksp/←",
                    description: "Go back",
                },
                KeyBinding {
                    keys: "g/G",
                    description: "Jump to top/bottom",
                },
                KeyBinding {
                    keys: "PgUp/PgDn",
                    description: "Page up/down",
                },
            ],
        },
        HelpSection {
            title: "Selection",
            bindings: vec![
                KeyBinding {
                    keys: "Space",
                    description: "Select item",
                },
                KeyBinding {
                    keys: "d/Del",
                    description: "Delete selection",
                },
                KeyBinding {
                    keys: "y/Enter",
                    description: "Confirm deletion",
                },
                KeyBinding {
                    keys: "n/Esc",
                    description: "Cancel / interrupt",
                },
            ],
        },
        HelpSection {
            title: "Views",
            bindings: vec![
                KeyBinding {
                    keys: "l",
                    description: "Large-file spotlight",
                },
                KeyBinding {
                    keys: "r",
                    description: "Rescan (bypass cache)",
                },
                KeyBinding {
                    keys: "t",
                    description: "Toggle dark/light theme",
                },
            ],
        },
        HelpSection {
            title: "Current item",
            bindings: vec![
                KeyBinding {
                    keys: "o",
                    description: "Open with default app",
                },
                KeyBinding {
                    keys: "f",
                    description: "Reveal in file manager",
                },
                KeyBinding {
                    keys: "i",
                    description: "Details and last access",
                },
            ],
        },
        HelpSection {
            title: "Application",
            bindings: vec![
                KeyBinding {
                    keys: "?",
                    description: "Show this help",
                },
                KeyBinding {
                    keys: "q",
                    description: "Quit",
                },
                KeyBinding {
                    keys: "Ctrl-c",
                    description: "Force quit",
                },
            ],
        },
    ]
}
