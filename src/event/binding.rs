//! Key bindings: the screen-wide registry and per-node bindings.
//!
//! [`KeyBindingRegistry`] maps key+modifier combinations to screen-level
//! [`BindingAction`]s. The `with_defaults()` constructor installs standard
//! bindings (Ctrl+C -> Quit, etc.). Nodes declare their own
//! [`InputBindings`] through a [`BindingBuilder`]; those run node [`Action`]s
//! and are consulted first, along the focus path.

use std::collections::HashMap;

use super::action::Action;
use super::input::{Key, KeyEvent, Modifiers};

// ---------------------------------------------------------------------------
// BindingAction
// ---------------------------------------------------------------------------

/// Screen-level action taken when a registry binding is matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingAction {
    /// Quit the application.
    Quit,
    /// Move focus to the next focusable node.
    FocusNext,
    /// Move focus to the previous focusable node.
    FocusPrevious,
    /// Pop the top popup, if any.
    DismissPopup,
    /// A named command, surfaced to the application.
    Custom(String),
}

// ---------------------------------------------------------------------------
// KeyBindingRegistry
// ---------------------------------------------------------------------------

/// Registry of key bindings, mapping (Key, Modifiers) -> BindingAction.
#[derive(Debug)]
pub struct KeyBindingRegistry {
    bindings: HashMap<(Key, Modifiers), BindingAction>,
}

impl KeyBindingRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Create a registry with standard default bindings.
    ///
    /// Defaults:
    /// - `Ctrl+C` -> Quit
    /// - `Tab` -> FocusNext
    /// - `BackTab` (Shift+Tab) -> FocusPrevious
    /// - `Escape` -> DismissPopup
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.bind(Key::Char('c'), Modifiers::CTRL, BindingAction::Quit);
        registry.bind(Key::Tab, Modifiers::NONE, BindingAction::FocusNext);
        registry.bind(
            Key::BackTab,
            Modifiers::NONE,
            BindingAction::FocusPrevious,
        );
        registry.bind(Key::Escape, Modifiers::NONE, BindingAction::DismissPopup);
        registry
    }

    /// Register a key binding.
    ///
    /// If a binding already exists for this key+modifier combination, it is replaced.
    pub fn bind(&mut self, key: Key, modifiers: Modifiers, action: BindingAction) {
        self.bindings.insert((key, modifiers), action);
    }

    /// Remove a key binding.
    ///
    /// Returns the removed action, if any.
    pub fn unbind(&mut self, key: Key, modifiers: Modifiers) -> Option<BindingAction> {
        self.bindings.remove(&(key, modifiers))
    }

    /// Look up the action for a given key event (exact key + modifiers).
    pub fn resolve(&self, event: &KeyEvent) -> Option<&BindingAction> {
        self.bindings.get(&(event.code, event.modifiers))
    }

    /// Number of registered bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the registry has no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for KeyBindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Per-node bindings
// ---------------------------------------------------------------------------

/// A node's key bindings, built once when the node enters the tree.
#[derive(Debug, Default)]
pub struct InputBindings {
    entries: Vec<(Key, Modifiers, Action)>,
}

impl InputBindings {
    /// The action bound to `event`. Later bindings shadow earlier ones.
    pub fn lookup_mut(&mut self, event: &KeyEvent) -> Option<&mut Action> {
        self.entries
            .iter_mut()
            .rev()
            .find(|(key, mods, _)| *key == event.code && *mods == event.modifiers)
            .map(|(_, _, action)| action)
    }

    pub fn contains(&self, event: &KeyEvent) -> bool {
        self.entries
            .iter()
            .any(|(key, mods, _)| *key == event.code && *mods == event.modifiers)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects a node's bindings in
/// [`Node::configure_bindings`](crate::node::Node::configure_bindings).
#[derive(Debug, Default)]
pub struct BindingBuilder {
    entries: Vec<(Key, Modifiers, Action)>,
}

impl BindingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, key: Key, modifiers: Modifiers, action: Action) -> &mut Self {
        self.entries.push((key, modifiers, action));
        self
    }

    /// Bind an unmodified key.
    pub fn on(&mut self, key: Key, action: Action) -> &mut Self {
        self.bind(key, Modifiers::NONE, action)
    }

    pub fn build(self) -> InputBindings {
        InputBindings { entries: self.entries }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
