//! Focus: scopes, rings and the manager that owns the single focus.

pub mod manager;
pub mod ring;

pub use manager::FocusManager;
pub use ring::FocusRing;

/// How a node takes part in focus navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FocusScope {
    /// Not an entry; descendants are enumerated as usual.
    #[default]
    None,
    /// A ring entry of its own.
    Focusable,
    /// A composite: one entry in its ancestor's ring, with an internal ring
    /// over its own subtree. With `wrap`, Tab cycles inside; without it,
    /// moving past either end hands the key to the enclosing scope.
    Managed { wrap: bool },
}

impl FocusScope {
    pub fn is_managed(self) -> bool {
        matches!(self, FocusScope::Managed { .. })
    }
}
