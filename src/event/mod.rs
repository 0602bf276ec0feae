//! Event system: input, key bindings, actions, drag gestures, dispatch.

pub mod action;
pub mod binding;
pub mod dispatch;
pub mod drag;
pub mod input;

pub use action::{Action, ActionCx, DrainStats, Mutation, MutationQueue, MutationSender};
pub use binding::{BindingAction, BindingBuilder, InputBindings, KeyBindingRegistry};
pub use dispatch::{hit_test, EventCx, HitFilter, KeyOutcome, Request};
pub use drag::{DragFn, DragHandler, DragState};
pub use input::{
    ClickTracker, InputEvent, Key, KeyEvent, Modifiers, MouseAction, MouseBtn, MouseEvent,
    WheelDirection,
};
