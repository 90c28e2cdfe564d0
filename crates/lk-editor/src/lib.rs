//! LK editor: element store, drag gestures, the update coordinator and
//! undo/redo.

pub mod commands;
pub mod coordinator;
pub mod gesture;
pub mod store;

pub use commands::CommandStack;
pub use coordinator::Coordinator;
pub use gesture::{DragFeedback, DragGesture, GestureKind};
pub use store::{Document, ElementStore};
