//! Taskline library crate
//!
//! A layered task forest: tasks live on depth levels, every task below the
//! root level points at a parent on the level directly above, and drag-and-drop
//! gestures are classified into structural edits of that forest.

pub mod api;
pub mod cli;
pub mod gesture;
pub mod guide;
pub mod levels;
pub mod models;
pub mod ops;
pub mod session;
pub mod view;

// Re-export the main types for convenience
pub use gesture::{apply_gesture, Gesture, GestureKind, GestureOutcome};
pub use models::{
    parse_spec, Forest, ForestError, Level, LevelId, Position, Reference, Task, TaskId, TaskSpec,
};
pub use session::{Core, Session, TransitionLogEntry};
pub use view::{build_view, span, LevelView, ViewRow};
