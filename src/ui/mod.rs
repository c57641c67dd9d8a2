// UI interaction layer
// Rendering is left to the host; this module turns pointer input into store edits

pub mod drag;

pub use drag::{
    DragController, DragGesture, DragKind, DragUpdate, GridGeometry, PointerButton,
    PointerPosition, PressOutcome,
};
