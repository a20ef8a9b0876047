//! Editor-side interfaces
//!
//! The contract between the engine and the host's text widget.

mod surface;

pub use surface::{
    cursor_at_offset, offset_of_cursor, CursorPosition, EditorSurface, LineBlock, LineGeometry,
    ScrollInfo,
};
