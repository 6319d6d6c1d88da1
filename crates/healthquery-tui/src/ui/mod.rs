//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, status bar and overlays
//! - `input`: keyboard event handling
//! - `styles`: colors and text styling
//! - `views`: the auth form and the query workspace panels

pub mod input;
pub mod render;
pub mod styles;
pub mod views;
