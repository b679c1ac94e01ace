//! XML rendering.
//!
//! This module turns a canonicalized `Document` tree back into indented XML
//! text. The XML declaration is not written here; the sorter reattaches the
//! one it captured from the input.

pub mod xml;

pub use xml::{render, render_to, RenderOptions};
