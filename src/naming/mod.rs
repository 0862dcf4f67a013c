pub mod color;
pub mod dimension;
pub mod offline;

pub use color::{ColorNamer, ColorSource, ResolvedColor, sanitize_color_name};
pub use offline::{NamedColorTable, OfflineResolver};

/// A name for a hex value and how far the named color is from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorNameRecord {
    pub name: String,
    /// 0 for an exact catalog hit.
    pub distance: f64,
}
