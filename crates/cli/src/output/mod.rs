//! Output formatting

mod formatter;

pub use formatter::Formatter;

/// Global output switches
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Strict JSON output, no colors or progress
    pub json: bool,
    pub no_color: bool,
    /// Suppress everything except errors
    pub quiet: bool,
}
