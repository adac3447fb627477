//! Percent line chart as a static SVG string.
//!
//! Renders 0-100% time series into a `chart-header` (title + legend) and a
//! `chart-body` holding the `<svg>`. No assumptions about where the markup
//! ends up; callers attach it to whatever UI they drive.

mod chart;
mod options;
mod svg;

pub use chart::render;
pub use options::{ChartOptions, Margins, Series};
pub use svg::escape_xml;
