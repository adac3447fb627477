use serde::{Deserialize, Serialize};

/// Default swatch palette, cycled when series carry no explicit color.
pub const DEFAULT_PALETTE: [&str; 7] = [
    "#7aa2f7", "#9ece6a", "#f7768e", "#e0af68", "#bb9af7", "#7dcfff", "#c0caf5",
];

/// One plotted series. Values are percentages; anything outside 0..=100 is
/// clamped at draw time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub data: Vec<f64>,
    #[serde(default)]
    pub color: Option<String>,
}

impl Series {
    pub fn new(name: impl Into<String>, data: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            data,
            color: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 16.0,
            right: 16.0,
            bottom: 28.0,
            left: 40.0,
        }
    }
}

fn default_width() -> f64 {
    720.0
}

fn default_height() -> f64 {
    260.0
}

fn default_grid_y() -> bool {
    true
}

fn default_stroke_width() -> f64 {
    2.0
}

fn default_legend() -> bool {
    true
}

fn default_palette() -> Vec<String> {
    DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
}

/// Chart tunables with the original widget's defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChartOptions {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default)]
    pub margins: Margins,
    #[serde(default = "default_grid_y")]
    pub grid_y: bool,
    #[serde(default)]
    pub grid_x: bool,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
    #[serde(default = "default_legend")]
    pub legend: bool,
    /// Pre-formatted legend values; when empty, each series shows its latest
    /// value as `NN%`.
    #[serde(default)]
    pub legend_values: Vec<String>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            margins: Margins::default(),
            grid_y: true,
            grid_x: false,
            stroke_width: default_stroke_width(),
            palette: default_palette(),
            legend: true,
            legend_values: Vec::new(),
        }
    }
}

impl ChartOptions {
    pub(crate) fn color_for<'a>(&'a self, series: &'a Series, index: usize) -> &'a str {
        if let Some(color) = &series.color {
            return color;
        }
        if self.palette.is_empty() {
            return DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()];
        }
        &self.palette[index % self.palette.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_widget_defaults() {
        let opts = ChartOptions::default();
        assert_eq!(opts.width, 720.0);
        assert_eq!(opts.height, 260.0);
        assert_eq!(opts.margins.left, 40.0);
        assert!(opts.grid_y);
        assert!(!opts.grid_x);
        assert_eq!(opts.palette.len(), 7);
    }

    #[test]
    fn explicit_color_wins_over_palette() {
        let opts = ChartOptions::default();
        let mut series = Series::new("cpu", vec![1.0]);
        assert_eq!(opts.color_for(&series, 0), "#7aa2f7");
        series.color = Some("#ffffff".into());
        assert_eq!(opts.color_for(&series, 0), "#ffffff");
    }

    #[test]
    fn palette_cycles() {
        let opts = ChartOptions::default();
        let series = Series::new("s", vec![]);
        assert_eq!(opts.color_for(&series, 7), "#7aa2f7");
    }
}
