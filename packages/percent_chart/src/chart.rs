//! Chart assembly: axes, grid, series paths, legend.

use chrono::DateTime;

use crate::options::{ChartOptions, Series};
use crate::svg::{el, escape_xml, leaf};

const Y_TICKS: [f64; 4] = [25.0, 50.0, 75.0, 100.0];

/// Render a percent line chart to markup: a `chart-header` block (title and
/// legend) followed by a `chart-body` block holding the SVG.
///
/// `times` are per-sample timestamps for the x-axis labels, seconds or
/// milliseconds since the epoch (more than ten digits means milliseconds);
/// pass an empty slice to label by sample index instead.
pub fn render(title: &str, series: &[Series], times: &[i64], opts: &ChartOptions) -> String {
    let mut out = String::new();
    out.push_str(&header(title, series, opts));
    out.push_str(&el(
        "div",
        &[("class", "chart-body".to_string())],
        &draw_svg(series, times, opts),
    ));
    out
}

fn header(title: &str, series: &[Series], opts: &ChartOptions) -> String {
    let mut body = el(
        "h2",
        &[("class", "m-0".to_string())],
        &escape_xml(title),
    );
    if opts.legend {
        body.push_str(&legend(series, opts));
    }
    el("div", &[("class", "chart-header".to_string())], &body)
}

fn legend(series: &[Series], opts: &ChartOptions) -> String {
    let mut items = String::new();
    for (i, s) in series.iter().enumerate() {
        let swatch = el(
            "span",
            &[
                ("class", "legend-swatch".to_string()),
                ("style", format!("background:{}", opts.color_for(s, i))),
            ],
            "",
        );
        let name = el(
            "span",
            &[("style", "margin-right:6px".to_string())],
            &escape_xml(&s.name),
        );
        let value = legend_value(s, i, opts)
            .map(|v| el("span", &[("class", "legend-value".to_string())], &escape_xml(&v)))
            .unwrap_or_default();
        items.push_str(&el(
            "div",
            &[("class", "legend-item".to_string())],
            &format!("{swatch}{name}{value}"),
        ));
    }
    el("div", &[("class", "legend".to_string())], &items)
}

fn legend_value(series: &Series, index: usize, opts: &ChartOptions) -> Option<String> {
    if let Some(custom) = opts.legend_values.get(index) {
        return Some(custom.clone());
    }
    series
        .data
        .last()
        .map(|v| format!("{:.0}%", clamp01(*v)))
}

fn draw_svg(series: &[Series], times: &[i64], opts: &ChartOptions) -> String {
    let inner_w = opts.width - opts.margins.left - opts.margins.right;
    let inner_h = opts.height - opts.margins.top - opts.margins.bottom;
    let (top, left) = (opts.margins.top, opts.margins.left);
    let n = series.iter().map(|s| s.data.len()).max().unwrap_or(0);

    let mut body = String::new();

    // Axes
    let mut axes = String::new();
    axes.push_str(&leaf(
        "line",
        &[
            ("x1", fmt(left)),
            ("y1", fmt(top + inner_h)),
            ("x2", fmt(left + inner_w)),
            ("y2", fmt(top + inner_h)),
            ("stroke", "var(--border-hard)".to_string()),
            ("stroke-width", "1".to_string()),
        ],
    ));
    axes.push_str(&leaf(
        "line",
        &[
            ("x1", fmt(left)),
            ("y1", fmt(top)),
            ("x2", fmt(left)),
            ("y2", fmt(top + inner_h)),
            ("stroke", "var(--border-hard)".to_string()),
            ("stroke-width", "1".to_string()),
        ],
    ));
    body.push_str(&el("g", &[], &axes));

    // Y ticks: dashed gridlines plus percentage labels
    for v in Y_TICKS {
        let y = top + (1.0 - v / 100.0) * inner_h;
        if opts.grid_y {
            body.push_str(&leaf(
                "line",
                &[
                    ("x1", fmt(left)),
                    ("y1", fmt(y)),
                    ("x2", fmt(left + inner_w)),
                    ("y2", fmt(y)),
                    ("stroke", "var(--border)".to_string()),
                    ("stroke-width", "1".to_string()),
                    ("stroke-dasharray", "6 2".to_string()),
                ],
            ));
        }
        body.push_str(&el(
            "text",
            &[
                ("x", fmt(left - 8.0)),
                ("y", fmt(y)),
                ("text-anchor", "end".to_string()),
                ("dominant-baseline", "middle".to_string()),
                ("fill", "var(--text-secondary)".to_string()),
                ("font-size", "11".to_string()),
            ],
            &format!("{:.0}%", v),
        ));
    }

    // X labels at the first, middle, and last sample
    if n >= 2 {
        for i in [0, (n - 1) / 2, n - 1] {
            let x = left + i as f64 * (inner_w / (n - 1) as f64);
            let anchor = if i == 0 {
                "start"
            } else if i == n - 1 {
                "end"
            } else {
                "middle"
            };
            let label = times
                .get(i)
                .map(|t| fmt_time(*t))
                .unwrap_or_else(|| i.to_string());
            body.push_str(&el(
                "text",
                &[
                    ("x", fmt(x)),
                    ("y", fmt(top + inner_h + 16.0)),
                    ("text-anchor", anchor.to_string()),
                    ("fill", "var(--text-secondary)".to_string()),
                    ("font-size", "11".to_string()),
                ],
                &label,
            ));
        }
    }

    // Optional vertical grid
    if opts.grid_x && n > 1 {
        let mut grid = String::new();
        for i in 0..n {
            let x = i as f64 * (inner_w / (n - 1) as f64);
            grid.push_str(&leaf(
                "line",
                &[
                    ("x1", fmt(x)),
                    ("y1", "0".to_string()),
                    ("x2", fmt(x)),
                    ("y2", fmt(inner_h)),
                    ("stroke", "var(--border)".to_string()),
                    ("stroke-width", "1.5".to_string()),
                ],
            ));
        }
        body.push_str(&el(
            "g",
            &[("transform", format!("translate({},{})", fmt(left), fmt(top)))],
            &grid,
        ));
    }

    // Series paths
    let mut paths = String::new();
    for (i, s) in series.iter().enumerate() {
        paths.push_str(&leaf(
            "path",
            &[
                ("d", build_path(&s.data, inner_w, inner_h)),
                ("fill", "none".to_string()),
                ("stroke", opts.color_for(s, i).to_string()),
                ("stroke-width", fmt(opts.stroke_width)),
                ("stroke-linecap", "round".to_string()),
                ("stroke-linejoin", "round".to_string()),
            ],
        ));
    }
    body.push_str(&el(
        "g",
        &[("transform", format!("translate({},{})", fmt(left), fmt(top)))],
        &paths,
    ));

    el(
        "svg",
        &[
            ("viewBox", format!("0 0 {} {}", fmt(opts.width), fmt(opts.height))),
            ("class", "chart".to_string()),
            ("role", "img".to_string()),
            ("aria-label", "Percent line chart".to_string()),
        ],
        &body,
    )
}

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 100.0)
}

/// Map sample `i` of `n` to chart coordinates. A lone sample sits centered.
fn xy(i: usize, v: f64, n: usize, inner_w: f64, inner_h: f64) -> (f64, f64) {
    let x = if n <= 1 {
        inner_w / 2.0
    } else {
        i as f64 * (inner_w / (n - 1) as f64)
    };
    let y = (1.0 - clamp01(v) / 100.0) * inner_h;
    (x, y)
}

fn build_path(data: &[f64], inner_w: f64, inner_h: f64) -> String {
    let n = data.len();
    let mut d = String::new();
    for (i, v) in data.iter().enumerate() {
        let (x, y) = xy(i, *v, n, inner_w, inner_h);
        if i == 0 {
            d.push_str(&format!("M {:.2} {:.2}", x, y));
        } else {
            d.push_str(&format!(" L {:.2} {:.2}", x, y));
        }
    }
    d
}

/// More than ten digits means milliseconds, otherwise seconds.
fn fmt_time(t: i64) -> String {
    let datetime = if t.abs().to_string().len() > 10 {
        DateTime::from_timestamp_millis(t)
    } else {
        DateTime::from_timestamp(t, 0)
    };
    match datetime {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => String::new(),
    }
}

fn fmt(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_spans_inner_width() {
        // 0% sits on the baseline, 100% at the top.
        let d = build_path(&[0.0, 100.0], 100.0, 50.0);
        assert_eq!(d, "M 0.00 50.00 L 100.00 0.00");
    }

    #[test]
    fn values_are_clamped() {
        let d = build_path(&[-20.0, 150.0], 100.0, 50.0);
        assert_eq!(d, "M 0.00 50.00 L 100.00 0.00");
    }

    #[test]
    fn single_sample_is_centered() {
        let d = build_path(&[50.0], 100.0, 50.0);
        assert_eq!(d, "M 50.00 25.00");
    }

    #[test]
    fn seconds_and_millis_timestamps() {
        assert_eq!(fmt_time(0), "00:00:00");
        assert_eq!(fmt_time(86_399), "23:59:59");
        // Same instant, milliseconds (more than ten digits).
        assert_eq!(fmt_time(1_700_000_000), "22:13:20");
        assert_eq!(fmt_time(1_700_000_000_000), "22:13:20");
    }

    #[test]
    fn title_and_series_names_are_escaped() {
        let series = [Series::new("<cpu>", vec![10.0, 20.0])];
        let markup = render("a < b", &series, &[], &ChartOptions::default());
        assert!(markup.contains("a &lt; b"));
        assert!(markup.contains("&lt;cpu&gt;"));
        assert!(!markup.contains("<cpu>"));
    }

    #[test]
    fn legend_shows_latest_value() {
        let series = [Series::new("cpu", vec![10.0, 42.4])];
        let markup = render("t", &series, &[], &ChartOptions::default());
        assert!(markup.contains("42%"));
    }

    #[test]
    fn custom_legend_values_win() {
        let series = [Series::new("cpu", vec![10.0])];
        let opts = ChartOptions {
            legend_values: vec!["3 load".to_string()],
            ..ChartOptions::default()
        };
        let markup = render("t", &series, &[], &opts);
        assert!(markup.contains("3 load"));
        assert!(!markup.contains("10%"));
    }

    #[test]
    fn empty_chart_still_renders_frame() {
        let markup = render("empty", &[], &[], &ChartOptions::default());
        assert!(markup.contains("<svg"));
        assert!(markup.contains("viewBox=\"0 0 720 260\""));
        assert!(markup.contains("100%"));
    }
}
