//! SVG rendering of chart series with plotters.

use crate::report::ChartSeries;
use blip_common::{InsightsError, Result};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Category labels drawn at most; wider charts label every n-th bar
const MAX_X_LABELS: usize = 16;

/// Bar color palettes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// Blue for in-hours, orange for out-of-hours.
    #[default]
    Default,
    /// Greys, for printing.
    Monochrome,
    /// `#rrggbb` colors.
    Custom(Vec<String>),
}

impl ColorScheme {
    /// Palette colors, cycled over series
    pub fn colors(&self) -> Vec<RGBColor> {
        match self {
            Self::Default => vec![
                RGBColor(31, 119, 180),  // Blue
                RGBColor(255, 127, 14),  // Orange
                RGBColor(44, 160, 44),   // Green
            ],
            Self::Monochrome => vec![
                RGBColor(64, 64, 64),    // Dark Gray
                RGBColor(160, 160, 160), // Light Gray
            ],
            Self::Custom(colors) => {
                let parsed: Vec<RGBColor> = colors.iter().filter_map(|c| parse_color(c)).collect();
                if parsed.is_empty() {
                    Self::Default.colors()
                } else {
                    parsed
                }
            }
        }
    }
}

/// Parse a `#rrggbb` color
pub fn parse_color(color: &str) -> Option<RGBColor> {
    let hex = color.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(RGBColor(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Size, colors and fonts of rendered charts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartStyle {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `#rrggbb` background.
    pub background: String,
    /// Bar colors.
    pub colors: ColorScheme,
    /// Font family.
    pub font_family: String,
    /// Title size in points.
    pub title_size: u32,
    /// Label size in points.
    pub label_size: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 480,
            background: "#ffffff".to_string(),
            colors: ColorScheme::Default,
            font_family: "sans-serif".to_string(),
            title_size: 22,
            label_size: 13,
        }
    }
}

impl ChartStyle {
    /// Default style at a given size
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}

/// Renders a chart to a self-contained document.
pub trait ChartRenderer: Send + Sync {
    /// Render `chart`
    fn render(&self, chart: &ChartSeries) -> Result<String>;

    /// File extension of rendered documents
    fn extension(&self) -> &'static str;
}

/// Stacked bar charts as SVG.
#[derive(Debug, Clone, Default)]
pub struct SvgChartRenderer {
    style: ChartStyle,
}

impl SvgChartRenderer {
    /// Renderer with `style`
    pub const fn new(style: ChartStyle) -> Self {
        Self { style }
    }

    /// The style in use
    pub const fn style(&self) -> &ChartStyle {
        &self.style
    }

    #[allow(clippy::cast_precision_loss)]
    fn draw(&self, chart: &ChartSeries, svg: &mut String) -> Result<()> {
        let style = &self.style;
        let count = chart.labels.len();
        if count == 0 {
            return Err(InsightsError::render(format!("chart '{}' has no categories", chart.title)));
        }

        let background = parse_color(&style.background).unwrap_or(WHITE);
        let palette = style.colors.colors();
        let y_max = (chart.max_total().max(1) as f64 * 1.1).ceil();

        let root = SVGBackend::with_string(svg, (style.width, style.height)).into_drawing_area();
        root.fill(&background)?;

        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, (style.font_family.as_str(), style.title_size))
            .margin(16)
            .x_label_area_size(56)
            .y_label_area_size(64)
            .build_cartesian_2d(0f64..count as f64, 0f64..y_max)?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .x_labels(0)
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_str())
            .y_label_formatter(&|v| format!("{v:.0}"))
            .label_style((style.font_family.as_str(), style.label_size))
            .draw()?;

        let mut base = vec![0u64; count];
        for (index, series) in chart.series.iter().enumerate() {
            let color = palette[index % palette.len()];
            let bars: Vec<Rectangle<(f64, f64)>> = series
                .values
                .iter()
                .zip(base.iter())
                .enumerate()
                .map(|(i, (&value, &bottom))| {
                    let x = i as f64;
                    Rectangle::new(
                        [(x + 0.12, bottom as f64), (x + 0.88, (bottom + value) as f64)],
                        color.filled(),
                    )
                })
                .collect();

            ctx.draw_series(bars)?
                .label(series.name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));

            for (slot, value) in base.iter_mut().zip(&series.values) {
                *slot += value;
            }
        }

        let label_style = TextStyle::from((style.font_family.as_str(), style.label_size).into_font())
            .pos(Pos::new(HPos::Center, VPos::Top));
        let step = count.div_ceil(MAX_X_LABELS).max(1);
        for (i, label) in chart.labels.iter().enumerate().step_by(step) {
            let (x, y) = ctx.backend_coord(&(i as f64 + 0.5, 0.0));
            root.draw(&Text::new(label.clone(), (x, y + 6), label_style.clone()))?;
        }

        if chart.series.len() > 1 {
            ctx.configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .label_font((style.font_family.as_str(), style.label_size))
                .draw()?;
        }

        root.present()?;
        Ok(())
    }
}

impl ChartRenderer for SvgChartRenderer {
    #[instrument(skip_all, fields(kind = ?chart.kind))]
    fn render(&self, chart: &ChartSeries) -> Result<String> {
        let mut svg = String::new();
        self.draw(chart, &mut svg)?;
        debug!(bytes = svg.len(), "Rendered SVG chart");
        Ok(svg)
    }

    fn extension(&self) -> &'static str {
        "svg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ChartKind, Series};

    fn chart(labels: &[&str], series: Vec<Series>) -> ChartSeries {
        ChartSeries {
            kind: ChartKind::Weekday,
            title: "Unique visitors by weekday".to_string(),
            x_label: "Weekday".to_string(),
            y_label: "Unique visitors".to_string(),
            labels: labels.iter().map(ToString::to_string).collect(),
            series,
        }
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff8000"), Some(RGBColor(255, 128, 0)));
        assert_eq!(parse_color("#FFFFFF"), Some(RGBColor(255, 255, 255)));
        assert_eq!(parse_color("ff8000"), None);
        assert_eq!(parse_color("#ff80"), None);
        assert_eq!(parse_color("#gg0000"), None);
    }

    #[test]
    fn test_color_schemes() {
        assert_eq!(ColorScheme::Default.colors().len(), 3);
        assert_eq!(ColorScheme::Monochrome.colors()[0], RGBColor(64, 64, 64));
        let custom = ColorScheme::Custom(vec!["#000000".to_string(), "bad".to_string()]);
        assert_eq!(custom.colors(), vec![RGBColor(0, 0, 0)]);
        assert_eq!(ColorScheme::Custom(vec![]).colors(), ColorScheme::Default.colors());
    }

    #[test]
    fn test_render_stacked_svg() {
        let renderer = SvgChartRenderer::default();
        let svg = renderer
            .render(&chart(
                &["Mon", "Tue"],
                vec![
                    Series {
                        name: "In business hours".to_string(),
                        values: vec![3, 1],
                    },
                    Series {
                        name: "Outside business hours".to_string(),
                        values: vec![2, 0],
                    },
                ],
            ))
            .unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Unique visitors by weekday"));
        assert!(svg.contains("Mon"));
        assert!(svg.contains("Outside business hours"));
        assert_eq!(renderer.extension(), "svg");
    }

    #[test]
    fn test_render_all_zero_chart() {
        let svg = SvgChartRenderer::new(ChartStyle::with_size(400, 300))
            .render(&chart(
                &["00", "01"],
                vec![Series {
                    name: "Unique visitors".to_string(),
                    values: vec![0, 0],
                }],
            ))
            .unwrap();
        assert!(svg.contains("width=\"400\""));
    }

    #[test]
    fn test_render_without_categories_fails() {
        let err = SvgChartRenderer::default().render(&chart(&[], vec![])).unwrap_err();
        assert!(matches!(err, InsightsError::Render { .. }));
        assert!(!err.is_fatal());
    }
}
