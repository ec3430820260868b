use crate::palette::ThemeColorMap;
use crate::query::{ChartSpec, Series};
use crate::{OutputFormat, RenderOptions};
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;

const LEGEND_ROW_HEIGHT: i32 = 22;
const LEGEND_MARGIN: i32 = 20;

/// Style configuration for the scatter markers
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub alpha: f64,
    pub min_radius: i32,
    pub max_radius: i32,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            min_radius: 2,
            max_radius: 10,
        }
    }
}

/// Canvas sized to a chart's data ranges
pub struct Canvas {
    width: u32,
    height: u32,
    x_range: Range<f64>,
    y_range: Range<f64>,
    title: Option<String>,
    style: PointStyle,
}

impl Canvas {
    /// Create a new canvas with global data ranges. Without data the axes
    /// default to 0..1.
    pub fn new(width: u32, height: u32, title: Option<String>, all_x_data: &[f64], all_y_data: &[f64]) -> Self {
        Canvas {
            width,
            height,
            x_range: padded_range(all_x_data),
            y_range: padded_range(all_y_data),
            title,
            style: PointStyle::default(),
        }
    }

    pub fn for_chart(spec: &ChartSpec, options: &RenderOptions) -> Self {
        let xs: Vec<f64> = spec.points.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = spec.points.iter().map(|p| p.y).collect();
        Canvas::new(options.width, options.height, options.title.clone(), &xs, &ys)
    }

    /// Draw the chart as SVG markup
    pub fn render_svg(&self, spec: &ChartSpec, colors: &ThemeColorMap) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height)).into_drawing_area();
            self.draw(&root, spec, colors)?;
        }
        Ok(svg)
    }

    /// Draw the chart and encode it as PNG
    pub fn render_png(&self, spec: &ChartSpec, colors: &ThemeColorMap) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; self.width as usize * self.height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (self.width, self.height)).into_drawing_area();
            self.draw(&root, spec, colors)?;
        }

        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(&buffer, self.width, self.height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, spec: &ChartSpec, colors: &ThemeColorMap) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE).context("Failed to fill background")?;

        let series = spec.series(colors.themes());
        let labels: Vec<&str> = series.iter().map(|s| s.theme).collect();
        let legend = legend_layout(&labels, self.width as i32);
        let legend_height = legend
            .iter()
            .map(|&(_, y)| y + LEGEND_ROW_HEIGHT / 2)
            .max()
            .unwrap_or(0);
        let (plot_area, legend_area) = root.split_vertically(self.height as i32 - legend_height);

        let mut chart = ChartBuilder::on(&plot_area)
            .margin(10)
            .caption(self.title.as_deref().unwrap_or(""), ("sans-serif", 20))
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(self.x_range.clone(), self.y_range.clone())
            .context("Failed to build chart")?;

        chart
            .configure_mesh()
            .x_desc(spec.x_title.as_str())
            .y_desc(spec.y_title.as_str())
            .x_label_formatter(&|v| format_tick(*v))
            .y_label_formatter(&|v| format_tick(*v))
            .draw()
            .context("Failed to draw mesh")?;

        let max_size = spec.points.iter().map(|p| p.size).max().unwrap_or(0);
        for s in &series {
            let color = colors.color_or_fallback(s.theme).mix(self.style.alpha);
            chart
                .draw_series(s.points.iter().map(|p| {
                    Circle::new((p.x, p.y), self.marker_radius(p.size, max_size), color.filled())
                }))
                .context("Failed to draw point series")?;
        }

        self.draw_legend(&legend_area, &series, &legend, colors)?;

        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    fn draw_legend<DB>(
        &self,
        area: &DrawingArea<DB, Shift>,
        series: &[Series<'_>],
        positions: &[(i32, i32)],
        colors: &ThemeColorMap,
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        for (s, &(x, y)) in series.iter().zip(positions) {
            let color = colors.color_or_fallback(s.theme).mix(self.style.alpha);
            area.draw(&Circle::new((x, y), 5, color.filled()))
                .context("Failed to draw legend marker")?;
            area.draw(&Text::new(s.theme.to_string(), (x + 10, y - 7), ("sans-serif", 12).into_font()))
                .context("Failed to draw legend label")?;
        }
        Ok(())
    }

    /// Marker area grows with the part count, largest set at `max_radius`
    fn marker_radius(&self, size: u32, max_size: u32) -> i32 {
        if max_size == 0 {
            return self.style.min_radius;
        }
        let scaled = self.style.max_radius as f64 * (size as f64 / max_size as f64).sqrt();
        (scaled.round() as i32).max(self.style.min_radius)
    }
}

/// Render a chart in the requested format
pub fn render_chart(spec: &ChartSpec, colors: &ThemeColorMap, options: &RenderOptions) -> Result<Vec<u8>> {
    options.validate()?;
    let canvas = Canvas::for_chart(spec, options);
    match options.format {
        OutputFormat::Png => canvas.render_png(spec, colors),
        OutputFormat::Svg => canvas.render_svg(spec, colors).map(String::into_bytes),
    }
}

fn padded_range(data: &[f64]) -> Range<f64> {
    if data.is_empty() {
        return 0.0..1.0;
    }
    let min = data.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        (min - 1.0)..(max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding)..(max + padding)
    }
}

/// Legend entry anchors, laid out left to right and wrapped to `width`
fn legend_layout(labels: &[&str], width: i32) -> Vec<(i32, i32)> {
    let mut positions = Vec::with_capacity(labels.len());
    let mut x = LEGEND_MARGIN;
    let mut y = LEGEND_ROW_HEIGHT / 2;
    for label in labels {
        let entry_width = 30 + 7 * label.chars().count() as i32;
        if x > LEGEND_MARGIN && x + entry_width > width - LEGEND_MARGIN {
            x = LEGEND_MARGIN;
            y += LEGEND_ROW_HEIGHT;
        }
        positions.push((x, y));
        x += entry_width;
    }
    positions
}

fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        let text = format!("{:.2}", value);
        text.trim_end_matches('0').to_string()
    }
}
