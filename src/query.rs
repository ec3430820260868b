// Selection query: filter the dataset by theme and project two fields

use crate::data::Dataset;
use crate::error::Result;
use crate::field::{FieldId, FieldLabels};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The user's current choice of themes and axis fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub themes: BTreeSet<String>,
    pub x: String,
    pub y: String,
}

impl Selection {
    pub fn new<I, S>(themes: I, x: &str, y: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            themes: themes.into_iter().map(Into::into).collect(),
            x: x.to_string(),
            y: y.to_string(),
        }
    }
}

impl Default for Selection {
    /// No themes, year against price
    fn default() -> Self {
        Self::new(Vec::<String>::new(), "year", "price")
    }
}

/// One plotted set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
    pub theme: String,
    pub size: u32,
    pub label: String,
    pub set_num: String,
}

/// Renderer-agnostic description of a scatter plot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub x_field: FieldId,
    pub y_field: FieldId,
    pub x_title: String,
    pub y_title: String,
    pub points: Vec<ChartPoint>,
}

/// Points of one theme, borrowed from a `ChartSpec`
#[derive(Debug, Clone, PartialEq)]
pub struct Series<'a> {
    pub theme: &'a str,
    pub points: Vec<&'a ChartPoint>,
}

impl ChartSpec {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Group points by theme. Themes listed in `theme_order` come first in that
    /// order; any other theme follows in order of first appearance.
    pub fn series<'a>(&'a self, theme_order: &[String]) -> Vec<Series<'a>> {
        let mut series: Vec<Series<'a>> = Vec::new();
        for point in &self.points {
            match series.iter_mut().find(|s| s.theme == point.theme) {
                Some(existing) => existing.points.push(point),
                None => series.push(Series {
                    theme: &point.theme,
                    points: vec![point],
                }),
            }
        }

        let rank = |theme: &str| {
            theme_order
                .iter()
                .position(|t| t == theme)
                .unwrap_or(theme_order.len())
        };
        // Stable sort keeps appearance order among unranked themes
        series.sort_by_key(|s| rank(s.theme));
        series
    }
}

/// Filter `dataset` to the selected themes and emit one point per kept row.
///
/// Both field identifiers are checked before any filtering. Rows where either
/// field is undefined or not finite are left out.
pub fn query(dataset: &Dataset, labels: &FieldLabels, selection: &Selection) -> Result<ChartSpec> {
    let (x_field, x_title) = labels.resolve(&selection.x)?;
    let (y_field, y_title) = labels.resolve(&selection.y)?;

    let points = dataset
        .iter()
        .filter(|record| selection.themes.contains(&record.theme))
        .filter_map(|record| {
            let x = x_field.value(record)?;
            let y = y_field.value(record)?;
            if !x.is_finite() || !y.is_finite() {
                return None;
            }
            Some(ChartPoint {
                x,
                y,
                theme: record.theme.clone(),
                size: record.num_parts.unwrap_or(0),
                label: record.set_name.clone(),
                set_num: record.set_num.clone(),
            })
        })
        .collect();

    Ok(ChartSpec {
        x_field,
        y_field,
        x_title: x_title.to_string(),
        y_title: y_title.to_string(),
        points,
    })
}
