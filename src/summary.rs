use crate::data::Dataset;
use serde::Serialize;
use std::collections::BTreeMap;

/// Mean price per part of one theme in one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PppSummary {
    pub year: i32,
    pub theme: String,
    pub mean_ppp: f64,
    pub sets: usize,
}

/// Average ppp grouped by (year, theme), ordered by year then theme.
/// Records without a year or a defined ppp do not contribute.
pub fn ppp_by_year_and_theme(dataset: &Dataset) -> Vec<PppSummary> {
    let mut groups: BTreeMap<(i32, &str), (f64, usize)> = BTreeMap::new();
    for record in dataset.iter() {
        if let (Some(year), Some(ppp)) = (record.year, record.ppp) {
            let entry = groups.entry((year, record.theme.as_str())).or_insert((0.0, 0));
            entry.0 += ppp;
            entry.1 += 1;
        }
    }

    groups
        .into_iter()
        .map(|((year, theme), (sum, count))| PppSummary {
            year,
            theme: theme.to_string(),
            mean_ppp: sum / count as f64,
            sets: count,
        })
        .collect()
}
