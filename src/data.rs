use crate::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Columns the source file must carry
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "theme",
    "year",
    "price",
    "num_parts",
    "set_type",
    "set_name",
    "set_num",
];

/// One LEGO set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub set_num: String,
    pub set_name: String,
    pub theme: String,
    pub set_type: String,
    pub year: Option<i32>,
    pub price: Option<f64>,
    pub num_parts: Option<u32>,
    /// Price per part, derived once at construction
    pub ppp: Option<f64>,
}

impl Record {
    pub fn new(
        set_num: &str,
        set_name: &str,
        theme: &str,
        year: Option<i32>,
        price: Option<f64>,
        num_parts: Option<u32>,
    ) -> Self {
        Self {
            set_num: set_num.to_string(),
            set_name: set_name.to_string(),
            theme: theme.to_string(),
            set_type: "Normal".to_string(),
            year,
            price,
            num_parts,
            ppp: price_per_part(price, num_parts),
        }
    }

    pub fn with_set_type(mut self, set_type: &str) -> Self {
        self.set_type = set_type.to_string();
        self
    }
}

/// `price / num_parts`, undefined without a finite price or with zero parts
pub fn price_per_part(price: Option<f64>, num_parts: Option<u32>) -> Option<f64> {
    match (price, num_parts) {
        (Some(price), Some(parts)) if parts > 0 && price.is_finite() => Some(price / f64::from(parts)),
        _ => None,
    }
}

/// Row shape as it appears in the CSV. Counts are read as floats because
/// exports with missing values write them as `123.0`.
#[derive(Debug, Deserialize)]
struct CsvRow {
    set_num: String,
    set_name: String,
    theme: String,
    set_type: String,
    year: Option<f64>,
    price: Option<f64>,
    num_parts: Option<f64>,
}

impl From<CsvRow> for Record {
    fn from(row: CsvRow) -> Self {
        let year = row.year.filter(|y| y.is_finite()).map(|y| y as i32);
        let price = row.price.filter(|p| p.is_finite());
        let num_parts = row
            .num_parts
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n as u32);
        Record::new(&row.set_num, &row.set_name, &row.theme, year, price, num_parts)
            .with_set_type(&row.set_type)
    }
}

/// Static predicates applied once when the dataset is built
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFilter {
    pub min_parts: u32,
    pub set_type: String,
    pub excluded_themes: Vec<String>,
}

impl Default for LoadFilter {
    fn default() -> Self {
        crate::config::DashboardConfig::default().load_filter()
    }
}

impl LoadFilter {
    pub fn accepts(&self, record: &Record) -> bool {
        record.num_parts.is_some_and(|n| n > self.min_parts)
            && record.set_type == self.set_type
            && !self.excluded_themes.iter().any(|t| *t == record.theme)
    }
}

/// Immutable, ordered collection of records that passed the load filter
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Read and filter a CSV file
    pub fn load(path: &Path, filter: &LoadFilter) -> Result<Self> {
        info!("Loading dataset from {}", path.display());
        let file = File::open(path).map_err(|e| {
            DashboardError::DataUnavailable(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Self::from_reader(file, filter)
    }

    pub fn from_reader<R: Read>(reader: R, filter: &LoadFilter) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| DashboardError::DataUnavailable(format!("Failed to read CSV header: {}", e)))?
            .clone();
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|col| !headers.iter().any(|h| h == *col))
            .collect();
        if !missing.is_empty() {
            return Err(DashboardError::DataUnavailable(format!(
                "Missing required columns: {}",
                missing.join(", ")
            )));
        }

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for result in reader.deserialize::<CsvRow>() {
            match result {
                Ok(row) => records.push(Record::from(row)),
                Err(e) if e.is_io_error() => {
                    return Err(DashboardError::DataUnavailable(format!("Failed to read CSV: {}", e)));
                }
                Err(e) => {
                    debug!("Skipping malformed row: {}", e);
                    skipped += 1;
                }
            }
        }
        if skipped > 0 {
            warn!("Skipped {} malformed rows", skipped);
        }

        let total = records.len();
        let dataset = Self::from_records(records, filter);
        info!("Kept {} of {} records after filtering", dataset.len(), total);
        Ok(dataset)
    }

    pub fn from_records(records: Vec<Record>, filter: &LoadFilter) -> Self {
        let records = records.into_iter().filter(|r| filter.accepts(r)).collect();
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
set_num,set_name,year,theme,set_type,num_parts,price,ppp
6000-1,Police Station,2015,City,Normal,50,20.0,0.4
6001-1,Town Hall,2016,Town,Normal,60,25.0,0.41
5000-1,Big Bricks,2014,Duplo,Normal,40,10.0,0.25
7000-1,Keyring,2014,City,Normal,8,5.0,0.6
8000-1,Collection Pack,2014,City,Collection,400,50.0,0.12
9000-1,Unpriced Set,,City,Normal,120.0,,
";

    #[test]
    fn test_price_per_part() {
        assert_eq!(price_per_part(Some(20.0), Some(50)), Some(0.4));
        assert_eq!(price_per_part(Some(20.0), Some(0)), None);
        assert_eq!(price_per_part(None, Some(50)), None);
        assert_eq!(price_per_part(Some(20.0), None), None);
        assert_eq!(price_per_part(Some(f64::INFINITY), Some(50)), None);
        assert_eq!(price_per_part(Some(f64::NAN), Some(50)), None);
    }

    #[test]
    fn test_non_finite_prices_load_as_missing() {
        let csv = "\
set_num,set_name,year,theme,set_type,num_parts,price
1-1,Endless,2015,City,Normal,50,inf
2-1,Unknown,2015,City,Normal,50,NaN
3-1,Priced,2015,City,Normal,50,20
";
        let dataset = Dataset::from_reader(csv.as_bytes(), &LoadFilter::default()).unwrap();
        assert_eq!(dataset.len(), 3);
        for record in &dataset.records()[..2] {
            assert_eq!(record.price, None);
            assert_eq!(record.ppp, None);
        }
        assert_eq!(dataset.records()[2].price, Some(20.0));

        let labels = crate::field::FieldLabels::new(crate::field::default_field_labels()).unwrap();
        let selection = crate::query::Selection::new(["City"], "year", "price");
        let spec = crate::query::query(&dataset, &labels, &selection).unwrap();
        let nums: Vec<&str> = spec.points.iter().map(|p| p.set_num.as_str()).collect();
        assert_eq!(nums, vec!["3-1"]);
    }

    #[test]
    fn test_load_applies_filters() {
        let dataset = Dataset::from_reader(SAMPLE.as_bytes(), &LoadFilter::default()).unwrap();
        let nums: Vec<&str> = dataset.iter().map(|r| r.set_num.as_str()).collect();
        // Duplo excluded, keyring too small, collection pack wrong set type
        assert_eq!(nums, vec!["6000-1", "6001-1", "9000-1"]);
    }

    #[test]
    fn test_load_computes_ppp() {
        let dataset = Dataset::from_reader(SAMPLE.as_bytes(), &LoadFilter::default()).unwrap();
        let first = &dataset.records()[0];
        assert_eq!(first.year, Some(2015));
        assert_eq!(first.num_parts, Some(50));
        assert_eq!(first.ppp, Some(0.4));

        let unpriced = &dataset.records()[2];
        assert_eq!(unpriced.year, None);
        assert_eq!(unpriced.price, None);
        assert_eq!(unpriced.num_parts, Some(120));
        assert_eq!(unpriced.ppp, None);
    }

    #[test]
    fn test_missing_columns() {
        let csv = "set_num,set_name,theme\n1-1,Thing,City\n";
        let err = Dataset::from_reader(csv.as_bytes(), &LoadFilter::default()).unwrap_err();
        match err {
            DashboardError::DataUnavailable(msg) => {
                assert!(msg.contains("year"));
                assert!(msg.contains("num_parts"));
            }
            other => panic!("Expected DataUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let csv = "\
set_num,set_name,year,theme,set_type,num_parts,price
1-1,Good,2015,City,Normal,50,20
2-1,Bad,twenty,City,Normal,50,20
";
        let dataset = Dataset::from_reader(csv.as_bytes(), &LoadFilter::default()).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].set_name, "Good");
    }

    #[test]
    fn test_missing_file() {
        let err = Dataset::load(Path::new("no/such/file.csv"), &LoadFilter::default()).unwrap_err();
        assert!(matches!(err, DashboardError::DataUnavailable(_)));
    }

    #[test]
    fn test_post_load_invariant() {
        let filter = LoadFilter::default();
        let records = vec![
            Record::new("1-1", "A", "City", Some(2000), Some(10.0), Some(11)),
            Record::new("2-1", "B", "City", Some(2000), Some(10.0), Some(10)),
            Record::new("3-1", "C", "Mindstorms", Some(2000), Some(10.0), Some(500)),
            Record::new("4-1", "D", "Technic", Some(2000), Some(10.0), Some(500)).with_set_type("Gear"),
            Record::new("5-1", "E", "Technic", Some(2000), Some(10.0), None),
        ];
        let dataset = Dataset::from_records(records, &filter);
        assert_eq!(dataset.len(), 1);
        for record in dataset.iter() {
            assert!(record.num_parts.unwrap() > 10);
            assert_eq!(record.set_type, "Normal");
            assert!(!filter.excluded_themes.contains(&record.theme));
        }
    }
}
