use crate::config::DashboardConfig;
use crate::data::Dataset;
use crate::error::Result;
use crate::field::FieldLabels;
use crate::palette::{build_color_map, ThemeColorMap};
use crate::query::{self, ChartSpec, Selection};
use std::path::Path;
use tracing::info;

/// Read-only state built once at startup and shared by every request
#[derive(Debug, Clone)]
pub struct DashboardContext {
    pub config: DashboardConfig,
    pub dataset: Dataset,
    pub colors: ThemeColorMap,
    pub labels: FieldLabels,
}

impl DashboardContext {
    /// Validate the configuration, then load and filter the data file
    pub fn load(config: DashboardConfig, data_path: &Path) -> Result<Self> {
        config.validate()?;
        let dataset = Dataset::load(data_path, &config.load_filter())?;
        Self::from_parts(config, dataset)
    }

    pub fn from_parts(config: DashboardConfig, dataset: Dataset) -> Result<Self> {
        let colors = build_color_map(&config.themes, &config.colors)?;
        let labels = config.field_labels()?;
        info!(
            "Dashboard ready: {} records, {} themes, {} fields",
            dataset.len(),
            colors.len(),
            labels.iter().count()
        );
        Ok(Self {
            config,
            dataset,
            colors,
            labels,
        })
    }

    pub fn query(&self, selection: &Selection) -> Result<ChartSpec> {
        query::query(&self.dataset, &self.labels, selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;
    use crate::error::DashboardError;
    use std::io::Write;

    #[test]
    fn test_from_parts_rejects_bad_palette() {
        let config = DashboardConfig {
            colors: vec!["#000000".to_string()],
            ..DashboardConfig::default()
        };
        let err = DashboardContext::from_parts(config, Dataset::default()).unwrap_err();
        assert!(matches!(err, DashboardError::ConfigurationError(_)));
    }

    #[test]
    fn test_query_through_context() {
        let config = DashboardConfig::default();
        let dataset = Dataset::from_records(
            vec![Record::new("1-1", "A", "City", Some(2015), Some(20.0), Some(50))],
            &config.load_filter(),
        );
        let ctx = DashboardContext::from_parts(config, dataset).unwrap();
        let spec = ctx.query(&Selection::new(["City"], "year", "price")).unwrap();
        assert_eq!(spec.points.len(), 1);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "set_num,set_name,year,theme,set_type,num_parts,price").unwrap();
        writeln!(file, "1-1,A,2015,City,Normal,50,20").unwrap();
        writeln!(file, "2-1,B,2015,Duplo,Normal,50,20").unwrap();
        let ctx = DashboardContext::load(DashboardConfig::default(), file.path()).unwrap();
        assert_eq!(ctx.dataset.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let err = DashboardContext::load(DashboardConfig::default(), Path::new("missing.csv")).unwrap_err();
        assert!(matches!(err, DashboardError::DataUnavailable(_)));
    }
}
