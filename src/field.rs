// Axis field enumeration and the field -> human label lookup

use crate::data::Record;
use crate::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A plottable numeric attribute of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    Year,
    Price,
    NumParts,
    Ppp,
}

impl FieldId {
    pub const ALL: [FieldId; 4] = [FieldId::Year, FieldId::Price, FieldId::NumParts, FieldId::Ppp];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldId::Year => "year",
            FieldId::Price => "price",
            FieldId::NumParts => "num_parts",
            FieldId::Ppp => "ppp",
        }
    }

    /// Value of this field on a record, `None` when undefined for that record
    pub fn value(&self, record: &Record) -> Option<f64> {
        match self {
            FieldId::Year => record.year.map(f64::from),
            FieldId::Price => record.price,
            FieldId::NumParts => record.num_parts.map(f64::from),
            FieldId::Ppp => record.ppp,
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldId {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        FieldId::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| DashboardError::InvalidField(s.to_string()))
    }
}

/// One entry of the ordered label table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldLabel {
    pub field: FieldId,
    pub label: String,
}

/// Ordered field -> label lookup. Covers every `FieldId` exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldLabels {
    entries: Vec<FieldLabel>,
}

impl FieldLabels {
    pub fn new(entries: Vec<FieldLabel>) -> Result<Self> {
        for field in FieldId::ALL {
            let count = entries.iter().filter(|e| e.field == field).count();
            if count != 1 {
                return Err(DashboardError::ConfigurationError(format!(
                    "field '{}' must have exactly one label (found {})",
                    field, count
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn label(&self, field: FieldId) -> &str {
        self.entries
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.label.as_str())
            .unwrap_or_else(|| field.as_str())
    }

    /// Parse a raw identifier and return it with its label
    pub fn resolve(&self, name: &str) -> Result<(FieldId, &str)> {
        let field: FieldId = name.parse()?;
        Ok((field, self.label(field)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldLabel> {
        self.entries.iter()
    }
}

pub fn default_field_labels() -> Vec<FieldLabel> {
    [
        (FieldId::Year, "Year of release"),
        (FieldId::Price, "Price"),
        (FieldId::NumParts, "Number of parts"),
        (FieldId::Ppp, "Price per part"),
    ]
    .into_iter()
    .map(|(field, label)| FieldLabel { field, label: label.to_string() })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field_ids() {
        assert_eq!("year".parse::<FieldId>(), Ok(FieldId::Year));
        assert_eq!("num_parts".parse::<FieldId>(), Ok(FieldId::NumParts));
        assert_eq!("ppp".parse::<FieldId>(), Ok(FieldId::Ppp));
    }

    #[test]
    fn test_parse_unknown_field() {
        assert_eq!(
            "invalidfield".parse::<FieldId>(),
            Err(DashboardError::InvalidField("invalidfield".to_string()))
        );
        // Identifiers are case sensitive
        assert!("Year".parse::<FieldId>().is_err());
    }

    #[test]
    fn test_default_labels() {
        let labels = FieldLabels::new(default_field_labels()).unwrap();
        assert_eq!(labels.label(FieldId::Year), "Year of release");
        assert_eq!(labels.label(FieldId::Ppp), "Price per part");
        let order: Vec<FieldId> = labels.iter().map(|e| e.field).collect();
        assert_eq!(order, FieldId::ALL.to_vec());
    }

    #[test]
    fn test_labels_missing_field() {
        let mut entries = default_field_labels();
        entries.pop();
        assert!(matches!(
            FieldLabels::new(entries),
            Err(DashboardError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_labels_duplicate_field() {
        let mut entries = default_field_labels();
        entries.push(FieldLabel { field: FieldId::Year, label: "Year".to_string() });
        assert!(FieldLabels::new(entries).is_err());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&FieldId::NumParts).unwrap();
        assert_eq!(json, "\"num_parts\"");
        let field: FieldId = serde_json::from_str("\"ppp\"").unwrap();
        assert_eq!(field, FieldId::Ppp);
    }
}
