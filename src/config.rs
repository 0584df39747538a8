//! Pipeline configuration.
//!
//! Every rule that differed between the hand-maintained variants of the report
//! is a named field here. A YAML file may set any subset of fields; the rest
//! keep their defaults:
//!
//! ```yaml
//! required_columns: 15
//! date_order: day-first
//! columns:
//!   estimated: "Estimated arrival"
//!   actual: 7
//! container:
//!   token: CONTAINER
//!   exclude: BILL_OF_LADING
//!   mode: contains
//! ```

use std::{collections::HashSet, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    dates::DateOrder,
    error::{ReportError, ReportResult},
    interval::HoursFormat,
    summary::Collapse,
    table::ColumnRef,
    transform::text::normalize_discriminator,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum width after normalization; derived columns must fit inside it.
    pub required_columns: usize,
    /// Name synthesized trailing columns from the canonical list.
    pub canonical_names: bool,
    /// Treat loader null markers (`NaN`, `NULL`, ...) as empty cells.
    pub na_values: bool,
    pub columns: ColumnLayout,
    /// Rows that feed the per-key min/max.
    pub container: TypeMatcher,
    /// Rows counted by the summary.
    pub header: TypeMatcher,
    pub date_order: DateOrder,
    pub hours_format: HoursFormat,
    pub backfill: BackfillScope,
    /// With a single grouping key file-wide and no container extremum, fall
    /// back to each row's own estimated/actual values.
    pub own_dates_when_single_key: bool,
    pub summary_collapse: Collapse,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            required_columns: 15,
            canonical_names: true,
            na_values: true,
            columns: ColumnLayout::default(),
            container: TypeMatcher {
                token: "CONTAINER".to_string(),
                exclude: Some("BILL_OF_LADING".to_string()),
                mode: MatchMode::Contains,
            },
            header: TypeMatcher {
                token: "BILL_OF_LADING".to_string(),
                exclude: None,
                mode: MatchMode::Exact,
            },
            date_order: DateOrder::Auto,
            hours_format: HoursFormat::Fixed,
            backfill: BackfillScope::AllRows,
            own_dates_when_single_key: false,
            summary_collapse: Collapse::MostSevere,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Opening configuration file {path:?}"))?;
        let config: PipelineConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("Parsing configuration file {path:?}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> ReportResult<()> {
        if self.container.token.trim().is_empty() || self.header.token.trim().is_empty() {
            return Err(ReportError::InvalidConfig(
                "shipment type tokens cannot be empty".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for (label, position) in self.columns.derived_positions() {
            if position >= self.required_columns {
                return Err(ReportError::InvalidConfig(format!(
                    "derived column '{label}' at position {position} does not fit in {} required column(s)",
                    self.required_columns
                )));
            }
            if !seen.insert(position) {
                return Err(ReportError::InvalidConfig(format!(
                    "derived column '{label}' reuses position {position}"
                )));
            }
        }
        Ok(())
    }
}

/// Where each source column is read from and each derived column is written.
///
/// Source columns accept a position or a header name; derived columns are
/// always positional so the output layout is stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub shipment_id: ColumnRef,
    pub shipment_type: ColumnRef,
    pub bill_of_lading: ColumnRef,
    pub estimated: ColumnRef,
    pub actual: ColumnRef,
    /// Summary identity; the bill of lading when unset.
    pub identity: Option<ColumnRef>,
    pub valid_bol: Option<usize>,
    pub min: usize,
    pub max: usize,
    pub difference: usize,
    pub prioritized: usize,
    pub range: Option<usize>,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            shipment_id: ColumnRef::Position(0),
            shipment_type: ColumnRef::Position(1),
            bill_of_lading: ColumnRef::Position(2),
            estimated: ColumnRef::Position(6),
            actual: ColumnRef::Position(7),
            identity: None,
            valid_bol: Some(9),
            min: 10,
            max: 11,
            difference: 12,
            prioritized: 13,
            range: Some(14),
        }
    }
}

impl ColumnLayout {
    pub fn identity(&self) -> &ColumnRef {
        self.identity.as_ref().unwrap_or(&self.bill_of_lading)
    }

    pub fn source_columns(&self) -> [(&'static str, &ColumnRef); 6] {
        [
            ("shipment_id", &self.shipment_id),
            ("shipment_type", &self.shipment_type),
            ("bill_of_lading", &self.bill_of_lading),
            ("estimated", &self.estimated),
            ("actual", &self.actual),
            ("identity", self.identity()),
        ]
    }

    pub fn derived_positions(&self) -> Vec<(&'static str, usize)> {
        let mut positions = vec![
            ("min", self.min),
            ("max", self.max),
            ("difference", self.difference),
            ("prioritized", self.prioritized),
        ];
        if let Some(position) = self.valid_bol {
            positions.push(("valid_bol", position));
        }
        if let Some(position) = self.range {
            positions.push(("range", position));
        }
        positions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    #[default]
    Exact,
    Contains,
}

/// Selects rows by shipment type. Both the cell and the tokens are folded with
/// [`normalize_discriminator`], so `container 40ft` matches `CONTAINER`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMatcher {
    pub token: String,
    #[serde(default)]
    pub exclude: Option<String>,
    #[serde(default)]
    pub mode: MatchMode,
}

impl TypeMatcher {
    pub fn matches(&self, cell: Option<&str>) -> bool {
        let value = normalize_discriminator(cell);
        if value.is_empty() {
            return false;
        }
        let token = normalize_discriminator(Some(&self.token));
        let hit = match self.mode {
            MatchMode::Exact => value == token,
            MatchMode::Contains => value.contains(&token),
        };
        // Exclusion is always a substring test.
        let excluded = self
            .exclude
            .as_deref()
            .map(|token| normalize_discriminator(Some(token)))
            .is_some_and(|token| !token.is_empty() && value.contains(&token));
        hit && !excluded
    }
}

/// Which rows receive their group's min/max.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackfillScope {
    #[default]
    AllRows,
    HeaderRows,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_valid() {
        let config = PipelineConfig::default();
        config.validate().expect("default config");
        assert_eq!(config.columns.identity(), &ColumnRef::Position(2));
    }

    #[test]
    fn derived_columns_must_fit() {
        let config = PipelineConfig {
            required_columns: 14,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ReportError::InvalidConfig(_))
        ));
        let mut config = PipelineConfig {
            required_columns: 14,
            ..PipelineConfig::default()
        };
        config.columns.range = None;
        config.validate().expect("14 columns without range");
    }

    #[test]
    fn duplicate_positions_are_rejected() {
        let mut config = PipelineConfig::default();
        config.columns.max = config.columns.min;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "date_order: day-first\ncolumns:\n  estimated: \"ETA\"\n  actual: 8\n";
        let config: PipelineConfig = serde_yaml::from_str(yaml).expect("parse yaml");
        assert_eq!(config.date_order, DateOrder::DayFirst);
        assert_eq!(config.columns.estimated, ColumnRef::Name("ETA".to_string()));
        assert_eq!(config.columns.actual, ColumnRef::Position(8));
        assert_eq!(config.columns.bill_of_lading, ColumnRef::Position(2));
        assert_eq!(config.required_columns, 15);
    }

    #[test]
    fn yaml_round_trips() {
        let config = PipelineConfig::default();
        let yaml = config.to_yaml().expect("serialize");
        let parsed: PipelineConfig = serde_yaml::from_str(&yaml).expect("parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn matcher_modes() {
        let config = PipelineConfig::default();
        assert!(config.container.matches(Some("container")));
        assert!(config.container.matches(Some("Container 40ft")));
        assert!(!config.container.matches(Some("BILL_OF_LADING_CONTAINER")));
        assert!(!config.container.matches(Some("  ")));
        assert!(config.header.matches(Some("bill of lading")));
        assert!(!config.header.matches(Some("BILL_OF_LADING_X")));
    }
}
