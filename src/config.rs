// src/config.rs
use crate::error::{EtlError, Result};
use crate::extract::DEFAULT_JOIN_KEY;
use crate::transform::DEFAULT_SALES_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Everything one pipeline run needs. Missing YAML fields take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// CSV source with a header row.
    pub row_source_path: PathBuf,
    /// Parquet source.
    pub columnar_source_path: PathBuf,
    /// Column both sources are inner-joined on.
    pub join_key: String,
    /// Inclusive `Weekly_Sales` floor.
    pub sales_threshold: f64,
    pub clean_output_path: PathBuf,
    pub agg_output_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            row_source_path: PathBuf::from("data/raw/grocery_sales.csv"),
            columnar_source_path: PathBuf::from("data/raw/extra_data.parquet"),
            join_key: DEFAULT_JOIN_KEY.to_string(),
            sales_threshold: DEFAULT_SALES_THRESHOLD,
            clean_output_path: PathBuf::from("data/processed/clean_data.csv"),
            agg_output_path: PathBuf::from("data/processed/agg_data.csv"),
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|e| EtlError::config(format!("parsing YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| EtlError::config(format!("reading {}: {}", path.display(), e)))?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.join_key.trim().is_empty() {
            return Err(EtlError::config("join_key must not be empty"));
        }
        if !self.sales_threshold.is_finite() {
            return Err(EtlError::config(format!(
                "sales_threshold must be finite, got {}",
                self.sales_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg = PipelineConfig::from_yaml_str(
            "row_source_path: in/sales.csv\nsales_threshold: 5000\n",
        )
        .unwrap();
        assert_eq!(cfg.row_source_path, PathBuf::from("in/sales.csv"));
        assert_eq!(cfg.sales_threshold, 5000.0);
        assert_eq!(cfg.join_key, "index");
        assert_eq!(cfg.agg_output_path, PathBuf::from("data/processed/agg_data.csv"));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            PipelineConfig::from_yaml_str("join_key: ''\n"),
            Err(EtlError::Config(_))
        ));
        assert!(matches!(
            PipelineConfig::from_yaml_str("sales_threshold: [1, 2]\n"),
            Err(EtlError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PipelineConfig::from_yaml_file(dir.path().join("etl.yaml")).unwrap_err();
        assert!(matches!(err, EtlError::Config(_)));
    }

    #[test]
    fn yaml_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etl.yaml");
        let cfg = PipelineConfig {
            join_key: "store_key".into(),
            ..PipelineConfig::default()
        };
        fs::write(&path, serde_yaml::to_string(&cfg).unwrap()).unwrap();
        assert_eq!(PipelineConfig::from_yaml_file(&path).unwrap(), cfg);
    }
}
