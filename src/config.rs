use crate::{
    chain_linker::DEFAULT_CHAIN_LINKER,
    design::DEFAULT_TMD_LINKER,
    rcsb::{DEFAULT_FASTA_URL, DEFAULT_STRUCTURE_URL},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";

/// Runtime settings shared by the server and the CLI.
///
/// Every field has a default, so a config file only lists what it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignerConfig {
    pub bind_address: String,
    /// `{id}` is replaced by the PDB id.
    pub structure_url: String,
    pub fasta_url: String,
    /// Replaces the built-in part library.
    pub parts_library: Option<String>,
    /// SAbDab summary TSV backing antigen search.
    pub sabdab_tsv: Option<String>,
    pub chain_linker: String,
    pub tmd_linker: String,
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            structure_url: DEFAULT_STRUCTURE_URL.to_string(),
            fasta_url: DEFAULT_FASTA_URL.to_string(),
            parts_library: None,
            sabdab_tsv: None,
            chain_linker: DEFAULT_CHAIN_LINKER.clone(),
            tmd_linker: DEFAULT_TMD_LINKER.clone(),
        }
    }
}

impl DesignerConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Could not parse designer configuration")
    }

    /// Defaults when `path` is `None`.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read configuration file '{path}'"))?;
        let ret = Self::from_json(&text).with_context(|| format!("In '{path}'"))?;
        log::info!("Loaded configuration from '{path}'");
        Ok(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = DesignerConfig::from_json(r#"{"bind_address": "0.0.0.0:9000"}"#).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:9000");
        assert_eq!(config.chain_linker, "GGGGS".repeat(5));
        assert_eq!(config.tmd_linker, "GGGS".repeat(10));
        assert_eq!(config.structure_url, DEFAULT_STRUCTURE_URL);
        assert!(config.sabdab_tsv.is_none());
    }

    #[test]
    fn test_load_from_file() {
        assert_eq!(DesignerConfig::load(None).unwrap(), DesignerConfig::default());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"sabdab_tsv": "/data/sabdab_summary_all.tsv"}"#)
            .unwrap();
        let config = DesignerConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.sabdab_tsv.as_deref(), Some("/data/sabdab_summary_all.tsv"));

        assert!(DesignerConfig::load(Some("/nonexistent/mesa.json")).is_err());
        let mut bad = tempfile::NamedTempFile::new().unwrap();
        bad.write_all(b"{not json").unwrap();
        assert!(DesignerConfig::load(bad.path().to_str()).is_err());
    }
}
