//! Antigen lookup over a SAbDab summary table.

use crate::error::{MesaError, MesaResult};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{fs::File, io::Read};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AntibodyEntry {
    pub pdb: String,
    #[serde(rename = "Hchain", default)]
    pub heavy_chain: String,
    #[serde(rename = "Lchain", default)]
    pub light_chain: String,
    #[serde(default)]
    pub antigen_chain: String,
    #[serde(default)]
    pub antigen_type: String,
    #[serde(default)]
    pub antigen_name: String,
    #[serde(default)]
    pub compound: String,
    #[serde(default)]
    pub organism: String,
    #[serde(default)]
    pub resolution: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub scfv: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub affinity: Option<f64>,
}

impl AntibodyEntry {
    fn matches(&self, query: &str) -> bool {
        self.antigen_name.to_lowercase().contains(query)
            || self.compound.to_lowercase().contains(query)
    }
}

#[derive(Clone, Debug, Default)]
pub struct AntibodyDatabase {
    entries: Vec<AntibodyEntry>,
}

impl AntibodyDatabase {
    pub fn from_reader<R: Read>(reader: R) -> MesaResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(reader);
        let entries = reader
            .deserialize()
            .collect::<Result<Vec<AntibodyEntry>, csv::Error>>()?;
        Ok(Self { entries })
    }

    pub fn from_tsv_path(path: &str) -> MesaResult<Self> {
        let ret = Self::from_reader(File::open(path)?)?;
        log::info!("Loaded {} antibody entries from '{path}'", ret.len());
        Ok(ret)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose antigen name or compound contains `antigen`, case-insensitive,
    /// in table order.
    pub fn search(&self, antigen: &str) -> MesaResult<Vec<&AntibodyEntry>> {
        let query = antigen.trim().to_lowercase();
        if query.is_empty() {
            return Err(MesaError::invalid("Antigen query cannot be empty."));
        }
        Ok(self.entries.iter().filter(|e| e.matches(&query)).collect())
    }

    /// Distinct PDB ids of a result set, first occurrence first.
    pub fn pdb_ids<'a>(entries: &[&'a AntibodyEntry]) -> Vec<&'a str> {
        entries.iter().map(|e| e.pdb.as_str()).unique().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TSV: &str = "pdb\tHchain\tLchain\tmodel\tantigen_chain\tantigen_type\tantigen_name\tcompound\torganism\tresolution\tmethod\tscfv\taffinity\n\
        7xyz\tH\tL\t0\tA\tprotein\tspike glycoprotein\tFab in complex with SARS-CoV-2 spike\thomo sapiens\t2.9\tELECTRON MICROSCOPY\tFalse\t1e-09\n\
        1abc\tH\tL\t0\tC\tprotein\tlysozyme c\tAnti-lysozyme Fab\tmus musculus\t1.8\tX-RAY DIFFRACTION\tFalse\tNone\n\
        7xyz\tB\tC\t0\tA\tprotein\tspike glycoprotein\tFab in complex with SARS-CoV-2 spike\thomo sapiens\t2.9\tELECTRON MICROSCOPY\tFalse\tNone\n\
        2def\tA\tNA\t0\tNA\tNA\tNA\tNanobody against Lysozyme\tlama glama\t2.1\tX-RAY DIFFRACTION\tFalse\tNA\n";

    fn database() -> AntibodyDatabase {
        AntibodyDatabase::from_reader(TSV.as_bytes()).unwrap()
    }

    #[test]
    fn test_parse_summary() {
        let db = database();
        assert_eq!(db.len(), 4);
        let first = &db.entries[0];
        assert_eq!(first.heavy_chain, "H");
        assert_eq!(first.affinity, Some(1e-9));
        assert_eq!(db.entries[1].affinity, None);
    }

    #[test]
    fn test_search_name_or_compound_in_file_order() {
        let db = database();
        let hits = db.search("LYSOZYME").unwrap();
        let pdbs: Vec<&str> = hits.iter().map(|e| e.pdb.as_str()).collect();
        assert_eq!(pdbs, vec!["1abc", "2def"]);

        let hits = db.search("spike").unwrap();
        assert_eq!(AntibodyDatabase::pdb_ids(&hits), vec!["7xyz"]);
        assert!(db.search("insulin").unwrap().is_empty());
    }

    #[test]
    fn test_empty_query_is_invalid() {
        assert!(matches!(database().search("  "), Err(MesaError::InvalidInput(_))));
    }

    #[test]
    fn test_from_tsv_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TSV.as_bytes()).unwrap();
        let db = AntibodyDatabase::from_tsv_path(file.path().to_str().unwrap()).unwrap();
        assert_eq!(db.len(), 4);
        assert!(AntibodyDatabase::from_tsv_path("/nonexistent.tsv").is_err());
    }
}
