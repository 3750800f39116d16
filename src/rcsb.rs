use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

pub const DEFAULT_STRUCTURE_URL: &str = "https://files.rcsb.org/download/{id}.pdb";
pub const DEFAULT_FASTA_URL: &str = "https://www.rcsb.org/fasta/entry/{id}";

lazy_static! {
    static ref PDB_ID: Regex = Regex::new(r"^[0-9][A-Za-z0-9]{3}$").expect("PDB id pattern");
}

/// Four-character PDB id, uppercased. `None` for anything else.
pub fn normalize_pdb_id(id: &str) -> Option<String> {
    let id = id.trim();
    PDB_ID.is_match(id).then(|| id.to_ascii_uppercase())
}

/// Where structures come from. `None` means not found or unreachable.
pub trait StructureSource {
    fn fetch_structure(&self, id: &str) -> Option<String>;
    fn fetch_fasta(&self, id: &str) -> Option<String>;
}

#[derive(Clone, Debug)]
pub struct RcsbClient {
    structure_url: String,
    fasta_url: String,
}

impl Default for RcsbClient {
    fn default() -> Self {
        Self::new(DEFAULT_STRUCTURE_URL, DEFAULT_FASTA_URL)
    }
}

impl RcsbClient {
    /// URL templates carry an `{id}` placeholder.
    pub fn new(structure_url: &str, fasta_url: &str) -> Self {
        Self {
            structure_url: structure_url.to_string(),
            fasta_url: fasta_url.to_string(),
        }
    }

    fn get(template: &str, id: &str) -> Option<String> {
        let id = normalize_pdb_id(id)?;
        let url = template.replace("{id}", &id);
        let response = match reqwest::blocking::get(&url) {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Could not fetch {url}: {e}");
                return None;
            }
        };
        if !response.status().is_success() {
            log::info!("{url} returned {}", response.status());
            return None;
        }
        match response.text() {
            Ok(text) if !text.trim().is_empty() => {
                log::info!("Fetched {url} ({} bytes)", text.len());
                Some(text)
            }
            Ok(_) => None,
            Err(e) => {
                log::warn!("Could not read {url}: {e}");
                None
            }
        }
    }
}

impl StructureSource for RcsbClient {
    fn fetch_structure(&self, id: &str) -> Option<String> {
        Self::get(&self.structure_url, id)
    }

    fn fetch_fasta(&self, id: &str) -> Option<String> {
        Self::get(&self.fasta_url, id)
    }
}

/// Fixed structures keyed by uppercased id.
#[derive(Clone, Debug, Default)]
pub struct InMemorySource {
    structures: HashMap<String, String>,
    fastas: HashMap<String, String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_structure(mut self, id: &str, text: &str) -> Self {
        self.structures.insert(id.to_ascii_uppercase(), text.to_string());
        self
    }

    pub fn with_fasta(mut self, id: &str, text: &str) -> Self {
        self.fastas.insert(id.to_ascii_uppercase(), text.to_string());
        self
    }
}

impl StructureSource for InMemorySource {
    fn fetch_structure(&self, id: &str) -> Option<String> {
        self.structures.get(&id.trim().to_ascii_uppercase()).cloned()
    }

    fn fetch_fasta(&self, id: &str) -> Option<String> {
        self.fastas.get(&id.trim().to_ascii_uppercase()).cloned()
    }
}
