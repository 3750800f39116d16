use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, fs};

const BUILTIN_PARTS_JSON: &str = include_str!("../assets/parts.json");

pub const CD4_SIGNAL_PEPTIDE: &str = "CD4";
pub const FRET_MVENUS: &str = "mVenus";
pub const FRET_MCERULEAN: &str = "mCerulean";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartCategory {
    SignalPeptide,
    Tmd,
    Prs,
    Aip,
    NProtease,
    CProtease,
    Protease,
    Tag,
    Fret,
}

impl PartCategory {
    pub const ALL: [PartCategory; 9] = [
        PartCategory::SignalPeptide,
        PartCategory::Tmd,
        PartCategory::Prs,
        PartCategory::Aip,
        PartCategory::NProtease,
        PartCategory::CProtease,
        PartCategory::Protease,
        PartCategory::Tag,
        PartCategory::Fret,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            PartCategory::SignalPeptide => "signal_peptide",
            PartCategory::Tmd => "tmd",
            PartCategory::Prs => "prs",
            PartCategory::Aip => "aip",
            PartCategory::NProtease => "n_protease",
            PartCategory::CProtease => "c_protease",
            PartCategory::Protease => "protease",
            PartCategory::Tag => "tag",
            PartCategory::Fret => "fret",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }
}

impl fmt::Display for PartCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub name: String,
    #[serde(default)]
    pub source: Option<String>,
    pub sequence: String,
}

/// Named biological parts grouped by category. Read-only once loaded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SequenceLibrary {
    parts: BTreeMap<PartCategory, Vec<Part>>,
}

impl SequenceLibrary {
    pub fn new(json_text: &str) -> Result<Self> {
        let mut ret = Self {
            parts: BTreeMap::new(),
        };
        let res: serde_json::Value = serde_json::from_str(json_text)?;
        let arr = res
            .as_array()
            .ok_or(anyhow!("Parts library is not a JSON array"))?;
        for row in arr {
            let category = match row.get("type").and_then(|t| t.as_str()) {
                Some(key) => PartCategory::from_key(key)
                    .ok_or_else(|| anyhow!("Unknown part type '{key}' in {row}"))?,
                None => return Err(anyhow!("Missing part type for {row}")),
            };
            let mut part: Part = serde_json::from_value(row.clone())
                .map_err(|e| anyhow!("Bad {category} part {row}: {e}"))?;
            part.sequence = part.sequence.trim().to_ascii_uppercase();
            if part.sequence.is_empty() {
                return Err(anyhow!("Part '{}' ({category}) has an empty sequence", part.name));
            }
            ret.parts.entry(category).or_default().push(part);
        }
        Ok(ret)
    }

    pub fn from_path(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::new(&text)
    }

    /// Built-in parts, with every category present in `runtime_path` replacing
    /// the built-in one.
    pub fn load(runtime_path: Option<&str>) -> Self {
        let mut base = Self::default();
        let Some(path) = runtime_path else {
            return base;
        };
        match Self::from_path(path) {
            Ok(custom) if !custom.parts.is_empty() => {
                log::info!(
                    "Loaded runtime parts library '{path}' ({} categories)",
                    custom.parts.len()
                );
                base.parts.extend(custom.parts);
            }
            Ok(_) => log::warn!("Runtime parts library '{path}' is empty, using built-in parts"),
            Err(e) => {
                log::warn!("Could not load parts library '{path}': {e}; using built-in parts")
            }
        }
        base
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_PARTS_JSON).expect("built-in parts library must parse")
    }

    pub fn parts(&self, category: PartCategory) -> &[Part] {
        self.parts.get(&category).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn names(&self, category: PartCategory) -> Vec<&str> {
        self.parts(category).iter().map(|p| p.name.as_str()).collect()
    }

    /// Case-insensitive lookup by part name.
    pub fn get(&self, category: PartCategory, name: &str) -> Option<&Part> {
        self.parts(category)
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn sequence(&self, category: PartCategory, name: &str) -> Option<&str> {
        self.get(category, name).map(|p| p.sequence.as_str())
    }

    /// `{name: [source, sequence]}` listing for overview endpoints.
    pub fn overview(&self, category: PartCategory) -> BTreeMap<String, [String; 2]> {
        self.parts(category)
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    [p.source.clone().unwrap_or_default(), p.sequence.clone()],
                )
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.parts.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SequenceLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}
