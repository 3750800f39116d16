//! Soft checks on user-entered amino-acid sequences.
//!
//! Nothing here rejects input. Every check produces a warning and the cleaned,
//! possibly truncated sequence is still used for assembly.

use crate::{
    AMINO_ACIDS,
    amino_acids::STOP,
    design::{DesignConfiguration, PartChoice},
};
use mesa_protocol::LinkedChains;
use serde::{Deserialize, Serialize};
use std::fmt;

const TMD_MIN_HYDROPHOBIC_FRACTION: f32 = 0.5;
const TMD_MIN_LENGTH: usize = 15;
const LINKER_MAX_HYDROPHOBIC_FRACTION: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceField {
    Binder,
    Linker,
    Tmd,
    Protease,
    Prs,
    Cargo,
    Aip,
    CustomIcd,
}

impl SequenceField {
    pub fn max_length(&self) -> usize {
        match self {
            SequenceField::Binder => 5000,
            SequenceField::Linker => 1000,
            SequenceField::Tmd => 200,
            SequenceField::Protease => 1000,
            SequenceField::Prs => 50,
            SequenceField::Cargo => 10000,
            SequenceField::Aip => 50,
            SequenceField::CustomIcd => 5000,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SequenceField::Binder => "binder",
            SequenceField::Linker => "linker",
            SequenceField::Tmd => "TMD",
            SequenceField::Protease => "protease",
            SequenceField::Prs => "PRS",
            SequenceField::Cargo => "cargo",
            SequenceField::Aip => "AIP",
            SequenceField::CustomIcd => "custom ICD",
        }
    }
}

impl fmt::Display for SequenceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationWarning {
    Truncated { length: usize, max_length: usize },
    StopCodon { positions: Vec<usize> },
    NonStandard { symbols: String },
    ShortTmd { length: usize },
    LowHydrophobicity { fraction: f32 },
    HighHydrophobicity { fraction: f32 },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::Truncated { length, max_length } => write!(
                f,
                "sequence of length {length} exceeds the maximum of {max_length} and was truncated"
            ),
            ValidationWarning::StopCodon { positions } => {
                let positions: Vec<String> =
                    positions.iter().map(|p| (p + 1).to_string()).collect();
                write!(f, "stop codon at position {}", positions.join(", "))
            }
            ValidationWarning::NonStandard { symbols } => {
                write!(f, "non-standard amino acid symbols: {symbols}")
            }
            ValidationWarning::ShortTmd { length } => write!(
                f,
                "TMD of length {length} is shorter than {TMD_MIN_LENGTH} residues"
            ),
            ValidationWarning::LowHydrophobicity { fraction } => write!(
                f,
                "only {:.0}% hydrophobic residues, may not span the membrane",
                fraction * 100.0
            ),
            ValidationWarning::HighHydrophobicity { fraction } => write!(
                f,
                "{:.0}% hydrophobic residues, linker may be poorly soluble",
                fraction * 100.0
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidatedSequence {
    pub field: SequenceField,
    pub sequence: String,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidatedSequence {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.warnings
            .iter()
            .map(|w| format!("{}: {w}", self.field))
            .collect()
    }
}

/// Removes all whitespace and uppercases.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

pub fn validate(field: SequenceField, raw: &str) -> ValidatedSequence {
    let mut sequence = normalize(raw);
    let mut warnings = vec![];

    let max_length = field.max_length();
    let length = sequence.chars().count();
    if length > max_length {
        sequence = sequence.chars().take(max_length).collect();
        warnings.push(ValidationWarning::Truncated { length, max_length });
    }

    let positions: Vec<usize> = sequence
        .chars()
        .enumerate()
        .filter(|(_, c)| *c == STOP)
        .map(|(i, _)| i)
        .collect();
    if !positions.is_empty() {
        warnings.push(ValidationWarning::StopCodon { positions });
    }

    let mut symbols: Vec<char> = sequence
        .chars()
        .filter(|c| !AMINO_ACIDS.is_in_alphabet(*c))
        .collect();
    symbols.sort_unstable();
    symbols.dedup();
    if !symbols.is_empty() {
        warnings.push(ValidationWarning::NonStandard {
            symbols: symbols.into_iter().collect(),
        });
    }

    if !sequence.is_empty() {
        let fraction = AMINO_ACIDS.hydrophobic_fraction(&sequence);
        match field {
            SequenceField::Tmd => {
                if length < TMD_MIN_LENGTH {
                    warnings.push(ValidationWarning::ShortTmd { length });
                }
                if fraction < TMD_MIN_HYDROPHOBIC_FRACTION {
                    warnings.push(ValidationWarning::LowHydrophobicity { fraction });
                }
            }
            SequenceField::Linker if fraction > LINKER_MAX_HYDROPHOBIC_FRACTION => {
                warnings.push(ValidationWarning::HighHydrophobicity { fraction });
            }
            _ => {}
        }
    }

    ValidatedSequence {
        field,
        sequence,
        warnings,
    }
}

/// Binders and design with every user-entered sequence validated.
///
/// Warnings are prefixed with the output chain where the sequence belongs to one.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedDesign {
    pub binders: LinkedChains,
    pub design: DesignConfiguration,
    pub warnings: Vec<String>,
}

#[derive(Default)]
struct DesignChecker {
    warnings: Vec<String>,
}

impl DesignChecker {
    fn sequence(&mut self, chain: Option<&str>, field: SequenceField, raw: &str) -> String {
        let validated = validate(field, raw);
        self.warnings
            .extend(validated.messages().into_iter().map(|m| match chain {
                Some(chain) => format!("{chain} {m}"),
                None => m,
            }));
        validated.sequence
    }

    /// Library parts are trusted, custom sequences are checked.
    fn choice(
        &mut self,
        chain: Option<&str>,
        field: SequenceField,
        choice: &PartChoice,
    ) -> PartChoice {
        match choice {
            PartChoice::Custom { sequence } => PartChoice::Custom {
                sequence: self.sequence(chain, field, sequence),
            },
            library => library.clone(),
        }
    }
}

/// Validates binders, cargo, custom ICD, per-chain linkers and custom parts of a design.
pub fn validate_design(binders: &LinkedChains, design: &DesignConfiguration) -> ValidatedDesign {
    let mut checker = DesignChecker::default();
    let binders = binders
        .iter()
        .map(|(chain, binder)| {
            let binder = checker.sequence(Some(chain.as_str()), SequenceField::Binder, binder);
            (chain.clone(), binder)
        })
        .collect();

    let mut design = design.clone();
    for (chain, chain_design) in design.chains.iter_mut() {
        let chain = Some(chain.as_str());
        chain_design.linker = checker.sequence(chain, SequenceField::Linker, &chain_design.linker);
        chain_design.tmd = checker.choice(chain, SequenceField::Tmd, &chain_design.tmd);
    }
    design.n_protease = checker.choice(None, SequenceField::Protease, &design.n_protease);
    design.c_protease = checker.choice(None, SequenceField::Protease, &design.c_protease);
    design.complete_protease =
        checker.choice(None, SequenceField::Protease, &design.complete_protease);
    design.prs = checker.choice(None, SequenceField::Prs, &design.prs);
    design.aip = design
        .aip
        .as_ref()
        .map(|aip| checker.choice(None, SequenceField::Aip, aip));
    design.cargo = checker.sequence(None, SequenceField::Cargo, &design.cargo);
    design.custom_icd = design
        .custom_icd
        .as_ref()
        .map(|icd| checker.sequence(None, SequenceField::CustomIcd, icd));

    ValidatedDesign {
        binders,
        design,
        warnings: checker.warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{ChainDesign, PartSlot};

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(" evql\nves\tggg "), "EVQLVESGGG");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_clean_binder_has_no_warnings() {
        let ret = validate(SequenceField::Binder, "evqlvesggg");
        assert_eq!(ret.sequence, "EVQLVESGGG");
        assert!(ret.is_clean());
    }

    #[test]
    fn test_anomalous_content_is_flagged_not_rejected() {
        for raw in ["EVQ*LVES", "EVQ1B2", "xxxx", "!!", "GGGS*"] {
            let ret = validate(SequenceField::Binder, raw);
            assert!(!ret.sequence.is_empty(), "{raw}");
            assert!(!ret.warnings.is_empty(), "{raw}");
        }
        let ret = validate(SequenceField::Binder, "evq*lves");
        assert_eq!(ret.sequence, "EVQ*LVES");
        assert_eq!(ret.warnings, vec![ValidationWarning::StopCodon { positions: vec![3] }]);
        assert_eq!(ret.messages(), vec!["binder: stop codon at position 4"]);

        let ret = validate(SequenceField::Cargo, "AB1");
        assert_eq!(
            ret.warnings,
            vec![ValidationWarning::NonStandard {
                symbols: "1B".to_string()
            }]
        );
    }

    #[test]
    fn test_empty_input_is_empty_output() {
        let ret = validate(SequenceField::Tmd, "   ");
        assert_eq!(ret.sequence, "");
        assert!(ret.is_clean());
    }

    #[test]
    fn test_truncates_to_category_maximum() {
        for field in [
            SequenceField::Binder,
            SequenceField::Linker,
            SequenceField::Tmd,
            SequenceField::Protease,
            SequenceField::Prs,
            SequenceField::Cargo,
            SequenceField::Aip,
            SequenceField::CustomIcd,
        ] {
            let max = field.max_length();
            let ret = validate(field, &"L".repeat(max + 7));
            assert_eq!(ret.sequence.len(), max);
            assert!(ret.warnings.contains(&ValidationWarning::Truncated {
                length: max + 7,
                max_length: max,
            }));
        }
        let ret = validate(SequenceField::Prs, &"ENLYFQS".repeat(5));
        assert_eq!(ret.sequence.len(), 35);
        assert!(ret.is_clean());
    }

    #[test]
    fn test_tmd_heuristics() {
        let cd28 = validate(SequenceField::Tmd, "FWVLVVVGGVLACYSLLVTVAFIIFWV");
        assert!(cd28.is_clean(), "{:?}", cd28.warnings);
        let polar = validate(SequenceField::Tmd, "DEKRDEKRDEKRDEKRDEKR");
        assert!(matches!(
            polar.warnings.as_slice(),
            [ValidationWarning::LowHydrophobicity { .. }]
        ));
        let short = validate(SequenceField::Tmd, "LLLLL");
        assert_eq!(short.warnings, vec![ValidationWarning::ShortTmd { length: 5 }]);
    }

    #[test]
    fn test_linker_hydrophobicity() {
        assert!(validate(SequenceField::Linker, &"GGGGS".repeat(5)).is_clean());
        let greasy = validate(SequenceField::Linker, "GGLLLLVVGG");
        assert!(matches!(
            greasy.warnings.as_slice(),
            [ValidationWarning::HighHydrophobicity { .. }]
        ));
    }

    #[test]
    fn test_validate_design_checks_every_user_sequence() {
        let mut design = DesignConfiguration::default()
            .with_cargo(&format!("gal k*{}", "G".repeat(10_000)))
            .with_part(PartSlot::Prs, PartChoice::Custom {
                sequence: "enlyfqs".to_string(),
            })
            .with_chain(
                "Chain A",
                ChainDesign {
                    linker: "gg ll ll ll".to_string(),
                    tmd: PartChoice::library("CD28"),
                },
            );
        design.custom_icd = Some("kk kk".to_string());
        let binders = LinkedChains::from([("Chain A".to_string(), "evql ves".to_string())]);

        let ret = validate_design(&binders, &design);
        assert_eq!(ret.binders["Chain A"], "EVQLVES");
        assert_eq!(ret.design.custom_icd.as_deref(), Some("KKKK"));
        assert_eq!(ret.design.cargo.len(), SequenceField::Cargo.max_length());
        assert!(ret.design.cargo.starts_with("GALK*"));
        assert_eq!(ret.design.prs, PartChoice::custom("ENLYFQS"));
        assert_eq!(ret.design.chains["Chain A"].linker, "GGLLLLLL");
        assert_eq!(ret.design.chains["Chain A"].tmd, PartChoice::library("CD28"));
        assert!(ret.warnings.iter().any(|w| w.starts_with("cargo: sequence of length")));
        assert!(ret.warnings.iter().any(|w| w.starts_with("cargo: stop codon")));
        assert!(ret.warnings.iter().any(|w| w.starts_with("Chain A linker:")));
        assert!(!ret.warnings.iter().any(|w| w.contains("binder")));
    }
}
