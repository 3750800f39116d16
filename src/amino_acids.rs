use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const STOP: char = '*';
pub const UNKNOWN: char = 'X';

// (one-letter, three-letter, Kyte-Doolittle, Hopp-Woods)
const STANDARD_AMINO_ACIDS: [(char, &str, f32, f32); 20] = [
    ('A', "ALA", 1.8, -0.5),
    ('R', "ARG", -4.5, 3.0),
    ('N', "ASN", -3.5, 0.2),
    ('D', "ASP", -3.5, 3.0),
    ('C', "CYS", 2.5, -1.0),
    ('Q', "GLN", -3.5, 0.2),
    ('E', "GLU", -3.5, 3.0),
    ('G', "GLY", -0.4, 0.0),
    ('H', "HIS", -3.2, -0.5),
    ('I', "ILE", 4.5, -1.8),
    ('L', "LEU", 3.8, -1.8),
    ('K', "LYS", -3.9, 3.0),
    ('M', "MET", 1.9, -1.3),
    ('F', "PHE", 2.8, -2.5),
    ('P', "PRO", -1.6, 0.0),
    ('S', "SER", -0.8, 0.3),
    ('T', "THR", -0.7, -0.4),
    ('W', "TRP", -0.9, -3.4),
    ('Y', "TYR", -1.3, -2.3),
    ('V', "VAL", 4.2, -1.5),
];

// Force-field and modified residue names seen in deposited structures.
const RESIDUE_ALIASES: [(&str, char); 12] = [
    ("MSE", 'M'),
    ("HSD", 'H'),
    ("HSE", 'H'),
    ("HSP", 'H'),
    ("HID", 'H'),
    ("HIE", 'H'),
    ("HIP", 'H'),
    ("CYX", 'C'),
    ("CYM", 'C'),
    ("ASH", 'D'),
    ("GLH", 'E'),
    ("LYN", 'K'),
];

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AminoAcidHydrophobicity {
    pub kyle_doolittle: f32,
    pub hopp_woods: f32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AminoAcid {
    pub aa: char,
    pub tla: String,
    pub hydrophobicity: AminoAcidHydrophobicity,
}

impl AminoAcid {
    pub fn is_hydrophobic(&self) -> bool {
        self.hydrophobicity.kyle_doolittle > 0.0
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AminoAcids {
    pub aas: HashMap<char, AminoAcid>,
    three_letter: HashMap<String, char>,
}

impl Default for AminoAcids {
    fn default() -> Self {
        let mut aas = HashMap::new();
        let mut three_letter = HashMap::new();
        for (aa, tla, kd, hw) in STANDARD_AMINO_ACIDS {
            aas.insert(
                aa,
                AminoAcid {
                    aa,
                    tla: tla.to_string(),
                    hydrophobicity: AminoAcidHydrophobicity {
                        kyle_doolittle: kd,
                        hopp_woods: hw,
                    },
                },
            );
            three_letter.insert(tla.to_string(), aa);
        }
        for (tla, aa) in RESIDUE_ALIASES {
            three_letter.insert(tla.to_string(), aa);
        }
        Self { aas, three_letter }
    }
}

impl AminoAcids {
    pub fn get(&self, aa: char) -> Option<&AminoAcid> {
        self.aas.get(&aa.to_ascii_uppercase())
    }

    pub fn is_standard(&self, aa: char) -> bool {
        self.aas.contains_key(&aa)
    }

    /// Standard residues plus the stop symbol.
    pub fn is_in_alphabet(&self, aa: char) -> bool {
        aa == STOP || self.is_standard(aa)
    }

    pub fn from_three_letter(&self, name: &str) -> Option<char> {
        self.three_letter
            .get(name.trim().to_ascii_uppercase().as_str())
            .copied()
    }

    /// Share of standard residues with a positive Kyte-Doolittle value.
    /// Non-standard symbols and stops are left out of the denominator.
    pub fn hydrophobic_fraction(&self, sequence: &str) -> f32 {
        let (hydrophobic, total) = sequence
            .chars()
            .filter_map(|c| self.get(c))
            .fold((0usize, 0usize), |(h, t), aa| {
                (h + usize::from(aa.is_hydrophobic()), t + 1)
            });
        if total == 0 {
            0.0
        } else {
            hydrophobic as f32 / total as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_letter_lookup() {
        let aas = AminoAcids::default();
        assert_eq!(aas.from_three_letter("ALA"), Some('A'));
        assert_eq!(aas.from_three_letter(" trp"), Some('W'));
        assert_eq!(aas.from_three_letter("MSE"), Some('M'));
        assert_eq!(aas.from_three_letter("HOH"), None);
    }

    #[test]
    fn test_alphabet_has_21_symbols() {
        let aas = AminoAcids::default();
        let alphabet: Vec<char> = ('A'..='Z')
            .chain(std::iter::once(STOP))
            .filter(|c| aas.is_in_alphabet(*c))
            .collect();
        assert_eq!(alphabet.len(), 21);
        assert!(!aas.is_in_alphabet('B'));
        assert!(!aas.is_in_alphabet(UNKNOWN));
    }

    #[test]
    fn test_hydrophobic_fraction() {
        let aas = AminoAcids::default();
        assert_eq!(aas.hydrophobic_fraction("LLLL"), 1.0);
        assert_eq!(aas.hydrophobic_fraction("GGGS"), 0.0);
        assert_eq!(aas.hydrophobic_fraction("LLGG"), 0.5);
        assert_eq!(aas.hydrophobic_fraction(""), 0.0);
    }
}
