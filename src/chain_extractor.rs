//! Per-chain amino-acid sequences from PDB-format coordinate text.
//!
//! Only the first model is read. Residue numbering gaps are filled with `X`
//! so that a chain's sequence lines up with its source numbering.

use crate::{AMINO_ACIDS, amino_acids::UNKNOWN};
use mesa_protocol::ChainRecord;

const UNKNOWN_ID_CODE: &str = "????";
const BLANK_CHAIN_ID: &str = "A";

#[derive(Debug)]
struct ChainBuilder {
    chain_id: String,
    sequence: String,
    residue_numbers: Vec<i64>,
    last_key: Option<(i64, char)>,
}

impl ChainBuilder {
    fn new(chain_id: &str) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            sequence: String::new(),
            residue_numbers: vec![],
            last_key: None,
        }
    }

    fn push(&mut self, res_seq: i64, icode: char, aa: char) {
        let key = (res_seq, icode);
        if self.last_key == Some(key) {
            return;
        }
        if let Some((last_seq, _)) = self.last_key {
            for missing in (last_seq + 1)..res_seq {
                self.sequence.push(UNKNOWN);
                self.residue_numbers.push(missing);
            }
        }
        self.sequence.push(aa);
        self.residue_numbers.push(res_seq);
        self.last_key = Some(key);
    }

    fn finish(self, id_code: &str) -> Option<ChainRecord> {
        let start = *self.residue_numbers.first()?;
        let end = *self.residue_numbers.last()?;
        Some(ChainRecord {
            id: format!("{id_code}:{}", self.chain_id),
            chain_id: self.chain_id,
            sequence: self.sequence,
            start,
            end,
            residue_numbers: self.residue_numbers,
        })
    }
}

fn column(line: &str, from: usize, to: usize) -> &str {
    line.get(from..to.min(line.len())).unwrap_or("").trim()
}

/// Parses PDB text into one record per chain, in order of first appearance.
///
/// Text that is not PDB-formatted yields an empty list.
pub fn extract_chains(structure_text: &str) -> Vec<ChainRecord> {
    let mut id_code = UNKNOWN_ID_CODE.to_string();
    let mut chains: Vec<ChainBuilder> = vec![];

    for line in structure_text.lines() {
        let record = line.get(0..6).unwrap_or(line);
        match record.trim_end() {
            "HEADER" => {
                let code = column(line, 62, 66);
                if !code.is_empty() {
                    id_code = code.to_ascii_uppercase();
                }
            }
            "ENDMDL" => break,
            "ATOM" | "HETATM" => {
                let Some(aa) = AMINO_ACIDS.from_three_letter(column(line, 17, 20)) else {
                    continue;
                };
                let Ok(res_seq) = column(line, 22, 26).parse::<i64>() else {
                    continue;
                };
                let chain_id = match column(line, 21, 22) {
                    "" => BLANK_CHAIN_ID,
                    id => id,
                };
                let icode = line.get(26..27).and_then(|s| s.chars().next()).unwrap_or(' ');
                let idx = match chains.iter().position(|c| c.chain_id == chain_id) {
                    Some(idx) => idx,
                    None => {
                        chains.push(ChainBuilder::new(chain_id));
                        chains.len() - 1
                    }
                };
                chains[idx].push(res_seq, icode, aa);
            }
            _ => {}
        }
    }

    let ret: Vec<ChainRecord> = chains
        .into_iter()
        .filter_map(|c| c.finish(&id_code))
        .collect();
    log::debug!("Extracted {} chains from structure {id_code}", ret.len());
    ret
}

/// `>fasta_name\nsequence\n` for every chain.
pub fn chains_to_fasta(chains: &[ChainRecord]) -> String {
    chains
        .iter()
        .map(|c| format!(">{}\n{}\n", c.fasta_name(), c.sequence))
        .collect()
}
