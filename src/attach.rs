//! Stateless building-block attachment, one component per call.

use crate::{
    assembler::{FRET_MCERULEAN_SUFFIX, FRET_MVENUS_SUFFIX},
    design::JUNCTION,
    error::{MesaError, MesaResult},
    validation::normalize,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type SequenceMap = BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitProtease {
    pub n: String,
    pub c: String,
}

fn require(what: &str, sequence: &str) -> MesaResult<String> {
    let ret = normalize(sequence);
    if ret.is_empty() {
        return Err(MesaError::invalid(format!("{what} must not be empty")));
    }
    Ok(ret)
}

fn require_all(sequences: &SequenceMap) -> MesaResult<SequenceMap> {
    if sequences.is_empty() {
        return Err(MesaError::invalid("at least one sequence is required"));
    }
    sequences
        .iter()
        .map(|(key, sequence)| Ok((key.clone(), require(&format!("sequence '{key}'"), sequence)?)))
        .collect()
}

/// Signal peptide + sequence + linker + TMD.
pub fn attach_tmd(signal: &str, sequence: &str, linker: &str, tmd: &str) -> MesaResult<String> {
    let sequence = require("sequence", sequence)?;
    let tmd = require("TMD", tmd)?;
    Ok(format!("{}{sequence}{}{tmd}", normalize(signal), normalize(linker)))
}

/// Appends the split protease halves to the `n` and `c` sequences.
pub fn attach_split_protease(
    sequences: &SequenceMap,
    splits: &SplitProtease,
) -> MesaResult<SplitProtease> {
    let sequences = require_all(sequences)?;
    let (Some(n), Some(c)) = (sequences.get("n"), sequences.get("c")) else {
        return Err(MesaError::invalid("sequences for both 'n' and 'c' are required"));
    };
    Ok(SplitProtease {
        n: format!("{n}{JUNCTION}{}", require("N-terminal protease", &splits.n)?),
        c: format!("{c}{JUNCTION}{}", require("C-terminal protease", &splits.c)?),
    })
}

pub fn attach_protease(sequence: &str, protease: &str) -> MesaResult<String> {
    Ok(format!(
        "{}{JUNCTION}{}",
        require("sequence", sequence)?,
        require("protease", protease)?
    ))
}

fn append_all(sequences: &SequenceMap, what: &str, component: &str) -> MesaResult<SequenceMap> {
    let component = require(what, component)?;
    Ok(require_all(sequences)?
        .into_iter()
        .map(|(key, sequence)| (key, format!("{sequence}{JUNCTION}{component}")))
        .collect())
}

pub fn attach_prs(sequences: &SequenceMap, prs: &str) -> MesaResult<SequenceMap> {
    append_all(sequences, "PRS", prs)
}

pub fn attach_cargo(sequences: &SequenceMap, cargo: &str) -> MesaResult<SequenceMap> {
    append_all(sequences, "cargo", cargo)
}

/// Prepends the tag to every sequence.
pub fn attach_tag(sequences: &SequenceMap, tag: &str) -> MesaResult<SequenceMap> {
    let tag = require("tag", tag)?;
    Ok(require_all(sequences)?
        .into_iter()
        .map(|(key, sequence)| (key, format!("{tag}{JUNCTION}{sequence}")))
        .collect())
}

/// Two reporter variants per input, keyed `{key}_FRET_mVenus` and `{key}_FRET_mCerulean`.
pub fn fret_sequences(
    sequences: &SequenceMap,
    mvenus: &str,
    mcerulean: &str,
) -> MesaResult<SequenceMap> {
    let mvenus = require("mVenus", mvenus)?;
    let mcerulean = require("mCerulean", mcerulean)?;
    let mut ret = SequenceMap::new();
    for (key, sequence) in require_all(sequences)? {
        ret.insert(
            format!("{key}_{FRET_MVENUS_SUFFIX}"),
            format!("{sequence}{JUNCTION}{mvenus}"),
        );
        ret.insert(
            format!("{key}_{FRET_MCERULEAN_SUFFIX}"),
            format!("{sequence}{JUNCTION}{mcerulean}"),
        );
    }
    Ok(ret)
}
