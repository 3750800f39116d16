//! Typed design configuration read by the assembler.

use crate::{
    sequence_library::{PartCategory, SequenceLibrary},
    validation::normalize,
};
use mesa_protocol::OutputChainName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Separator between the TMD and the intracellular module, and between ICD parts.
pub const JUNCTION: &str = "GGGSGGGS";
pub const DEFAULT_TMD: &str = "CD28";
pub const DEFAULT_PRS: &str = "PRS";
pub const DEFAULT_N_PROTEASE: &str = "NTEVp";
pub const DEFAULT_C_PROTEASE: &str = "CTEVp";
pub const DEFAULT_COMPLETE_PROTEASE: &str = "TEVp";

lazy_static::lazy_static! {
    /// Ten repeats of `GGGS`, between binder and TMD.
    pub static ref DEFAULT_TMD_LINKER: String = "GGGS".repeat(10);
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PartChoice {
    Library { name: String },
    Custom { sequence: String },
}

impl PartChoice {
    pub fn library(name: &str) -> Self {
        PartChoice::Library {
            name: name.to_string(),
        }
    }

    pub fn custom(sequence: &str) -> Self {
        PartChoice::Custom {
            sequence: normalize(sequence),
        }
    }

    /// The part sequence, or an empty string plus a warning when it cannot be resolved.
    pub fn resolve(
        &self,
        library: &SequenceLibrary,
        category: PartCategory,
    ) -> (String, Option<String>) {
        match self {
            PartChoice::Library { name } => match library.sequence(category, name) {
                Some(sequence) => (sequence.to_string(), None),
                None => (
                    String::new(),
                    Some(format!("unknown {category} part '{name}'")),
                ),
            },
            PartChoice::Custom { sequence } if sequence.is_empty() => (
                String::new(),
                Some(format!("custom {category} sequence is empty")),
            ),
            PartChoice::Custom { sequence } => (normalize(sequence), None),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProteaseRole {
    NTerminal,
    CTerminal,
    Complete,
}

/// What a chain carries besides its binder. One protease role at most.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainRole {
    pub protease: Option<ProteaseRole>,
    pub cargo: bool,
    pub aip: bool,
    /// Tag names from the library, in insertion order.
    pub tags: Vec<String>,
}

impl ChainRole {
    pub fn is_empty(&self) -> bool {
        self.protease.is_none() && !self.cargo && !self.aip && self.tags.is_empty()
    }
}

/// Per output chain: the binder-to-TMD linker and the TMD.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainDesign {
    pub linker: String,
    pub tmd: PartChoice,
}

impl Default for ChainDesign {
    fn default() -> Self {
        Self {
            linker: DEFAULT_TMD_LINKER.clone(),
            tmd: PartChoice::library(DEFAULT_TMD),
        }
    }
}

pub type ComponentAssociation = BTreeMap<OutputChainName, ChainRole>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartSlot {
    NProtease,
    CProtease,
    CompleteProtease,
    Prs,
    Aip,
}

impl PartSlot {
    pub fn category(&self) -> PartCategory {
        match self {
            PartSlot::NProtease => PartCategory::NProtease,
            PartSlot::CProtease => PartCategory::CProtease,
            PartSlot::CompleteProtease => PartCategory::Protease,
            PartSlot::Prs => PartCategory::Prs,
            PartSlot::Aip => PartCategory::Aip,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignConfiguration {
    pub transmembrane: bool,
    /// Replaces the whole protease module when set.
    pub custom_icd: Option<String>,
    pub split_protease: bool,
    pub protease_release: bool,
    pub cargo_release: bool,
    pub n_protease: PartChoice,
    pub c_protease: PartChoice,
    pub complete_protease: PartChoice,
    pub prs: PartChoice,
    pub aip: Option<PartChoice>,
    pub cargo: String,
    pub fret: bool,
    pub chains: BTreeMap<OutputChainName, ChainDesign>,
    pub roles: ComponentAssociation,
}

impl Default for DesignConfiguration {
    fn default() -> Self {
        Self {
            transmembrane: true,
            custom_icd: None,
            split_protease: true,
            protease_release: false,
            cargo_release: true,
            n_protease: PartChoice::library(DEFAULT_N_PROTEASE),
            c_protease: PartChoice::library(DEFAULT_C_PROTEASE),
            complete_protease: PartChoice::library(DEFAULT_COMPLETE_PROTEASE),
            prs: PartChoice::library(DEFAULT_PRS),
            aip: None,
            cargo: String::new(),
            fret: false,
            chains: BTreeMap::new(),
            roles: ComponentAssociation::new(),
        }
    }
}

impl DesignConfiguration {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn chain_design(&self, chain: &str) -> ChainDesign {
        self.chains.get(chain).cloned().unwrap_or_default()
    }

    pub fn role(&self, chain: &str) -> ChainRole {
        self.roles.get(chain).cloned().unwrap_or_default()
    }

    pub fn part(&self, slot: PartSlot) -> Option<&PartChoice> {
        match slot {
            PartSlot::NProtease => Some(&self.n_protease),
            PartSlot::CProtease => Some(&self.c_protease),
            PartSlot::CompleteProtease => Some(&self.complete_protease),
            PartSlot::Prs => Some(&self.prs),
            PartSlot::Aip => self.aip.as_ref(),
        }
    }

    pub fn set_transmembrane(&mut self, transmembrane: bool) {
        self.transmembrane = transmembrane;
    }

    pub fn set_custom_icd(&mut self, sequence: Option<&str>) {
        self.custom_icd = sequence.map(normalize);
    }

    pub fn set_split_protease(&mut self, split: bool) {
        self.split_protease = split;
    }

    pub fn set_protease_release(&mut self, release: bool) {
        self.protease_release = release;
    }

    pub fn set_cargo_release(&mut self, release: bool) {
        self.cargo_release = release;
    }

    pub fn set_fret(&mut self, fret: bool) {
        self.fret = fret;
    }

    pub fn set_cargo(&mut self, sequence: &str) {
        self.cargo = normalize(sequence);
    }

    /// `None` clears the AIP part; the protease and PRS slots always keep one.
    pub fn set_part(&mut self, slot: PartSlot, choice: Option<PartChoice>) {
        match (slot, choice) {
            (PartSlot::Aip, choice) => self.aip = choice,
            (_, None) => {}
            (PartSlot::NProtease, Some(choice)) => self.n_protease = choice,
            (PartSlot::CProtease, Some(choice)) => self.c_protease = choice,
            (PartSlot::CompleteProtease, Some(choice)) => self.complete_protease = choice,
            (PartSlot::Prs, Some(choice)) => self.prs = choice,
        }
    }

    pub fn set_chain_linker(&mut self, chain: &str, linker: &str) {
        self.chains.entry(chain.to_string()).or_default().linker = normalize(linker);
    }

    pub fn set_chain_tmd(&mut self, chain: &str, tmd: PartChoice) {
        self.chains.entry(chain.to_string()).or_default().tmd = tmd;
    }

    /// Replaces any previous protease role of the chain.
    pub fn set_protease_role(&mut self, chain: &str, role: Option<ProteaseRole>) {
        self.roles.entry(chain.to_string()).or_default().protease = role;
        self.prune_role(chain);
    }

    pub fn set_cargo_chain(&mut self, chain: &str, cargo: bool) {
        self.roles.entry(chain.to_string()).or_default().cargo = cargo;
        self.prune_role(chain);
    }

    pub fn set_aip_chain(&mut self, chain: &str, aip: bool) {
        self.roles.entry(chain.to_string()).or_default().aip = aip;
        self.prune_role(chain);
    }

    pub fn set_tags(&mut self, chain: &str, tags: Vec<String>) {
        self.roles.entry(chain.to_string()).or_default().tags = tags;
        self.prune_role(chain);
    }

    fn prune_role(&mut self, chain: &str) {
        if self.roles.get(chain).is_some_and(ChainRole::is_empty) {
            self.roles.remove(chain);
        }
    }

    pub fn with_transmembrane(mut self, transmembrane: bool) -> Self {
        self.set_transmembrane(transmembrane);
        self
    }

    pub fn with_custom_icd(mut self, sequence: &str) -> Self {
        self.set_custom_icd(Some(sequence));
        self
    }

    pub fn with_split_protease(mut self, split: bool) -> Self {
        self.set_split_protease(split);
        self
    }

    pub fn with_protease_release(mut self, release: bool) -> Self {
        self.set_protease_release(release);
        self
    }

    pub fn with_cargo_release(mut self, release: bool) -> Self {
        self.set_cargo_release(release);
        self
    }

    pub fn with_fret(mut self, fret: bool) -> Self {
        self.set_fret(fret);
        self
    }

    pub fn with_cargo(mut self, sequence: &str) -> Self {
        self.set_cargo(sequence);
        self
    }

    pub fn with_part(mut self, slot: PartSlot, choice: PartChoice) -> Self {
        self.set_part(slot, Some(choice));
        self
    }

    pub fn with_chain(mut self, chain: &str, design: ChainDesign) -> Self {
        self.chains.insert(chain.to_string(), design);
        self
    }

    pub fn with_role(mut self, chain: &str, role: ChainRole) -> Self {
        self.roles.insert(chain.to_string(), role);
        self.prune_role(chain);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DesignConfiguration::default();
        assert!(config.transmembrane);
        assert!(config.split_protease);
        assert!(!config.protease_release);
        assert!(config.cargo_release);
        assert!(!config.fret);
        let chain = config.chain_design("Chain A");
        assert_eq!(chain.linker, "GGGS".repeat(10));
        assert_eq!(chain.tmd, PartChoice::library("CD28"));
        assert!(config.role("Chain A").is_empty());
    }

    #[test]
    fn test_protease_role_is_last_write_wins() {
        let mut config = DesignConfiguration::default();
        config.set_protease_role("Chain A", Some(ProteaseRole::NTerminal));
        config.set_protease_role("Chain A", Some(ProteaseRole::CTerminal));
        assert_eq!(config.role("Chain A").protease, Some(ProteaseRole::CTerminal));
        assert_eq!(config.roles.len(), 1);
    }

    #[test]
    fn test_roles_are_independent_and_pruned() {
        let mut config = DesignConfiguration::default();
        config.set_cargo_chain("Chain B", true);
        config.set_aip_chain("Chain B", true);
        config.set_tags("Chain B", vec!["FLAG".to_string()]);
        let role = config.role("Chain B");
        assert!(role.cargo && role.aip && role.protease.is_none());
        config.set_cargo_chain("Chain B", false);
        config.set_aip_chain("Chain B", false);
        config.set_tags("Chain B", vec![]);
        assert!(!config.roles.contains_key("Chain B"));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut config = DesignConfiguration::default()
            .with_transmembrane(false)
            .with_fret(true)
            .with_cargo("gal4 vp64");
        assert_eq!(config.cargo, "GAL4VP64");
        config.set_protease_role("Chain A", Some(ProteaseRole::Complete));
        config.reset();
        assert_eq!(config, DesignConfiguration::default());
    }

    #[test]
    fn test_resolve_part_choice() {
        let library = SequenceLibrary::default();
        let (seq, warning) = PartChoice::library("prs").resolve(&library, PartCategory::Prs);
        assert_eq!(seq, "ENLYFQS");
        assert!(warning.is_none());

        let (seq, warning) = PartChoice::library("nope").resolve(&library, PartCategory::Tmd);
        assert_eq!(seq, "");
        assert_eq!(warning.unwrap(), "unknown tmd part 'nope'");

        let (seq, warning) = PartChoice::custom("  ").resolve(&library, PartCategory::Protease);
        assert_eq!(seq, "");
        assert!(warning.unwrap().contains("empty"));

        let (seq, _) = PartChoice::custom("enly fqs").resolve(&library, PartCategory::Prs);
        assert_eq!(seq, "ENLYFQS");
    }

    #[test]
    fn test_aip_slot_can_be_cleared() {
        let mut config =
            DesignConfiguration::default().with_part(PartSlot::Aip, PartChoice::library("AIP-P"));
        assert!(config.part(PartSlot::Aip).is_some());
        config.set_part(PartSlot::Aip, None);
        assert!(config.part(PartSlot::Aip).is_none());
        config.set_part(PartSlot::Prs, None);
        assert_eq!(config.part(PartSlot::Prs), Some(&PartChoice::library("PRS")));
    }

    #[test]
    fn test_config_json_uses_defaults_for_missing_fields() {
        let config: DesignConfiguration = serde_json::from_str(
            r#"{"split_protease": false, "aip": {"source": "library", "name": "AIP-P"}}"#,
        )
        .unwrap();
        assert!(!config.split_protease);
        assert!(config.transmembrane);
        assert_eq!(config.aip, Some(PartChoice::library("AIP-P")));
    }
}
