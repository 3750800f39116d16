//! Builds annotated MESA constructs from binder chains and a design configuration.
//!
//! Every output chain with a non-empty binder starts from the same base:
//! start residue or CD4 signal peptide, tags, binder, linker and, for
//! membrane-bound designs, TMD plus junction. The intracellular module that
//! follows depends on the chain's role and the split/complete protease mode.

use crate::{
    design::{DesignConfiguration, JUNCTION, PartSlot, ProteaseRole},
    sequence_library::{
        CD4_SIGNAL_PEPTIDE, FRET_MCERULEAN, FRET_MVENUS, PartCategory, SequenceLibrary,
    },
    validation::validate_design,
};
use itertools::Itertools;
use mesa_protocol::{Construct, Fragment, LinkedChains};
use serde::{Deserialize, Serialize};

pub const START_RESIDUE: &str = "M";

pub const SIGNAL_LABEL: &str = "CD4 Signal Sequence";
pub const SIGNAL_COLOR: &str = "#74C30EFF";
pub const BINDER_COLOR: &str = "#534cb3";
pub const LINKER_COLOR: &str = "#eba814";
pub const TMD_COLOR: &str = "#69ad52";
pub const TAG_COLOR: &str = "#26B771FF";
pub const PRS_COLOR: &str = "#b4774b";
pub const N_PROTEASE_COLOR: &str = "#bfbd40";
pub const C_PROTEASE_COLOR: &str = "#3948c6";
pub const PROTEASE_COLOR: &str = "#6b46b9";
pub const CARGO_COLOR: &str = "#bd4258";
pub const AIP_COLOR: &str = "#5aa56b";
pub const MVENUS_COLOR: &str = "#43b6bc";
pub const MCERULEAN_COLOR: &str = "#c43b81";
pub const CUSTOM_ICD_COLOR: &str = "#7D2593";

pub const N_PROTEASE_SUFFIX: &str = "N-Term Protease";
pub const C_PROTEASE_SUFFIX: &str = "C-Term Protease";
pub const PROTEASE_SUFFIX: &str = "Protease";
pub const CARGO_SUFFIX: &str = "Cargo";
pub const CUSTOM_ICD_SUFFIX: &str = "Custom ICD";
pub const FRET_MVENUS_SUFFIX: &str = "FRET_mVenus";
pub const FRET_MCERULEAN_SUFFIX: &str = "FRET_mCerulean";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Assembly {
    pub constructs: Vec<Construct>,
    pub warnings: Vec<String>,
}

impl Assembly {
    pub fn get(&self, name: &str) -> Option<&Construct> {
        self.constructs.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.constructs.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.constructs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructs.is_empty()
    }
}

struct Assembler<'a> {
    config: &'a DesignConfiguration,
    library: &'a SequenceLibrary,
    warnings: Vec<String>,
}

impl<'a> Assembler<'a> {
    fn part(&mut self, slot: PartSlot) -> Option<String> {
        let choice = self.config.part(slot)?;
        let (sequence, warning) = choice.resolve(self.library, slot.category());
        self.warnings.extend(warning);
        Some(sequence)
    }

    fn library_part(&mut self, category: PartCategory, name: &str) -> Option<String> {
        let ret = self.library.sequence(category, name).map(str::to_string);
        if ret.is_none() {
            self.warnings.push(format!("unknown {category} part '{name}'"));
        }
        ret
    }

    fn prs(&mut self) -> Fragment {
        let prs = self.part(PartSlot::Prs).unwrap_or_default();
        Fragment::annotated(&prs, "PRS", PRS_COLOR)
    }

    fn cargo(&mut self, chain: &str) -> Fragment {
        if self.config.cargo.is_empty() {
            self.warnings
                .push(format!("{chain}: cargo attached but cargo sequence is empty"));
        }
        Fragment::annotated(&self.config.cargo, "Cargo", CARGO_COLOR)
    }

    /// Separator + AIP when the chain carries one, then the terminal stop.
    fn finish(&mut self, chain: &str, aip: bool, fragments: &mut Vec<Fragment>) {
        if aip {
            match self.part(PartSlot::Aip) {
                Some(sequence) => {
                    fragments.push(Fragment::separator(JUNCTION));
                    fragments.push(Fragment::annotated(&sequence, "AIP", AIP_COLOR));
                }
                None => self
                    .warnings
                    .push(format!("{chain}: AIP attached but no AIP part selected")),
            }
        }
        fragments.push(Fragment::Stop);
    }

    fn base(&mut self, chain: &str, binder: &str) -> Vec<Fragment> {
        let design = self.config.chain_design(chain);
        let role = self.config.role(chain);
        let mut ret = vec![];

        if self.config.transmembrane {
            let signal = self
                .library_part(PartCategory::SignalPeptide, CD4_SIGNAL_PEPTIDE)
                .unwrap_or_default();
            ret.push(Fragment::annotated(&signal, SIGNAL_LABEL, SIGNAL_COLOR));
        } else {
            ret.push(Fragment::separator(START_RESIDUE));
        }

        for tag in &role.tags {
            if let Some(sequence) = self.library_part(PartCategory::Tag, tag) {
                ret.push(Fragment::annotated(&sequence, &format!("{tag} Tag"), TAG_COLOR));
            }
        }

        ret.push(Fragment::annotated(binder, "Binder", BINDER_COLOR));
        ret.push(Fragment::annotated(&design.linker, "Linker", LINKER_COLOR));

        if self.config.transmembrane {
            let (tmd, warning) = design.tmd.resolve(self.library, PartCategory::Tmd);
            if let Some(warning) = warning {
                self.warnings.push(format!("{chain}: {warning}"));
            }
            ret.push(Fragment::annotated(&tmd, "TMD", TMD_COLOR));
            ret.push(Fragment::separator(JUNCTION));
        }
        ret
    }

    fn split_protease(
        &mut self,
        chain: &str,
        role: ProteaseRole,
        mut fragments: Vec<Fragment>,
    ) -> Construct {
        let chain_role = self.config.role(chain);
        let (slot, label, color, suffix) = match role {
            ProteaseRole::NTerminal => (
                PartSlot::NProtease,
                N_PROTEASE_SUFFIX,
                N_PROTEASE_COLOR,
                N_PROTEASE_SUFFIX,
            ),
            _ => (
                PartSlot::CProtease,
                C_PROTEASE_SUFFIX,
                C_PROTEASE_COLOR,
                C_PROTEASE_SUFFIX,
            ),
        };

        if self.config.protease_release {
            fragments.push(self.prs());
            fragments.push(Fragment::separator(JUNCTION));
        }
        let protease = self.part(slot).unwrap_or_default();
        fragments.push(Fragment::annotated(&protease, label, color));
        if chain_role.cargo {
            if self.config.cargo_release {
                fragments.push(Fragment::separator(JUNCTION));
                fragments.push(self.prs());
            }
            fragments.push(Fragment::separator(JUNCTION));
            fragments.push(self.cargo(chain));
        }
        self.finish(chain, chain_role.aip, &mut fragments);

        let name = format!("{chain}_{suffix}");
        let header = protease_header(&name, chain_role.cargo);
        Construct::new(&name, &header, fragments)
    }

    fn complete_protease(&mut self, chain: &str, mut fragments: Vec<Fragment>) -> Construct {
        let chain_role = self.config.role(chain);
        let protease = self.part(PartSlot::CompleteProtease).unwrap_or_default();
        fragments.push(Fragment::annotated(&protease, "Protease", PROTEASE_COLOR));
        if chain_role.cargo {
            fragments.push(self.prs());
            fragments.push(Fragment::separator(JUNCTION));
            fragments.push(self.cargo(chain));
        }
        self.finish(chain, chain_role.aip, &mut fragments);

        let name = format!("{chain}_{PROTEASE_SUFFIX}");
        let header = protease_header(&name, chain_role.cargo);
        Construct::new(&name, &header, fragments)
    }

    fn cargo_only(&mut self, chain: &str, mut fragments: Vec<Fragment>) -> Construct {
        fragments.push(self.prs());
        fragments.push(Fragment::separator(JUNCTION));
        fragments.push(self.cargo(chain));
        fragments.push(Fragment::Stop);
        let name = format!("{chain}_{CARGO_SUFFIX}");
        Construct::new(&name, &format!("> {name}"), fragments)
    }

    fn custom_icd(&mut self, chain: &str, icd: &str, mut fragments: Vec<Fragment>) -> Construct {
        if icd.is_empty() {
            self.warnings
                .push(format!("{chain}: custom ICD sequence is empty"));
        }
        fragments.push(Fragment::annotated(icd, CUSTOM_ICD_SUFFIX, CUSTOM_ICD_COLOR));
        let name = format!("{chain}_{CUSTOM_ICD_SUFFIX}");
        Construct::new(&name, &format!("> {name}"), fragments)
    }

    /// The protease, cargo or custom ICD construct of one chain, if its role asks for one.
    fn module(&mut self, chain: &str, base: &[Fragment]) -> Option<Construct> {
        if let Some(icd) = self.config.custom_icd.clone() {
            return Some(self.custom_icd(chain, &icd, base.to_vec()));
        }
        let role = self.config.role(chain);
        match (self.config.split_protease, role.protease) {
            (true, Some(p @ (ProteaseRole::NTerminal | ProteaseRole::CTerminal))) => {
                Some(self.split_protease(chain, p, base.to_vec()))
            }
            (false, Some(ProteaseRole::Complete)) => {
                Some(self.complete_protease(chain, base.to_vec()))
            }
            (false, None) if role.cargo => Some(self.cargo_only(chain, base.to_vec())),
            (true, Some(ProteaseRole::Complete)) => {
                self.warnings.push(format!(
                    "{chain}: complete protease is ignored in a split protease design"
                ));
                None
            }
            (false, Some(_)) => {
                self.warnings.push(format!(
                    "{chain}: split protease fragment is ignored in a complete protease design"
                ));
                None
            }
            _ => None,
        }
    }

    fn fret(&mut self, chain: &str, base: &[Fragment]) -> Vec<Construct> {
        [
            (FRET_MVENUS, MVENUS_COLOR, FRET_MVENUS_SUFFIX),
            (FRET_MCERULEAN, MCERULEAN_COLOR, FRET_MCERULEAN_SUFFIX),
        ]
        .into_iter()
        .map(|(reporter, color, suffix)| {
            let sequence = self
                .library_part(PartCategory::Fret, reporter)
                .unwrap_or_default();
            let mut fragments = base.to_vec();
            fragments.push(Fragment::annotated(&sequence, reporter, color));
            fragments.push(Fragment::Stop);
            let name = format!("{chain}_{suffix}");
            Construct::new(&name, &format!("> {name}"), fragments)
        })
        .collect()
    }
}

fn protease_header(name: &str, cargo: bool) -> String {
    if cargo {
        format!("> {name}_CARGO")
    } else {
        format!("> {name}")
    }
}

/// Assembles every construct for the given binder chains.
///
/// Deterministic for fixed inputs. Chains with an empty binder produce nothing.
pub fn assemble(
    binders: &LinkedChains,
    config: &DesignConfiguration,
    library: &SequenceLibrary,
) -> Assembly {
    let mut assembler = Assembler {
        config,
        library,
        warnings: vec![],
    };
    let mut constructs = vec![];

    for (chain, binder) in binders.iter().filter(|(_, b)| !b.is_empty()) {
        let base = assembler.base(chain, binder);
        constructs.extend(assembler.module(chain, &base));
        if config.fret {
            constructs.extend(assembler.fret(chain, &base));
        }
    }

    for chain in config.roles.keys().filter(|c| !binders.contains_key(*c)) {
        log::debug!("Role for '{chain}' has no binder chain, skipped");
    }

    let warnings = assembler.warnings.into_iter().unique().collect();
    log::info!("Assembled {} constructs", constructs.len());
    Assembly {
        constructs,
        warnings,
    }
}

/// Validates binders and user-entered design sequences, then assembles.
///
/// Validation warnings come first, followed by the assembly warnings.
pub fn assemble_validated(
    binders: &LinkedChains,
    config: &DesignConfiguration,
    library: &SequenceLibrary,
) -> Assembly {
    let validated = validate_design(binders, config);
    let mut ret = assemble(&validated.binders, &validated.design, library);
    let mut warnings = validated.warnings;
    warnings.append(&mut ret.warnings);
    ret.warnings = warnings;
    ret
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{ChainDesign, ChainRole, PartChoice};

    const BINDER_A: &str = "EVQLVESGGGGGGGSDIQMTQSPSS";
    const BINDER_B: &str = "QVQLQESGPG";

    fn library() -> SequenceLibrary {
        SequenceLibrary::default()
    }

    fn binders() -> LinkedChains {
        LinkedChains::from([
            ("Chain A".to_string(), BINDER_A.to_string()),
            ("Chain B".to_string(), BINDER_B.to_string()),
        ])
    }

    fn seq(category: PartCategory, name: &str) -> String {
        library().sequence(category, name).unwrap().to_string()
    }

    fn role(protease: Option<ProteaseRole>, cargo: bool, aip: bool) -> ChainRole {
        ChainRole {
            protease,
            cargo,
            aip,
            tags: vec![],
        }
    }

    fn base_a() -> String {
        format!(
            "{}{BINDER_A}{}{}{JUNCTION}",
            seq(PartCategory::SignalPeptide, "CD4"),
            "GGGS".repeat(10),
            seq(PartCategory::Tmd, "CD28")
        )
    }

    #[test]
    fn test_complete_protease_with_cargo_matches_hand_concatenation() {
        let config = DesignConfiguration::default()
            .with_split_protease(false)
            .with_cargo("GAL4VP64")
            .with_role("Chain A", role(Some(ProteaseRole::Complete), true, false));
        let assembly = assemble(&binders(), &config, &library());
        assert_eq!(assembly.names(), vec!["Chain A_Protease"]);
        let construct = assembly.get("Chain A_Protease").unwrap();
        let expected = format!(
            "{}{}{}{JUNCTION}GAL4VP64",
            base_a(),
            seq(PartCategory::Protease, "TEVp"),
            seq(PartCategory::Prs, "PRS")
        );
        assert_eq!(construct.sequence(), expected);
        assert_eq!(construct.header, "> Chain A_Protease_CARGO");
        assert!(construct.ends_with_stop());
        assert!(assembly.warnings.is_empty(), "{:?}", assembly.warnings);
    }

    #[test]
    fn test_split_design_with_release_cargo_and_aip() {
        let config = DesignConfiguration::default()
            .with_protease_release(true)
            .with_cargo("GAL4")
            .with_part(PartSlot::Aip, PartChoice::library("AIP-P"))
            .with_role("Chain A", role(Some(ProteaseRole::NTerminal), false, false))
            .with_role("Chain B", role(Some(ProteaseRole::CTerminal), true, true));
        let assembly = assemble(&binders(), &config, &library());
        assert_eq!(
            assembly.names(),
            vec!["Chain A_N-Term Protease", "Chain B_C-Term Protease"]
        );
        let prs = seq(PartCategory::Prs, "PRS");

        let a = assembly.get("Chain A_N-Term Protease").unwrap();
        assert_eq!(
            a.sequence(),
            format!("{}{prs}{JUNCTION}{}", base_a(), seq(PartCategory::NProtease, "NTEVp"))
        );
        assert_eq!(a.header, "> Chain A_N-Term Protease");

        let b = assembly.get("Chain B_C-Term Protease").unwrap();
        let base_b = format!(
            "{}{BINDER_B}{}{}{JUNCTION}",
            seq(PartCategory::SignalPeptide, "CD4"),
            "GGGS".repeat(10),
            seq(PartCategory::Tmd, "CD28")
        );
        assert_eq!(
            b.sequence(),
            format!(
                "{base_b}{prs}{JUNCTION}{}{JUNCTION}{prs}{JUNCTION}GAL4{JUNCTION}ENLYFQP",
                seq(PartCategory::CProtease, "CTEVp")
            )
        );
        assert_eq!(b.header, "> Chain B_C-Term Protease_CARGO");
        assert_eq!(b.last_annotation().unwrap().label, "AIP");
        assert!(b.ends_with_stop());
    }

    #[test]
    fn test_split_cargo_without_release() {
        let config = DesignConfiguration::default()
            .with_cargo_release(false)
            .with_cargo("GAL4")
            .with_role("Chain A", role(Some(ProteaseRole::NTerminal), true, false));
        let assembly = assemble(&binders(), &config, &library());
        let a = assembly.get("Chain A_N-Term Protease").unwrap();
        assert_eq!(
            a.sequence(),
            format!("{}{}{JUNCTION}GAL4", base_a(), seq(PartCategory::NProtease, "NTEVp"))
        );
    }

    #[test]
    fn test_cargo_only_chain_in_complete_mode_ignores_aip() {
        let config = DesignConfiguration::default()
            .with_split_protease(false)
            .with_cargo("GAL4")
            .with_part(PartSlot::Aip, PartChoice::library("AIP-P"))
            .with_role("Chain B", role(None, true, true));
        let assembly = assemble(&binders(), &config, &library());
        let b = assembly.get("Chain B_Cargo").unwrap();
        assert!(b.sequence().ends_with(&format!("ENLYFQS{JUNCTION}GAL4")));
        assert_eq!(b.last_annotation().unwrap().label, "Cargo");
        assert!(b.ends_with_stop());
    }

    #[test]
    fn test_chains_without_roles_produce_nothing() {
        let assembly = assemble(&binders(), &DesignConfiguration::default(), &library());
        assert!(assembly.is_empty());

        let config = DesignConfiguration::default()
            .with_role("Chain A", role(Some(ProteaseRole::Complete), false, false));
        let assembly = assemble(&binders(), &config, &library());
        assert!(assembly.is_empty());
        assert_eq!(assembly.warnings.len(), 1);
    }

    #[test]
    fn test_cargo_only_chain_in_split_mode_produces_nothing() {
        let config = DesignConfiguration::default()
            .with_cargo("GAL4")
            .with_role("Chain A", role(None, true, false));
        let assembly = assemble(&binders(), &config, &library());
        assert!(assembly.is_empty());
        assert!(assembly.warnings.is_empty(), "{:?}", assembly.warnings);
    }

    #[test]
    fn test_assemble_validated_cleans_user_sequences() {
        let mut config = DesignConfiguration::default()
            .with_split_protease(false)
            .with_role("Chain B", role(None, true, false));
        config.cargo = "galk vpee".to_string();
        let binders = LinkedChains::from([("Chain B".to_string(), "qvql qes".to_string())]);
        let assembly = assemble_validated(&binders, &config, &library());
        let b = assembly.get("Chain B_Cargo").unwrap();
        assert!(b.sequence().ends_with(&format!("{JUNCTION}GALKVPEE")));
        assert!(b.sequence().contains("QVQLQES"));
        assert!(assembly.warnings.is_empty(), "{:?}", assembly.warnings);

        config.cargo = "G".repeat(20_000);
        config.custom_icd = Some("kk kk".to_string());
        let assembly = assemble_validated(&binders, &config, &library());
        let icd = assembly.get("Chain B_Custom ICD").unwrap();
        assert!(icd.sequence().ends_with("KKKK"));
        assert_eq!(assembly.warnings.len(), 1);
        assert!(assembly.warnings[0].starts_with("cargo: sequence of length 20000"));
    }

    #[test]
    fn test_fret_adds_two_constructs_per_chain() {
        let configs = [
            DesignConfiguration::default(),
            DesignConfiguration::default()
                .with_role("Chain A", role(Some(ProteaseRole::NTerminal), true, false))
                .with_cargo("GAL4"),
            DesignConfiguration::default()
                .with_split_protease(false)
                .with_role("Chain B", role(Some(ProteaseRole::Complete), false, false)),
        ];
        for config in configs {
            let without = assemble(&binders(), &config, &library());
            let with = assemble(&binders(), &config.clone().with_fret(true), &library());
            assert_eq!(with.len(), without.len() + 4);
            for chain in ["Chain A", "Chain B"] {
                let venus = with.get(&format!("{chain}_FRET_mVenus")).unwrap();
                assert_eq!(venus.last_annotation().unwrap().label, "mVenus");
                assert!(venus.ends_with_stop());
                let cerulean = with.get(&format!("{chain}_FRET_mCerulean")).unwrap();
                assert_eq!(cerulean.last_annotation().unwrap().label, "mCerulean");
            }
        }
    }

    #[test]
    fn test_empty_binder_is_skipped() {
        let mut binders = binders();
        binders.insert("Chain B".to_string(), String::new());
        let config = DesignConfiguration::default().with_fret(true);
        let assembly = assemble(&binders, &config, &library());
        assert_eq!(
            assembly.names(),
            vec!["Chain A_FRET_mVenus", "Chain A_FRET_mCerulean"]
        );
    }

    #[test]
    fn test_soluble_design_starts_with_methionine_and_carries_tags() {
        let mut chain_role = role(Some(ProteaseRole::NTerminal), false, false);
        chain_role.tags = vec!["FLAG".to_string(), "HA".to_string()];
        let config = DesignConfiguration::default()
            .with_transmembrane(false)
            .with_chain(
                "Chain A",
                ChainDesign {
                    linker: "GGGGS".to_string(),
                    tmd: PartChoice::library("CD28"),
                },
            )
            .with_role("Chain A", chain_role)
            .with_fret(true);
        let assembly = assemble(&binders(), &config, &library());
        for name in ["Chain A_N-Term Protease", "Chain A_FRET_mVenus"] {
            let construct = assembly.get(name).unwrap();
            assert!(
                construct
                    .sequence()
                    .starts_with(&format!("MDYKDDDDKYPYDVPDYA{BINDER_A}GGGGS")),
                "{name}"
            );
            let labels: Vec<&str> = construct
                .feature_ranges()
                .into_iter()
                .map(|(_, a)| a.label.as_str())
                .collect();
            assert_eq!(&labels[..4], &["FLAG Tag", "HA Tag", "Binder", "Linker"]);
        }
    }

    #[test]
    fn test_custom_icd_replaces_protease_module() {
        let config = DesignConfiguration::default()
            .with_custom_icd("kkkk")
            .with_role("Chain A", role(Some(ProteaseRole::NTerminal), true, true));
        let assembly = assemble(&binders(), &config, &library());
        assert_eq!(assembly.names(), vec!["Chain A_Custom ICD", "Chain B_Custom ICD"]);
        let a = assembly.get("Chain A_Custom ICD").unwrap();
        assert_eq!(a.sequence(), format!("{}KKKK", base_a()));
        assert!(!a.ends_with_stop());
    }

    #[test]
    fn test_empty_custom_parts_are_warned_and_assembled() {
        let config = DesignConfiguration::default()
            .with_split_protease(false)
            .with_part(PartSlot::CompleteProtease, PartChoice::custom(""))
            .with_part(PartSlot::Prs, PartChoice::custom(""))
            .with_chain(
                "Chain A",
                ChainDesign {
                    tmd: PartChoice::custom(""),
                    ..ChainDesign::default()
                },
            )
            .with_role("Chain A", role(Some(ProteaseRole::Complete), true, false));
        let assembly = assemble(&binders(), &config, &library());
        let a = assembly.get("Chain A_Protease").unwrap();
        assert_eq!(
            a.sequence(),
            format!(
                "{}{BINDER_A}{}{JUNCTION}{JUNCTION}",
                seq(PartCategory::SignalPeptide, "CD4"),
                "GGGS".repeat(10)
            )
        );
        assert_eq!(assembly.warnings.len(), 4, "{:?}", assembly.warnings);
    }
}
