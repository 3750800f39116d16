//! The design session: chain set, selections and design configuration,
//! mutated one operation at a time. Derived values are recomputed on demand.

use crate::{
    assembler::{self, Assembly},
    chain_extractor::extract_chains,
    chain_linker::{DEFAULT_CHAIN_LINKER, LinkError, link},
    design::{DesignConfiguration, PartChoice, PartSlot, ProteaseRole},
    error::MesaError,
    export::{self, DesignSummary, ExportOptions},
    rcsb::StructureSource,
    residue_selector::{invalid_windows, select},
    sequence_library::{PartCategory, SequenceLibrary},
    validation::{SequenceField, validate},
};
use mesa_protocol::{
    ChainRecord, ChainSelection, Linkage, LinkedChains, ResidueNumber, ResidueSelection,
};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::{collections::BTreeMap, error::Error, fmt, path::Path};

pub type OpId = String;
pub type RunId = String;

/// Origin of a validation warning: a sequence field, per chain where it applies.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldKey {
    pub chain: Option<String>,
    pub field: SequenceField,
}

impl FieldKey {
    pub fn global(field: SequenceField) -> Self {
        Self { chain: None, field }
    }

    pub fn chain(chain: &str, field: SequenceField) -> Self {
        Self {
            chain: Some(chain.to_string()),
            field,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.chain {
            Some(chain) => write!(f, "{chain} {}", self.field),
            None => write!(f, "{}", self.field),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub structure_id: Option<String>,
    pub structure_text: Option<String>,
    pub chains: Vec<ChainRecord>,
    pub selection: ResidueSelection,
    pub linkage: Linkage,
    pub binder_linker: String,
    pub design: DesignConfiguration,
    #[serde_as(as = "Vec<(_, _)>")]
    pub warnings: BTreeMap<FieldKey, Vec<String>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            structure_id: None,
            structure_text: None,
            chains: vec![],
            selection: ResidueSelection::new(),
            linkage: Linkage::new(),
            binder_linker: DEFAULT_CHAIN_LINKER.clone(),
            design: DesignConfiguration::default(),
            warnings: BTreeMap::new(),
        }
    }
}

impl SessionState {
    pub fn load_from_path(path: &str) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path).map_err(|e| EngineError {
            code: ErrorCode::Io,
            message: format!("Could not read state file '{path}': {e}"),
        })?;
        serde_json::from_str(&text).map_err(|e| EngineError {
            code: ErrorCode::InvalidInput,
            message: format!("Could not parse state JSON '{path}': {e}"),
        })
    }

    pub fn save_to_path(&self, path: &str) -> Result<(), EngineError> {
        let text = serde_json::to_string_pretty(self).map_err(|e| EngineError {
            code: ErrorCode::Internal,
            message: format!("Could not serialize state: {e}"),
        })?;
        std::fs::write(path, text).map_err(|e| EngineError {
            code: ErrorCode::Io,
            message: format!("Could not write state file '{path}': {e}"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    LoadStructure {
        id: String,
        text: String,
    },
    LoadStructureFile {
        path: String,
        id: Option<String>,
    },
    SelectResidues {
        selection: ResidueSelection,
    },
    SelectResidueNumbers {
        chain_id: String,
        first: ResidueNumber,
        last: ResidueNumber,
    },
    SetLinkage {
        linkage: Linkage,
    },
    SetBinderLinker {
        linker: String,
    },
    SetChainLinker {
        chain: String,
        linker: String,
    },
    SetChainTmd {
        chain: String,
        tmd: PartChoice,
    },
    SetTransmembrane {
        enabled: bool,
    },
    SetSplitProtease {
        enabled: bool,
    },
    SetProteaseRelease {
        enabled: bool,
    },
    SetCargoRelease {
        enabled: bool,
    },
    SetFret {
        enabled: bool,
    },
    SetCustomIcd {
        sequence: Option<String>,
    },
    SetPart {
        slot: PartSlot,
        choice: Option<PartChoice>,
    },
    SetCargo {
        sequence: String,
    },
    SetProteaseRole {
        chain: String,
        role: Option<ProteaseRole>,
    },
    SetCargoChain {
        chain: String,
        enabled: bool,
    },
    SetAipChain {
        chain: String,
        enabled: bool,
    },
    SetTags {
        chain: String,
        tags: Vec<String>,
    },
    Reset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub run_id: RunId,
    pub ops: Vec<Operation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpResult {
    pub op_id: OpId,
    pub warnings: Vec<String>,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    pub run_id: RunId,
    pub op: Operation,
    pub result: OpResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidInput,
    InvalidSelection,
    NotFound,
    Unsupported,
    Io,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineError {
    pub code: ErrorCode,
    pub message: String,
}

impl EngineError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for EngineError {}

impl From<LinkError> for EngineError {
    fn from(err: LinkError) -> Self {
        EngineError::new(ErrorCode::InvalidSelection, err.to_string())
    }
}

impl From<MesaError> for EngineError {
    fn from(err: MesaError) -> Self {
        let code = match &err {
            MesaError::NotFound(_) => ErrorCode::NotFound,
            MesaError::InvalidInput(_) | MesaError::Json(_) | MesaError::Csv(_) => {
                ErrorCode::InvalidInput
            }
            MesaError::Io(_) => ErrorCode::Io,
            _ => ErrorCode::Internal,
        };
        EngineError::new(code, err.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    pub protocol_version: String,
    pub supported_operations: Vec<String>,
    pub supported_export_formats: Vec<String>,
    pub deterministic_operation_log: bool,
}

pub trait Engine {
    fn apply(&mut self, op: Operation) -> Result<OpResult, EngineError>;
    fn apply_workflow(&mut self, wf: Workflow) -> Result<Vec<OpResult>, EngineError>;
    fn snapshot(&self) -> &SessionState;
}

/// Session state plus the operation journal of this process.
///
/// Only `state` is persisted by `save_to_path`. A session rebuilt with
/// `from_state` starts a fresh journal at `op-1`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesignSession {
    state: SessionState,
    #[serde(skip)]
    library: SequenceLibrary,
    journal: Vec<OperationRecord>,
    op_counter: u64,
}

impl DesignSession {
    pub fn new(library: SequenceLibrary) -> Self {
        Self {
            library,
            ..Self::default()
        }
    }

    pub fn from_state(state: SessionState, library: SequenceLibrary) -> Self {
        Self {
            state,
            library,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn library(&self) -> &SequenceLibrary {
        &self.library
    }

    pub fn capabilities() -> Capabilities {
        Capabilities {
            protocol_version: "v1".to_string(),
            supported_operations: [
                "LoadStructure",
                "LoadStructureFile",
                "SelectResidues",
                "SelectResidueNumbers",
                "SetLinkage",
                "SetBinderLinker",
                "SetChainLinker",
                "SetChainTmd",
                "SetTransmembrane",
                "SetSplitProtease",
                "SetProteaseRelease",
                "SetCargoRelease",
                "SetFret",
                "SetCustomIcd",
                "SetPart",
                "SetCargo",
                "SetProteaseRole",
                "SetCargoChain",
                "SetAipChain",
                "SetTags",
                "Reset",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            supported_export_formats: vec!["Fasta".to_string(), "GenBank".to_string()],
            deterministic_operation_log: true,
        }
    }

    pub fn operation_log(&self) -> &[OperationRecord] {
        &self.journal
    }

    pub fn warnings(&self) -> &BTreeMap<FieldKey, Vec<String>> {
        &self.state.warnings
    }

    fn next_op_id(&mut self) -> OpId {
        self.op_counter += 1;
        format!("op-{}", self.op_counter)
    }

    fn derive_structure_id(path: &str) -> String {
        Path::new(path)
            .file_stem()
            .map(|s| s.to_string_lossy().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "STRUCTURE".to_string())
    }

    /// Fetches a structure and loads it like `LoadStructure`.
    pub fn fetch_structure(
        &mut self,
        source: &dyn StructureSource,
        id: &str,
    ) -> Result<OpResult, EngineError> {
        let text = source.fetch_structure(id).ok_or_else(|| {
            EngineError::new(
                ErrorCode::NotFound,
                format!("PDB ID '{id}' not found or could not be retrieved"),
            )
        })?;
        self.apply(Operation::LoadStructure {
            id: id.to_ascii_uppercase(),
            text,
        })
    }

    pub fn chain_selection(&self) -> ChainSelection {
        select(&self.state.chains, &self.state.selection)
    }

    /// FASTA of the selected residues, one record per selected chain.
    pub fn selection_fasta(&self) -> String {
        self.chain_selection()
            .iter()
            .filter_map(|(chain_id, sequence)| {
                let chain = self.state.chains.iter().find(|c| &c.chain_id == chain_id)?;
                Some(format!(">{}\n{sequence}\n", chain.fasta_name()))
            })
            .collect()
    }

    pub fn linked_chains(&self) -> Result<LinkedChains, EngineError> {
        Ok(link(
            &self.chain_selection(),
            &self.state.linkage,
            &self.state.binder_linker,
        )?)
    }

    /// Validated binders and design sequences run through the assembler.
    pub fn assemble(&self) -> Result<Assembly, EngineError> {
        Ok(assembler::assemble_validated(
            &self.linked_chains()?,
            &self.state.design,
            &self.library,
        ))
    }

    pub fn summary(&self, assembly: &Assembly) -> DesignSummary {
        let design = &self.state.design;
        let chains = self.linked_chains().unwrap_or_default();
        DesignSummary {
            structure_id: self.state.structure_id.clone(),
            binder_fasta: Some(self.selection_fasta()).filter(|f| !f.is_empty()),
            linkers: chains
                .keys()
                .map(|c| (c.clone(), design.chain_design(c).linker))
                .collect(),
            tmds: chains
                .keys()
                .map(|c| {
                    let (tmd, _) = design
                        .chain_design(c)
                        .tmd
                        .resolve(&self.library, PartCategory::Tmd);
                    (c.clone(), tmd)
                })
                .collect(),
            constructs: assembly
                .constructs
                .iter()
                .map(|c| (c.name.clone(), c.len()))
                .collect(),
        }
    }

    /// ZIP of the current assembly. `include_structure`/`include_summary` add the extras.
    pub fn export(
        &self,
        selection: Option<&[String]>,
        format: export::ExportFormat,
        include_structure: bool,
        include_summary: bool,
    ) -> Result<Vec<u8>, EngineError> {
        let assembly = self.assemble()?;
        let structure = match (&self.state.structure_id, &self.state.structure_text) {
            (Some(id), Some(text)) if include_structure => Some((id.clone(), text.clone())),
            _ => None,
        };
        let summary = match include_summary {
            true => Some(self.summary(&assembly).render()?),
            false => None,
        };
        let options = ExportOptions {
            format,
            structure,
            summary,
        };
        Ok(export::export_archive(&assembly.constructs, selection, &options)?)
    }

    fn record_validation(
        &mut self,
        key: FieldKey,
        field: SequenceField,
        raw: &str,
        result: &mut OpResult,
    ) -> String {
        let validated = validate(field, raw);
        let messages: Vec<String> = validated
            .warnings
            .iter()
            .map(|w| format!("{key}: {w}"))
            .collect();
        result.warnings.extend(messages.iter().cloned());
        if messages.is_empty() {
            self.state.warnings.remove(&key);
        } else {
            self.state.warnings.insert(key, messages);
        }
        validated.sequence
    }

    fn validate_choice(
        &mut self,
        key: FieldKey,
        field: SequenceField,
        choice: PartChoice,
        result: &mut OpResult,
    ) -> PartChoice {
        match choice {
            PartChoice::Custom { sequence } => PartChoice::Custom {
                sequence: self.record_validation(key, field, &sequence, result),
            },
            library => {
                self.state.warnings.remove(&key);
                library
            }
        }
    }

    fn require_chain_name(chain: &str) -> Result<(), EngineError> {
        if chain.trim().is_empty() {
            return Err(EngineError::new(
                ErrorCode::InvalidInput,
                "Output chain name must not be empty",
            ));
        }
        Ok(())
    }

    fn load_structure(
        &mut self,
        id: String,
        text: String,
        result: &mut OpResult,
    ) -> Result<(), EngineError> {
        let chains = extract_chains(&text);
        if chains.is_empty() {
            return Err(EngineError::new(
                ErrorCode::NotFound,
                format!("No chain data extracted for structure '{id}'"),
            ));
        }
        result.messages.push(format!(
            "Loaded structure '{id}' with chains {}",
            chains.iter().map(|c| c.chain_id.as_str()).collect::<Vec<_>>().join(", ")
        ));
        self.state.structure_id = Some(id);
        self.state.structure_text = Some(text);
        self.state.chains = chains;
        self.state.selection.clear();
        self.state.linkage.clear();
        Ok(())
    }

    fn apply_internal(&mut self, op: Operation) -> Result<OpResult, EngineError> {
        let mut result = OpResult {
            op_id: self.next_op_id(),
            ..OpResult::default()
        };

        match op {
            Operation::LoadStructure { id, text } => {
                self.load_structure(id, text, &mut result)?;
            }
            Operation::LoadStructureFile { path, id } => {
                let text = std::fs::read_to_string(&path).map_err(|e| {
                    EngineError::new(
                        ErrorCode::Io,
                        format!("Could not read structure file '{path}': {e}"),
                    )
                })?;
                let id = id.unwrap_or_else(|| Self::derive_structure_id(&path));
                self.load_structure(id, text, &mut result)?;
            }
            Operation::SelectResidues { selection } => {
                let invalid = invalid_windows(&self.state.chains, &selection);
                if !invalid.is_empty() {
                    let reasons: Vec<String> = invalid.into_iter().map(|(_, r)| r).collect();
                    return Err(EngineError::new(ErrorCode::InvalidSelection, reasons.join("; ")));
                }
                for chain_id in selection.keys() {
                    if !self.state.chains.iter().any(|c| &c.chain_id == chain_id) {
                        result
                            .warnings
                            .push(format!("Chain '{chain_id}' is not in the structure, skipped"));
                    }
                }
                result
                    .messages
                    .push(format!("Selected residues on {} chains", selection.len()));
                self.state.selection = selection;
            }
            Operation::SelectResidueNumbers {
                chain_id,
                first,
                last,
            } => {
                let chain = self
                    .state
                    .chains
                    .iter()
                    .find(|c| c.chain_id == chain_id)
                    .ok_or_else(|| {
                        EngineError::new(
                            ErrorCode::InvalidSelection,
                            format!("Chain '{chain_id}' is not in the structure"),
                        )
                    })?;
                let window = chain.window_for_residues(first, last).ok_or_else(|| {
                    EngineError::new(
                        ErrorCode::InvalidSelection,
                        format!(
                            "Residues {}..={} are outside chain {chain_id} ({}..={})",
                            first.0, last.0, chain.start, chain.end
                        ),
                    )
                })?;
                result.messages.push(format!(
                    "Selected residues {}..={} of chain {chain_id}",
                    first.0, last.0
                ));
                self.state.selection.insert(chain_id, window);
            }
            Operation::SetLinkage { linkage } => {
                let selected = self.chain_selection();
                link(&selected, &linkage, &self.state.binder_linker)?;
                for name in linkage.keys() {
                    Self::require_chain_name(name)?;
                }
                result
                    .messages
                    .push(format!("Linked {} output chains", linkage.len()));
                self.state.linkage = linkage;
            }
            Operation::SetBinderLinker { linker } => {
                let key = FieldKey::global(SequenceField::Linker);
                self.state.binder_linker =
                    self.record_validation(key, SequenceField::Linker, &linker, &mut result);
            }
            Operation::SetChainLinker { chain, linker } => {
                Self::require_chain_name(&chain)?;
                let key = FieldKey::chain(&chain, SequenceField::Linker);
                let linker =
                    self.record_validation(key, SequenceField::Linker, &linker, &mut result);
                self.state.design.set_chain_linker(&chain, &linker);
            }
            Operation::SetChainTmd { chain, tmd } => {
                Self::require_chain_name(&chain)?;
                if let PartChoice::Library { name } = &tmd {
                    if self.library.get(PartCategory::Tmd, name).is_none() {
                        return Err(EngineError::new(
                            ErrorCode::NotFound,
                            format!("Unknown TMD '{name}'"),
                        ));
                    }
                }
                let key = FieldKey::chain(&chain, SequenceField::Tmd);
                let tmd = self.validate_choice(key, SequenceField::Tmd, tmd, &mut result);
                self.state.design.set_chain_tmd(&chain, tmd);
            }
            Operation::SetTransmembrane { enabled } => {
                self.state.design.set_transmembrane(enabled)
            }
            Operation::SetSplitProtease { enabled } => {
                self.state.design.set_split_protease(enabled)
            }
            Operation::SetProteaseRelease { enabled } => {
                self.state.design.set_protease_release(enabled)
            }
            Operation::SetCargoRelease { enabled } => self.state.design.set_cargo_release(enabled),
            Operation::SetFret { enabled } => self.state.design.set_fret(enabled),
            Operation::SetCustomIcd { sequence } => {
                let key = FieldKey::global(SequenceField::CustomIcd);
                let sequence = match sequence {
                    Some(sequence) => Some(self.record_validation(
                        key,
                        SequenceField::CustomIcd,
                        &sequence,
                        &mut result,
                    )),
                    None => {
                        self.state.warnings.remove(&key);
                        None
                    }
                };
                self.state.design.set_custom_icd(sequence.as_deref());
            }
            Operation::SetPart { slot, choice } => {
                let field = match slot {
                    PartSlot::Prs => SequenceField::Prs,
                    PartSlot::Aip => SequenceField::Aip,
                    _ => SequenceField::Protease,
                };
                if let Some(PartChoice::Library { name }) = &choice {
                    if self.library.get(slot.category(), name).is_none() {
                        return Err(EngineError::new(
                            ErrorCode::NotFound,
                            format!("Unknown {} part '{name}'", slot.category()),
                        ));
                    }
                }
                let key = FieldKey::global(field);
                let choice = choice.map(|c| self.validate_choice(key, field, c, &mut result));
                self.state.design.set_part(slot, choice);
            }
            Operation::SetCargo { sequence } => {
                let key = FieldKey::global(SequenceField::Cargo);
                let sequence =
                    self.record_validation(key, SequenceField::Cargo, &sequence, &mut result);
                self.state.design.set_cargo(&sequence);
            }
            Operation::SetProteaseRole { chain, role } => {
                Self::require_chain_name(&chain)?;
                self.state.design.set_protease_role(&chain, role);
            }
            Operation::SetCargoChain { chain, enabled } => {
                Self::require_chain_name(&chain)?;
                self.state.design.set_cargo_chain(&chain, enabled);
            }
            Operation::SetAipChain { chain, enabled } => {
                Self::require_chain_name(&chain)?;
                self.state.design.set_aip_chain(&chain, enabled);
            }
            Operation::SetTags { chain, tags } => {
                Self::require_chain_name(&chain)?;
                if let Some(unknown) = tags
                    .iter()
                    .find(|t| self.library.get(PartCategory::Tag, t).is_none())
                {
                    return Err(EngineError::new(
                        ErrorCode::NotFound,
                        format!("Unknown tag '{unknown}'"),
                    ));
                }
                self.state.design.set_tags(&chain, tags);
            }
            Operation::Reset => {
                self.state = SessionState::default();
                result.messages.push("Design session reset".to_string());
            }
        }

        for warning in &result.warnings {
            log::warn!("{warning}");
        }
        Ok(result)
    }
}

impl Engine for DesignSession {
    fn apply(&mut self, op: Operation) -> Result<OpResult, EngineError> {
        let run_id = "interactive".to_string();
        let result = self.apply_internal(op.clone())?;
        self.journal.push(OperationRecord {
            run_id,
            op,
            result: result.clone(),
        });
        Ok(result)
    }

    fn apply_workflow(&mut self, wf: Workflow) -> Result<Vec<OpResult>, EngineError> {
        let mut results = Vec::new();
        for op in &wf.ops {
            let result = self.apply_internal(op.clone())?;
            self.journal.push(OperationRecord {
                run_id: wf.run_id.clone(),
                op: op.clone(),
                result: result.clone(),
            });
            results.push(result);
        }
        Ok(results)
    }

    fn snapshot(&self) -> &SessionState {
        &self.state
    }
}
