//! HTTP surface. Every route delegates to a synchronous function here so the
//! request semantics are testable without a server.

use crate::{
    antibody_search::{AntibodyDatabase, AntibodyEntry},
    assembler,
    attach::{self, SequenceMap, SplitProtease},
    chain_extractor::extract_chains,
    chain_linker::LinkError,
    config::DesignerConfig,
    design::{
        DEFAULT_C_PROTEASE, DEFAULT_COMPLETE_PROTEASE, DEFAULT_N_PROTEASE, DEFAULT_PRS,
        DesignConfiguration,
    },
    engine::{EngineError, ErrorCode},
    error::MesaError,
    export::{self, ARCHIVE_FILE_NAME, ExportFormat, ExportOptions},
    rcsb::{RcsbClient, StructureSource},
    residue_selector::select,
    sequence_library::{
        CD4_SIGNAL_PEPTIDE, FRET_MCERULEAN, FRET_MVENUS, PartCategory, SequenceLibrary,
    },
    validation::{SequenceField, ValidatedSequence, validate},
};
use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use mesa_protocol::{
    ChainRecord, ChainSelection, Construct, Linkage, LinkedChains, ResidueSelection,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

pub const SOURCES: [&str; 2] = [
    "https://academic.oup.com/synbio/article/5/1/ysaa017/5913400",
    "https://pubs.acs.org/doi/10.1021/sb400128g",
];
const SPELL_TOOL_URL: &str = "https://dokhlab.med.psu.edu/spell/login.php";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MesaError> for ApiError {
    fn from(err: MesaError) -> Self {
        match err {
            MesaError::NotFound(message) => ApiError::NotFound(message),
            MesaError::InvalidInput(message) => ApiError::BadRequest(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err.code {
            ErrorCode::NotFound => ApiError::NotFound(err.message),
            ErrorCode::InvalidInput | ErrorCode::InvalidSelection => {
                ApiError::BadRequest(err.message)
            }
            _ => ApiError::Internal(err.message),
        }
    }
}

impl From<LinkError> for ApiError {
    fn from(err: LinkError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{self}");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub antigen: String,
    pub pdb_ids: Vec<String>,
    pub sabdab_data: Vec<AntibodyEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainsResponse {
    pub pdb_id: String,
    pub chains: Vec<ChainRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentResponse {
    pub pdb_id: String,
    pub pdb_content: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionRequest {
    pub selection: ResidueSelection,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainSelectionResponse {
    pub pdb_id: String,
    pub chain_selection: ChainSelection,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkRequest {
    pub selection: ResidueSelection,
    pub linkage: Linkage,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LinkerQuery {
    pub linker: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkedChainsResponse {
    pub pdb_id: String,
    pub chain_selection: ChainSelection,
    pub linkage_data: Linkage,
    pub linker: String,
    pub mesa_chains: LinkedChains,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TmdQuery {
    pub tmd: String,
    pub sequence: String,
    pub linker: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TmdResponse {
    pub cd4: String,
    pub tmd: String,
    pub tmd_sequence: String,
    pub linker: String,
    pub combined_sequence: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SplitRequest {
    pub sequences: SequenceMap,
    pub protease_splits: Option<SplitProtease>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitResponse {
    pub protease_splits: SplitProtease,
    pub n_sequence: String,
    pub c_sequence: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProteaseRequest {
    pub sequence: String,
    pub protease_sequence: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProteaseResponse {
    pub protease_sequence: String,
    pub combined_sequence: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PrsRequest {
    pub sequences: SequenceMap,
    pub prs_sequence: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrsResponse {
    pub prs: String,
    pub sequences: SequenceMap,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CargoRequest {
    pub sequences: SequenceMap,
    pub cargo: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CargoResponse {
    pub cargo: String,
    pub sequences: SequenceMap,
}

/// `tag` names a library tag.
#[derive(Clone, Debug, Deserialize)]
pub struct TagRequest {
    pub sequences: SequenceMap,
    pub tag: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TagResponse {
    pub tag: String,
    pub tag_sequence: String,
    pub sequences: SequenceMap,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequencesBody {
    pub sequences: SequenceMap,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ValidateRequest {
    pub field: SequenceField,
    pub sequence: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DesignRequest {
    pub chains: LinkedChains,
    #[serde(default)]
    pub design: DesignConfiguration,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssembleResponse {
    pub constructs: Vec<Construct>,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ExportRequest {
    pub chains: LinkedChains,
    #[serde(default)]
    pub design: DesignConfiguration,
    /// Construct names to include. All when absent.
    pub selection: Option<Vec<String>>,
    #[serde(default)]
    pub format: ExportFormat,
}

pub fn welcome() -> Value {
    json!({ "message": "Welcome to the MESA-Designer API!" })
}

pub fn search_antigen(
    database: Option<&AntibodyDatabase>,
    antigen: &str,
) -> ApiResult<SearchResponse> {
    let database = database
        .ok_or_else(|| ApiError::Internal("No antibody database is configured.".to_string()))?;
    let hits = database.search(antigen)?;
    if hits.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No antibodies found for antigen: {antigen}"
        )));
    }
    Ok(SearchResponse {
        antigen: antigen.to_string(),
        pdb_ids: AntibodyDatabase::pdb_ids(&hits)
            .into_iter()
            .map(str::to_string)
            .collect(),
        sabdab_data: hits.into_iter().cloned().collect(),
    })
}

fn structure_text(source: &dyn StructureSource, pdb_id: &str) -> ApiResult<String> {
    source.fetch_structure(pdb_id).ok_or_else(|| {
        ApiError::NotFound(format!(
            "PDB ID '{pdb_id}' not found or could not be retrieved from RCSB."
        ))
    })
}

fn structure_chains(source: &dyn StructureSource, pdb_id: &str) -> ApiResult<Vec<ChainRecord>> {
    let chains = extract_chains(&structure_text(source, pdb_id)?);
    if chains.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No chain data extracted for PDB ID '{pdb_id}'."
        )));
    }
    Ok(chains)
}

fn selected_chains(
    chains: &[ChainRecord],
    selection: &ResidueSelection,
) -> ApiResult<ChainSelection> {
    let ret = select(chains, selection);
    if ret.is_empty() {
        return Err(ApiError::BadRequest(
            "Could not select chains from pdb with the given selection data. Ensure valid chain IDs and residue numbers."
                .to_string(),
        ));
    }
    Ok(ret)
}

pub fn pdb_chains(source: &dyn StructureSource, pdb_id: &str) -> ApiResult<ChainsResponse> {
    Ok(ChainsResponse {
        pdb_id: pdb_id.to_string(),
        chains: structure_chains(source, pdb_id)?,
    })
}

pub fn pdb_structure(source: &dyn StructureSource, pdb_id: &str) -> ApiResult<ContentResponse> {
    Ok(ContentResponse {
        pdb_id: pdb_id.to_string(),
        pdb_content: structure_text(source, pdb_id)?,
    })
}

pub fn pdb_fasta(source: &dyn StructureSource, pdb_id: &str) -> ApiResult<ContentResponse> {
    let pdb_content = source.fetch_fasta(pdb_id).ok_or_else(|| {
        ApiError::NotFound(format!(
            "PDB ID '{pdb_id}' not found or could not be retrieved from RCSB."
        ))
    })?;
    Ok(ContentResponse {
        pdb_id: pdb_id.to_string(),
        pdb_content,
    })
}

pub fn chain_selection(
    source: &dyn StructureSource,
    pdb_id: &str,
    request: &SelectionRequest,
) -> ApiResult<ChainSelectionResponse> {
    let chains = structure_chains(source, pdb_id)?;
    Ok(ChainSelectionResponse {
        pdb_id: pdb_id.to_string(),
        chain_selection: selected_chains(&chains, &request.selection)?,
    })
}

pub fn linked_chains(
    source: &dyn StructureSource,
    pdb_id: &str,
    request: &LinkRequest,
    linker: &str,
) -> ApiResult<LinkedChainsResponse> {
    let chains = structure_chains(source, pdb_id)?;
    let chain_selection = selected_chains(&chains, &request.selection)?;
    let mesa_chains = crate::chain_linker::link(&chain_selection, &request.linkage, linker)?;
    Ok(LinkedChainsResponse {
        pdb_id: pdb_id.to_string(),
        chain_selection,
        linkage_data: request.linkage.clone(),
        linker: linker.to_string(),
        mesa_chains,
    })
}

pub fn tmd_overview(library: &SequenceLibrary) -> Value {
    json!({
        "tmd_data": library.overview(PartCategory::Tmd),
        "sources": SOURCES,
    })
}

fn library_sequence(
    library: &SequenceLibrary,
    category: PartCategory,
    name: &str,
) -> ApiResult<String> {
    library
        .sequence(category, name)
        .map(str::to_string)
        .ok_or_else(|| ApiError::Internal(format!("Parts library has no {category} part '{name}'")))
}

pub fn tmd_attach(
    library: &SequenceLibrary,
    query: &TmdQuery,
    default_linker: &str,
) -> ApiResult<TmdResponse> {
    let tmd = library.get(PartCategory::Tmd, &query.tmd).ok_or_else(|| {
        ApiError::BadRequest(
            "Invalid TMD provided. You can get an overview of available options at /tmd/overview"
                .to_string(),
        )
    })?;
    let cd4 = library_sequence(library, PartCategory::SignalPeptide, CD4_SIGNAL_PEPTIDE)?;
    let linker = query.linker.as_deref().unwrap_or(default_linker).to_ascii_uppercase();
    Ok(TmdResponse {
        combined_sequence: attach::attach_tmd(&cd4, &query.sequence, &linker, &tmd.sequence)?,
        cd4,
        tmd: tmd.name.to_ascii_uppercase(),
        tmd_sequence: tmd.sequence.clone(),
        linker,
    })
}

pub fn protease_overview(library: &SequenceLibrary) -> Value {
    json!({
        "separate_chains": {
            "description": "One MESA chain carries the complete protease, the other chain carries the cargo.",
            "TEVp_sequences": library.overview(PartCategory::Protease),
        },
        "split_protease": {
            "description": "The protease is split and its halves are attached to separate chains. They reconstitute upon binder dimerization.",
            "NTEVp_sequences": library.overview(PartCategory::NProtease),
            "CTEVp_sequences": library.overview(PartCategory::CProtease),
            "spell_tool": {
                "description": "Guides the splitting of proteins and enzymes.",
                "link": SPELL_TOOL_URL,
            },
        },
        "sources": SOURCES,
        "common": {
            "prs": {
                "name": "protease recognition sequence",
                "description": "Cleaved by the protease (split or whole) upon dimerization.",
                "prs_sequences": library.overview(PartCategory::Prs),
            },
            "aip": {
                "name": "auto-inhibitory peptide",
                "description": "Reversibly blocks the protease active site to reduce background signaling.",
                "aip_sequences": library.overview(PartCategory::Aip),
            },
        },
    })
}

pub fn split_tev_protease(library: &SequenceLibrary) -> Value {
    json!({
        "ntevp": library.overview(PartCategory::NProtease),
        "ctevp": library.overview(PartCategory::CProtease),
    })
}

pub fn attach_split(library: &SequenceLibrary, request: &SplitRequest) -> ApiResult<SplitResponse> {
    let protease_splits = match &request.protease_splits {
        Some(splits) => splits.clone(),
        None => SplitProtease {
            n: library_sequence(library, PartCategory::NProtease, DEFAULT_N_PROTEASE)?,
            c: library_sequence(library, PartCategory::CProtease, DEFAULT_C_PROTEASE)?,
        },
    };
    let joined = attach::attach_split_protease(&request.sequences, &protease_splits)?;
    Ok(SplitResponse {
        protease_splits,
        n_sequence: joined.n,
        c_sequence: joined.c,
    })
}

pub fn attach_protease(
    library: &SequenceLibrary,
    request: &ProteaseRequest,
) -> ApiResult<ProteaseResponse> {
    let protease_sequence = match &request.protease_sequence {
        Some(sequence) => sequence.clone(),
        None => library_sequence(library, PartCategory::Protease, DEFAULT_COMPLETE_PROTEASE)?,
    };
    Ok(ProteaseResponse {
        combined_sequence: attach::attach_protease(&request.sequence, &protease_sequence)?,
        protease_sequence,
    })
}

pub fn attach_prs(library: &SequenceLibrary, request: &PrsRequest) -> ApiResult<PrsResponse> {
    let prs = match &request.prs_sequence {
        Some(sequence) => sequence.clone(),
        None => library_sequence(library, PartCategory::Prs, DEFAULT_PRS)?,
    };
    Ok(PrsResponse {
        sequences: attach::attach_prs(&request.sequences, &prs)?,
        prs,
    })
}

pub fn attach_cargo(request: &CargoRequest) -> ApiResult<CargoResponse> {
    Ok(CargoResponse {
        sequences: attach::attach_cargo(&request.sequences, &request.cargo)?,
        cargo: request.cargo.clone(),
    })
}

pub fn attach_tag(library: &SequenceLibrary, request: &TagRequest) -> ApiResult<TagResponse> {
    let tag = library
        .get(PartCategory::Tag, &request.tag)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown tag '{}'", request.tag)))?;
    Ok(TagResponse {
        sequences: attach::attach_tag(&request.sequences, &tag.sequence)?,
        tag: tag.name.clone(),
        tag_sequence: tag.sequence.clone(),
    })
}

pub fn fret_sequences(
    library: &SequenceLibrary,
    request: &SequencesBody,
) -> ApiResult<SequencesBody> {
    let mvenus = library_sequence(library, PartCategory::Fret, FRET_MVENUS)?;
    let mcerulean = library_sequence(library, PartCategory::Fret, FRET_MCERULEAN)?;
    Ok(SequencesBody {
        sequences: attach::fret_sequences(&request.sequences, &mvenus, &mcerulean)?,
    })
}

pub fn validate_sequence(request: &ValidateRequest) -> ValidatedSequence {
    validate(request.field, &request.sequence)
}

pub fn assemble_design(library: &SequenceLibrary, request: &DesignRequest) -> AssembleResponse {
    let assembly = assembler::assemble_validated(&request.chains, &request.design, library);
    AssembleResponse {
        constructs: assembly.constructs,
        warnings: assembly.warnings,
    }
}

pub fn export_design(library: &SequenceLibrary, request: &ExportRequest) -> ApiResult<Vec<u8>> {
    let assembly = assembler::assemble_validated(&request.chains, &request.design, library);
    let options = ExportOptions {
        format: request.format,
        ..ExportOptions::default()
    };
    Ok(export::export_archive(
        &assembly.constructs,
        request.selection.as_deref(),
        &options,
    )?)
}

pub struct AppState {
    pub source: Box<dyn StructureSource + Send + Sync>,
    pub library: SequenceLibrary,
    pub antibodies: Option<AntibodyDatabase>,
    pub config: DesignerConfig,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn from_config(config: DesignerConfig) -> anyhow::Result<Self> {
        let antibodies = match &config.sabdab_tsv {
            Some(path) => Some(
                AntibodyDatabase::from_tsv_path(path)
                    .with_context(|| format!("Could not load antibody database '{path}'"))?,
            ),
            None => None,
        };
        Ok(Self {
            source: Box::new(RcsbClient::new(&config.structure_url, &config.fasta_url)),
            library: SequenceLibrary::load(config.parts_library.as_deref()),
            antibodies,
            config,
        })
    }
}

async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ApiResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("Request worker failed: {e}")))?
}

#[derive(Deserialize)]
struct AntigenQuery {
    antigen: String,
}

async fn root_handler() -> Json<Value> {
    Json(welcome())
}

async fn search_handler(
    State(state): State<SharedState>,
    Query(query): Query<AntigenQuery>,
) -> ApiResult<Json<SearchResponse>> {
    search_antigen(state.antibodies.as_ref(), &query.antigen).map(Json)
}

async fn chains_handler(
    State(state): State<SharedState>,
    Path(pdb_id): Path<String>,
) -> ApiResult<Json<ChainsResponse>> {
    blocking(move || pdb_chains(state.source.as_ref(), &pdb_id))
        .await
        .map(Json)
}

async fn structure_handler(
    State(state): State<SharedState>,
    Path(pdb_id): Path<String>,
) -> ApiResult<Json<ContentResponse>> {
    blocking(move || pdb_structure(state.source.as_ref(), &pdb_id))
        .await
        .map(Json)
}

async fn fasta_handler(
    State(state): State<SharedState>,
    Path(pdb_id): Path<String>,
) -> ApiResult<Json<ContentResponse>> {
    blocking(move || pdb_fasta(state.source.as_ref(), &pdb_id))
        .await
        .map(Json)
}

async fn selection_handler(
    State(state): State<SharedState>,
    Path(pdb_id): Path<String>,
    Json(request): Json<SelectionRequest>,
) -> ApiResult<Json<ChainSelectionResponse>> {
    blocking(move || chain_selection(state.source.as_ref(), &pdb_id, &request))
        .await
        .map(Json)
}

async fn link_handler(
    State(state): State<SharedState>,
    Path(pdb_id): Path<String>,
    Query(query): Query<LinkerQuery>,
    Json(request): Json<LinkRequest>,
) -> ApiResult<Json<LinkedChainsResponse>> {
    blocking(move || {
        let linker = query
            .linker
            .unwrap_or_else(|| state.config.chain_linker.clone());
        linked_chains(state.source.as_ref(), &pdb_id, &request, &linker)
    })
    .await
    .map(Json)
}

async fn tmd_overview_handler(State(state): State<SharedState>) -> Json<Value> {
    Json(tmd_overview(&state.library))
}

async fn tmd_attach_handler(
    State(state): State<SharedState>,
    Query(query): Query<TmdQuery>,
) -> ApiResult<Json<TmdResponse>> {
    tmd_attach(&state.library, &query, &state.config.tmd_linker).map(Json)
}

async fn protease_overview_handler(State(state): State<SharedState>) -> Json<Value> {
    Json(protease_overview(&state.library))
}

async fn split_tev_handler(State(state): State<SharedState>) -> Json<Value> {
    Json(split_tev_protease(&state.library))
}

async fn attach_split_handler(
    State(state): State<SharedState>,
    Json(request): Json<SplitRequest>,
) -> ApiResult<Json<SplitResponse>> {
    attach_split(&state.library, &request).map(Json)
}

async fn attach_protease_handler(
    State(state): State<SharedState>,
    Json(request): Json<ProteaseRequest>,
) -> ApiResult<Json<ProteaseResponse>> {
    attach_protease(&state.library, &request).map(Json)
}

async fn attach_prs_handler(
    State(state): State<SharedState>,
    Json(request): Json<PrsRequest>,
) -> ApiResult<Json<PrsResponse>> {
    attach_prs(&state.library, &request).map(Json)
}

async fn attach_cargo_handler(Json(request): Json<CargoRequest>) -> ApiResult<Json<CargoResponse>> {
    attach_cargo(&request).map(Json)
}

async fn attach_tag_handler(
    State(state): State<SharedState>,
    Json(request): Json<TagRequest>,
) -> ApiResult<Json<TagResponse>> {
    attach_tag(&state.library, &request).map(Json)
}

async fn fret_handler(
    State(state): State<SharedState>,
    Json(request): Json<SequencesBody>,
) -> ApiResult<Json<SequencesBody>> {
    fret_sequences(&state.library, &request).map(Json)
}

async fn validate_handler(Json(request): Json<ValidateRequest>) -> Json<ValidatedSequence> {
    Json(validate_sequence(&request))
}

async fn assemble_handler(
    State(state): State<SharedState>,
    Json(request): Json<DesignRequest>,
) -> Json<AssembleResponse> {
    Json(assemble_design(&state.library, &request))
}

async fn export_handler(
    State(state): State<SharedState>,
    Json(request): Json<ExportRequest>,
) -> ApiResult<impl IntoResponse> {
    let bytes = export_design(&state.library, &request)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{ARCHIVE_FILE_NAME}\""),
            ),
        ],
        bytes,
    ))
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/search_antigen", get(search_handler))
        .route("/pdb/:pdb_id/chains", get(chains_handler))
        .route("/pdb/:pdb_id/structure", get(structure_handler))
        .route("/pdb/:pdb_id/fasta", get(fasta_handler))
        .route("/pdb/:pdb_id/generate_chain_selection", post(selection_handler))
        .route("/pdb/:pdb_id/generate_linked_chains", post(link_handler))
        .route("/tmd/overview", get(tmd_overview_handler))
        .route("/tmd/attach", post(tmd_attach_handler))
        .route("/protease/overview", get(protease_overview_handler))
        .route("/protease/split_tev_protease", get(split_tev_handler))
        .route("/protease/attach_split", post(attach_split_handler))
        .route("/protease/attach_protease", post(attach_protease_handler))
        .route("/protease/attach_prs", post(attach_prs_handler))
        .route("/cargo/attach_cargo", post(attach_cargo_handler))
        .route("/extra/attach_tag", post(attach_tag_handler))
        .route("/extra/fret_sequences", post(fret_handler))
        .route("/sequence/validate", post(validate_handler))
        .route("/design/assemble", post(assemble_handler))
        .route("/design/export", post(export_handler))
        .with_state(state)
}

pub async fn serve(config: DesignerConfig) -> anyhow::Result<()> {
    let address = config.bind_address.clone();
    let state = Arc::new(AppState::from_config(config)?);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Could not bind {address}"))?;
    log::info!("MESA-Designer API listening on http://{address}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
