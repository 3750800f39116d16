use clap::{Parser, Subcommand};
use mesa::{
    about,
    antibody_search::AntibodyDatabase,
    config::DesignerConfig,
    engine::{DesignSession, Engine, Operation, SessionState, Workflow},
    export::{ARCHIVE_FILE_NAME, ExportFormat},
    rcsb::RcsbClient,
    sequence_library::SequenceLibrary,
    validation::{SequenceField, validate},
};
use serde::Serialize;
use std::fs;

const DEFAULT_STATE_PATH: &str = ".mesa_state.json";

#[derive(Parser)]
#[command(name = "mesa_cli")]
#[command(about = "MESA-Designer session command line", long_about = None)]
struct Cli {
    /// Session state file, created on first write
    #[arg(long, default_value = DEFAULT_STATE_PATH, env = "MESA_STATE")]
    state: String,

    /// JSON configuration file
    #[arg(short, long, env = "MESA_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and build
    Version,
    /// Supported operations and export formats
    Capabilities,
    /// Apply one operation (JSON, or @file.json). Operation ids count from
    /// op-1 in every invocation; the state file keeps no operation log.
    Op { json: String },
    /// Apply a workflow (JSON, or @file.json)
    Workflow { json: String },
    /// Download a structure from RCSB and load it
    Fetch { pdb_id: String },
    /// Structure, chains, selection and warnings of the session
    StateSummary,
    /// Print the assembled constructs as JSON
    Assemble,
    /// Write the construct archive
    Export {
        #[arg(short, long, default_value = ARCHIVE_FILE_NAME)]
        output: String,
        /// Export GenBank records instead of FASTA
        #[arg(long)]
        genbank: bool,
        /// Construct name to include, repeatable. All when omitted.
        #[arg(long = "construct")]
        constructs: Vec<String>,
        #[arg(long)]
        no_structure: bool,
        #[arg(long)]
        no_summary: bool,
    },
    /// Validate a sequence for a design field
    Validate { field: String, sequence: String },
    /// Antigen search over the configured SAbDab table
    Search { antigen: String },
}

#[derive(Serialize)]
struct ChainSummary {
    chain_id: String,
    length: usize,
    start: i64,
    end: i64,
}

#[derive(Serialize)]
struct StateSummary {
    structure_id: Option<String>,
    chains: Vec<ChainSummary>,
    selected: Vec<String>,
    output_chains: Vec<String>,
    warnings: Vec<String>,
}

fn load_json_arg(value: &str) -> Result<String, String> {
    if let Some(path) = value.strip_prefix('@') {
        fs::read_to_string(path).map_err(|e| format!("Could not read JSON file '{path}': {e}"))
    } else {
        Ok(value.to_string())
    }
}

fn load_state(path: &str) -> Result<SessionState, String> {
    if std::path::Path::new(path).exists() {
        SessionState::load_from_path(path).map_err(|e| e.to_string())
    } else {
        Ok(SessionState::default())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Could not serialize JSON output: {e}"))?;
    println!("{text}");
    Ok(())
}

fn summarize_state(session: &DesignSession) -> StateSummary {
    let state = session.state();
    StateSummary {
        structure_id: state.structure_id.clone(),
        chains: state
            .chains
            .iter()
            .map(|c| ChainSummary {
                chain_id: c.chain_id.clone(),
                length: c.len(),
                start: c.start,
                end: c.end,
            })
            .collect(),
        selected: state.selection.keys().cloned().collect(),
        output_chains: state.linkage.keys().cloned().collect(),
        warnings: state.warnings.values().flatten().cloned().collect(),
    }
}

fn field_from_name(name: &str) -> Result<SequenceField, String> {
    serde_json::from_value(serde_json::Value::String(name.to_ascii_lowercase()))
        .map_err(|_| format!("Unknown sequence field '{name}'"))
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let config = DesignerConfig::load(cli.config.as_deref()).map_err(|e| format!("{e:#}"))?;
    let library = SequenceLibrary::load(config.parts_library.as_deref());
    let state_path = cli.state.as_str();

    match cli.command {
        Commands::Version => {
            println!("{}", about::version_cli_text());
            Ok(())
        }
        Commands::Capabilities => print_json(&DesignSession::capabilities()),
        Commands::Op { json } => {
            let json = load_json_arg(&json)?;
            let op: Operation =
                serde_json::from_str(&json).map_err(|e| format!("Invalid operation JSON: {e}"))?;
            let mut session = DesignSession::from_state(load_state(state_path)?, library);
            let result = session.apply(op).map_err(|e| e.to_string())?;
            session
                .state()
                .save_to_path(state_path)
                .map_err(|e| e.to_string())?;
            print_json(&result)
        }
        Commands::Workflow { json } => {
            let json = load_json_arg(&json)?;
            let workflow: Workflow =
                serde_json::from_str(&json).map_err(|e| format!("Invalid workflow JSON: {e}"))?;
            let mut session = DesignSession::from_state(load_state(state_path)?, library);
            let results = session.apply_workflow(workflow).map_err(|e| e.to_string())?;
            session
                .state()
                .save_to_path(state_path)
                .map_err(|e| e.to_string())?;
            print_json(&results)
        }
        Commands::Fetch { pdb_id } => {
            let source = RcsbClient::new(&config.structure_url, &config.fasta_url);
            let mut session = DesignSession::from_state(load_state(state_path)?, library);
            let result = session
                .fetch_structure(&source, &pdb_id)
                .map_err(|e| e.to_string())?;
            session
                .state()
                .save_to_path(state_path)
                .map_err(|e| e.to_string())?;
            print_json(&result)
        }
        Commands::StateSummary => {
            let session = DesignSession::from_state(load_state(state_path)?, library);
            print_json(&summarize_state(&session))
        }
        Commands::Assemble => {
            let session = DesignSession::from_state(load_state(state_path)?, library);
            let assembly = session.assemble().map_err(|e| e.to_string())?;
            for warning in &assembly.warnings {
                eprintln!("warning: {warning}");
            }
            print_json(&assembly.constructs)
        }
        Commands::Export {
            output,
            genbank,
            constructs,
            no_structure,
            no_summary,
        } => {
            let session = DesignSession::from_state(load_state(state_path)?, library);
            let format = if genbank {
                ExportFormat::GenBank
            } else {
                ExportFormat::Fasta
            };
            let selection = (!constructs.is_empty()).then_some(constructs.as_slice());
            let bytes = session
                .export(selection, format, !no_structure, !no_summary)
                .map_err(|e| e.to_string())?;
            fs::write(&output, bytes)
                .map_err(|e| format!("Could not write archive '{output}': {e}"))?;
            println!("Wrote constructs from '{state_path}' to '{output}'");
            Ok(())
        }
        Commands::Validate { field, sequence } => {
            print_json(&validate(field_from_name(&field)?, &sequence))
        }
        Commands::Search { antigen } => {
            let path = config
                .sabdab_tsv
                .as_deref()
                .ok_or_else(|| "No SAbDab table configured (set sabdab_tsv)".to_string())?;
            let database = AntibodyDatabase::from_tsv_path(path).map_err(|e| e.to_string())?;
            let hits = database.search(&antigen).map_err(|e| e.to_string())?;
            print_json(&hits)
        }
    }
}
