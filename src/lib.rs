use amino_acids::AminoAcids;
use lazy_static::lazy_static;

pub use mesa_protocol;

pub mod about;
pub mod amino_acids;
pub mod antibody_search;
pub mod api;
pub mod assembler;
pub mod attach;
pub mod chain_extractor;
pub mod chain_linker;
pub mod config;
pub mod design;
pub mod engine;
pub mod error;
pub mod export;
pub mod rcsb;
pub mod residue_selector;
pub mod sequence_library;
pub mod validation;

lazy_static! {
    // Amino acids
    pub static ref AMINO_ACIDS: AminoAcids = AminoAcids::default();
}
