//! FASTA, GenBank and ZIP output for assembled constructs.

use crate::{
    amino_acids::STOP,
    error::{MesaError, MesaResult},
};
use bio::io::fasta;
use gb_io::seq::{Feature, Location, Seq};
use mesa_protocol::Construct;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    io::{Cursor, Write},
    time::{SystemTime, UNIX_EPOCH},
};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

pub const SUMMARY_FILE_NAME: &str = "mesa_design_summary.txt";
pub const STRUCTURE_DIR: &str = "selected_pdb";
pub const ARCHIVE_FILE_NAME: &str = "mesa-design.zip";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    #[default]
    Fasta,
    GenBank,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Fasta => "fasta",
            ExportFormat::GenBank => "gb",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// `(structure id, PDB text)` stored under `selected_pdb/`.
    pub structure: Option<(String, String)>,
    pub summary: Option<String>,
}

/// Construct name made safe for file and record names.
pub fn sanitize_name(name: &str) -> String {
    name.trim()
        .trim_start_matches('>')
        .trim()
        .replace(':', "")
        .replace([' ', '-', '/'], "_")
}

/// Expressed residues, with `*` for a terminal stop.
pub fn construct_residues(construct: &Construct) -> String {
    let mut ret = construct.sequence();
    if construct.ends_with_stop() {
        ret.push(STOP);
    }
    ret
}

pub fn construct_fasta(construct: &Construct) -> MesaResult<String> {
    let mut buffer = vec![];
    {
        let mut writer = fasta::Writer::new(&mut buffer);
        writer.write(
            &sanitize_name(&construct.header),
            None,
            construct_residues(construct).as_bytes(),
        )?;
        writer.flush()?;
    }
    String::from_utf8(buffer).map_err(|e| MesaError::invalid(e.to_string()))
}

fn construct_seq(construct: &Construct) -> Seq {
    let residues = construct_residues(construct);
    let mut seq = Seq::empty();
    seq.name = Some(sanitize_name(&construct.name));
    seq.definition = Some(construct.header.trim_start_matches('>').trim().to_string());
    seq.molecule_type = Some("AA".to_string());
    seq.len = Some(residues.len());
    seq.seq = residues.into_bytes();
    seq.features = construct
        .feature_ranges()
        .into_iter()
        .map(|(range, annotation)| Feature {
            kind: "misc_feature".into(),
            location: Location::simple_range(range.start as i64, range.end as i64),
            qualifiers: vec![
                ("label".into(), Some(annotation.label.clone())),
                ("color".into(), Some(annotation.color.clone())),
            ],
        })
        .collect();
    seq
}

pub fn construct_genbank(construct: &Construct) -> MesaResult<String> {
    let mut buffer = vec![];
    gb_io::writer::write(&mut buffer, &construct_seq(construct))
        .map_err(|e| MesaError::GenBank(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| MesaError::GenBank(e.to_string()))
}

pub fn render(construct: &Construct, format: ExportFormat) -> MesaResult<String> {
    match format {
        ExportFormat::Fasta => construct_fasta(construct),
        ExportFormat::GenBank => construct_genbank(construct),
    }
}

/// Plain-text record of the design inputs stored next to the constructs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignSummary {
    pub structure_id: Option<String>,
    pub binder_fasta: Option<String>,
    pub linkers: BTreeMap<String, String>,
    pub tmds: BTreeMap<String, String>,
    pub constructs: Vec<(String, usize)>,
}

impl DesignSummary {
    pub fn render(&self) -> MesaResult<String> {
        let generated = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let mut ret = String::new();
        ret += "MESA Design Tool Output Summary\n";
        ret += "------------------------------\n";
        ret += &format!("Generated on (unix time): {generated}\n");
        ret += &format!(
            "Selected PDB: {}\n\n",
            self.structure_id.as_deref().unwrap_or("N/A")
        );
        ret += "Selected Binder FASTA:\n";
        ret += self.binder_fasta.as_deref().unwrap_or("N/A");
        ret += "\n\nLinker Information:\n";
        ret += &serde_json::to_string_pretty(&self.linkers)?;
        ret += "\n\nTMD Information:\n";
        ret += &serde_json::to_string_pretty(&self.tmds)?;
        ret += "\n\nConstructs:\n";
        for (name, len) in &self.constructs {
            ret += &format!("{name}\t{len} aa\n");
        }
        Ok(ret)
    }
}

/// ZIP archive of the selected constructs. `None` selects all of them.
pub fn export_archive(
    constructs: &[Construct],
    selection: Option<&[String]>,
    options: &ExportOptions,
) -> MesaResult<Vec<u8>> {
    if let Some(names) = selection {
        if let Some(unknown) = names.iter().find(|n| !constructs.iter().any(|c| &c.name == *n)) {
            return Err(MesaError::not_found(format!("No construct named '{unknown}'")));
        }
    }
    let file_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut count = 0;

    for construct in constructs {
        if selection.is_some_and(|names| !names.contains(&construct.name)) {
            continue;
        }
        let file_name = format!(
            "{}.{}",
            sanitize_name(&construct.name),
            options.format.extension()
        );
        zip.start_file(file_name, file_options)?;
        zip.write_all(render(construct, options.format)?.as_bytes())?;
        count += 1;
    }

    if let Some((id, text)) = &options.structure {
        zip.start_file(format!("{STRUCTURE_DIR}/{}.pdb", sanitize_name(id)), file_options)?;
        zip.write_all(text.as_bytes())?;
    }
    if let Some(summary) = &options.summary {
        zip.start_file(SUMMARY_FILE_NAME, file_options)?;
        zip.write_all(summary.as_bytes())?;
    }

    let ret = zip.finish()?.into_inner();
    log::info!("Exported {count} constructs ({} bytes)", ret.len());
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesa_protocol::Fragment;
    use std::io::Read;

    fn construct(name: &str) -> Construct {
        Construct::new(
            name,
            &format!("> {name}_CARGO"),
            vec![
                Fragment::separator("M"),
                Fragment::annotated("EVQL", "Binder", "#534cb3"),
                Fragment::annotated("GGGS", "Linker", "#eba814"),
                Fragment::Stop,
            ],
        )
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Chain A_N-Term Protease"), "Chain_A_N_Term_Protease");
        assert_eq!(sanitize_name("> 1ABC:H/x"), "1ABCH_x");
    }

    #[test]
    fn test_construct_fasta() {
        let fasta = construct_fasta(&construct("Chain A_Protease")).unwrap();
        assert_eq!(fasta, ">Chain_A_Protease_CARGO\nMEVQLGGGS*\n");
    }

    #[test]
    fn test_construct_genbank_features() {
        let text = construct_genbank(&construct("Chain A_Protease")).unwrap();
        assert!(text.starts_with("LOCUS"));
        assert!(text.contains("Chain_A_Protease"));
        assert!(text.contains("misc_feature"));
        assert!(text.contains("2..5"));
        assert!(text.contains("6..9"));
        assert!(text.contains("/label=\"Binder\""));
        assert!(text.contains("/color=\"#eba814\""));
    }

    #[test]
    fn test_export_archive_selection_and_extras() {
        let constructs = vec![construct("Chain A_Protease"), construct("Chain B_Cargo")];
        let options = ExportOptions {
            format: ExportFormat::Fasta,
            structure: Some(("7XYZ".to_string(), "ATOM".to_string())),
            summary: Some(
                DesignSummary {
                    structure_id: Some("7XYZ".to_string()),
                    ..DesignSummary::default()
                }
                .render()
                .unwrap(),
            ),
        };
        let selection = vec!["Chain B_Cargo".to_string()];
        let bytes = export_archive(&constructs, Some(&selection), &options).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["Chain_B_Cargo.fasta", SUMMARY_FILE_NAME, "selected_pdb/7XYZ.pdb"]
        );
        let mut text = String::new();
        archive
            .by_name(SUMMARY_FILE_NAME)
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert!(text.contains("Selected PDB: 7XYZ"));
    }

    #[test]
    fn test_export_archive_rejects_unknown_selection() {
        let constructs = vec![construct("Chain A_Protease")];
        let selection = vec!["Chain Z_Cargo".to_string()];
        let err = export_archive(&constructs, Some(&selection), &ExportOptions::default());
        assert!(matches!(err, Err(MesaError::NotFound(_))));
    }

    #[test]
    fn test_export_all_as_genbank() {
        let constructs = vec![construct("Chain A_Protease"), construct("Chain B_Cargo")];
        let options = ExportOptions {
            format: ExportFormat::GenBank,
            ..ExportOptions::default()
        };
        let bytes = export_archive(&constructs, None, &options).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
    }
}
