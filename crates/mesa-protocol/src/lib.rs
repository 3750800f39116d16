//! Shared machine-readable MESA-Designer contracts.
//!
//! These types travel between the structure extractor, the assembly core, the
//! export sink and the HTTP/CLI surfaces. They carry no behavior beyond
//! slicing arithmetic and concatenation helpers.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, ops::Range};

pub type ChainId = String;
pub type OutputChainName = String;

/// Chain id -> sequence-local window.
pub type ResidueSelection = BTreeMap<ChainId, SequenceWindow>;
/// Chain id -> sliced sub-sequence.
pub type ChainSelection = BTreeMap<ChainId, String>;
/// Output chain name ("Chain A") -> ordered chain ids to concatenate.
pub type Linkage = BTreeMap<OutputChainName, Vec<ChainId>>;
/// Output chain name -> concatenated binder sequence.
pub type LinkedChains = BTreeMap<OutputChainName, String>;

/// Residue numbering as written in the source structure (inclusive, may be negative).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResidueNumber(pub i64);

/// Half-open `[start, end)` window, 0-indexed into a chain's sequence string.
///
/// Serialized as a two-element array so `{"A": [0, 200]}` is a valid selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct SequenceWindow {
    pub start: usize,
    pub end: usize,
}

impl SequenceWindow {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn whole(len: usize) -> Self {
        Self { start: 0, end: len }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the window is ordered and lies inside a sequence of `len` residues.
    pub fn fits(&self, len: usize) -> bool {
        self.start <= self.end && self.end <= len
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<(usize, usize)> for SequenceWindow {
    fn from((start, end): (usize, usize)) -> Self {
        Self { start, end }
    }
}

impl From<SequenceWindow> for (usize, usize) {
    fn from(window: SequenceWindow) -> Self {
        (window.start, window.end)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainRecord {
    /// Source record id, `"{IDCODE}:{chain}"`.
    pub id: String,
    pub chain_id: ChainId,
    pub sequence: String,
    pub start: i64,
    pub end: i64,
    /// Source residue number of every sequence position, when known.
    /// Insertion codes make this non-linear.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub residue_numbers: Vec<i64>,
}

impl ChainRecord {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn fasta_name(&self) -> String {
        self.id
            .replace(':', "_")
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect()
    }

    /// Converts an inclusive source-numbering range into a sequence-local window.
    pub fn window_for_residues(
        &self,
        first: ResidueNumber,
        last: ResidueNumber,
    ) -> Option<SequenceWindow> {
        if first > last || first.0 < self.start || last.0 > self.end {
            return None;
        }
        if !self.residue_numbers.is_empty() {
            let start = self.residue_numbers.iter().position(|n| *n == first.0)?;
            let last_idx = self.residue_numbers.iter().rposition(|n| *n == last.0)?;
            return (start <= last_idx).then(|| SequenceWindow::new(start, last_idx + 1));
        }
        let start = usize::try_from(first.0 - self.start).ok()?;
        let end = usize::try_from(last.0 - self.start + 1).ok()?;
        let window = SequenceWindow::new(start, end);
        window.fits(self.len()).then_some(window)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedFragment {
    pub sequence: String,
    pub label: String,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fragment {
    /// Inserted verbatim, may be empty.
    Separator { sequence: String },
    Annotated(AnnotatedFragment),
    /// Terminal stop. Adds no residue to the expressed sequence.
    Stop,
}

impl Fragment {
    pub fn separator(sequence: &str) -> Self {
        Fragment::Separator {
            sequence: sequence.to_string(),
        }
    }

    pub fn annotated(sequence: &str, label: &str, color: &str) -> Self {
        Fragment::Annotated(AnnotatedFragment {
            sequence: sequence.to_string(),
            label: label.to_string(),
            color: color.to_string(),
        })
    }

    pub fn sequence(&self) -> &str {
        match self {
            Fragment::Separator { sequence } => sequence,
            Fragment::Annotated(fragment) => &fragment.sequence,
            Fragment::Stop => "",
        }
    }

    pub fn annotation(&self) -> Option<&AnnotatedFragment> {
        match self {
            Fragment::Annotated(fragment) => Some(fragment),
            _ => None,
        }
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, Fragment::Stop)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Construct {
    pub name: String,
    pub header: String,
    pub fragments: Vec<Fragment>,
}

impl Construct {
    pub fn new(name: &str, header: &str, fragments: Vec<Fragment>) -> Self {
        Self {
            name: name.to_string(),
            header: header.to_string(),
            fragments,
        }
    }

    /// The expressed amino-acid sequence: all fragment sequences in order.
    pub fn sequence(&self) -> String {
        self.fragments.iter().map(Fragment::sequence).collect()
    }

    pub fn len(&self) -> usize {
        self.fragments.iter().map(|f| f.sequence().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ends_with_stop(&self) -> bool {
        self.fragments.last().is_some_and(Fragment::is_stop)
    }

    /// Last annotated fragment that contributes residues.
    pub fn last_annotation(&self) -> Option<&AnnotatedFragment> {
        self.fragments
            .iter()
            .rev()
            .filter_map(Fragment::annotation)
            .find(|a| !a.sequence.is_empty())
    }

    /// Non-empty annotated fragments with their residue ranges in `sequence()`.
    pub fn feature_ranges(&self) -> Vec<(Range<usize>, &AnnotatedFragment)> {
        let mut offset = 0;
        let mut ret = vec![];
        for fragment in &self.fragments {
            let len = fragment.sequence().len();
            if let Some(annotation) = fragment.annotation() {
                if len > 0 {
                    ret.push((offset..offset + len, annotation));
                }
            }
            offset += len;
        }
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ChainRecord {
        ChainRecord {
            id: "1ABC:H".to_string(),
            chain_id: "H".to_string(),
            sequence: "EVQLVESGGG".to_string(),
            start: 5,
            end: 14,
            residue_numbers: vec![],
        }
    }

    #[test]
    fn test_window_serializes_as_pair() {
        let mut selection = ResidueSelection::new();
        selection.insert("A".to_string(), SequenceWindow::new(0, 200));
        let json = serde_json::to_string(&selection).unwrap();
        assert_eq!(json, r#"{"A":[0,200]}"#);
        let back: ResidueSelection = serde_json::from_str(r#"{"C":[45,87]}"#).unwrap();
        assert_eq!(back["C"], SequenceWindow::new(45, 87));
    }

    #[test]
    fn test_window_for_residues_uses_source_start() {
        let chain = record();
        assert_eq!(
            chain.window_for_residues(ResidueNumber(5), ResidueNumber(7)),
            Some(SequenceWindow::new(0, 3))
        );
        assert_eq!(
            chain.window_for_residues(ResidueNumber(14), ResidueNumber(14)),
            Some(SequenceWindow::new(9, 10))
        );
        assert!(chain.window_for_residues(ResidueNumber(4), ResidueNumber(7)).is_none());
        assert!(chain.window_for_residues(ResidueNumber(9), ResidueNumber(8)).is_none());
    }

    #[test]
    fn test_window_for_residues_follows_insertion_codes() {
        let mut chain = record();
        chain.sequence = "ABCDE".to_string();
        chain.start = 81;
        chain.end = 83;
        // 81, 82, 82A, 82B, 83
        chain.residue_numbers = vec![81, 82, 82, 82, 83];
        assert_eq!(
            chain.window_for_residues(ResidueNumber(82), ResidueNumber(83)),
            Some(SequenceWindow::new(1, 5))
        );
        assert_eq!(
            chain.window_for_residues(ResidueNumber(81), ResidueNumber(82)),
            Some(SequenceWindow::new(0, 4))
        );
    }

    #[test]
    fn test_fasta_name_strips_punctuation() {
        assert_eq!(record().fasta_name(), "1ABCH");
    }

    #[test]
    fn test_construct_sequence_ignores_stop_and_labels() {
        let construct = Construct::new(
            "Chain A_Protease",
            "> Chain A_Protease",
            vec![
                Fragment::separator("M"),
                Fragment::annotated("EVQL", "Binder", "#534cb3"),
                Fragment::separator(""),
                Fragment::annotated("GGGS", "Linker", "#eba814"),
                Fragment::Stop,
            ],
        );
        assert_eq!(construct.sequence(), "MEVQLGGGS");
        assert_eq!(construct.len(), 9);
        assert!(construct.ends_with_stop());
        assert_eq!(construct.last_annotation().unwrap().label, "Linker");
        let ranges: Vec<_> = construct
            .feature_ranges()
            .into_iter()
            .map(|(r, a)| (r, a.label.clone()))
            .collect();
        assert_eq!(
            ranges,
            vec![(1..5, "Binder".to_string()), (5..9, "Linker".to_string())]
        );
    }

    #[test]
    fn test_fragment_json_shape() {
        let json = serde_json::to_value(Fragment::Stop).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "stop"}));
        let annotated: Fragment = serde_json::from_value(serde_json::json!({
            "kind": "annotated", "sequence": "DYKDDDDK", "label": "FLAG Tag", "color": "#26B771FF"
        }))
        .unwrap();
        assert_eq!(annotated.sequence(), "DYKDDDDK");
    }
}
