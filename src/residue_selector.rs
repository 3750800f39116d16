use mesa_protocol::{ChainRecord, ChainSelection, ResidueSelection, SequenceWindow};

/// Slices every selected chain by its sequence-local window.
///
/// Chain ids absent from `chains` are skipped. Windows are clamped to the
/// chain length, so this never fails.
pub fn select(chains: &[ChainRecord], selection: &ResidueSelection) -> ChainSelection {
    let mut ret = ChainSelection::new();
    for (chain_id, window) in selection {
        let Some(chain) = chains.iter().find(|c| &c.chain_id == chain_id) else {
            log::debug!("Selection references unknown chain '{chain_id}', skipped");
            continue;
        };
        ret.insert(chain_id.clone(), slice(&chain.sequence, window).to_string());
    }
    ret
}

/// Clamped `sequence[start..end]`. A reversed window yields an empty slice.
pub fn slice<'a>(sequence: &'a str, window: &SequenceWindow) -> &'a str {
    let end = window.end.min(sequence.len());
    let start = window.start.min(end);
    sequence.get(start..end).unwrap_or("")
}

/// Windows that are reversed or run past their chain, as `(chain_id, reason)`.
pub fn invalid_windows(
    chains: &[ChainRecord],
    selection: &ResidueSelection,
) -> Vec<(String, String)> {
    selection
        .iter()
        .filter_map(|(chain_id, window)| {
            let chain = chains.iter().find(|c| &c.chain_id == chain_id)?;
            if window.fits(chain.len()) {
                None
            } else {
                Some((
                    chain_id.clone(),
                    format!(
                        "window [{}, {}) is outside chain {chain_id} of length {}",
                        window.start,
                        window.end,
                        chain.len()
                    ),
                ))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chains() -> Vec<ChainRecord> {
        vec![
            ChainRecord {
                id: "1ABC:H".to_string(),
                chain_id: "H".to_string(),
                sequence: "EVQLVESGGGLVQ".to_string(),
                start: 1,
                end: 13,
                residue_numbers: vec![],
            },
            ChainRecord {
                id: "1ABC:L".to_string(),
                chain_id: "L".to_string(),
                sequence: "DIQMTQSPSSLSA".to_string(),
                start: 1,
                end: 13,
                residue_numbers: vec![],
            },
        ]
    }

    #[test]
    fn test_select_slices_every_valid_window() {
        let chains = chains();
        let sequence = &chains[0].sequence;
        for a in 0..=sequence.len() {
            for b in a..=sequence.len() {
                let selection =
                    ResidueSelection::from([("H".to_string(), SequenceWindow::new(a, b))]);
                let ret = select(&chains, &selection);
                assert_eq!(ret["H"], sequence[a..b]);
            }
        }
    }

    #[test]
    fn test_empty_window_is_empty_string() {
        let selection = ResidueSelection::from([("L".to_string(), SequenceWindow::new(4, 4))]);
        assert_eq!(select(&chains(), &selection)["L"], "");
    }

    #[test]
    fn test_unknown_chain_is_skipped() {
        let selection = ResidueSelection::from([
            ("H".to_string(), SequenceWindow::new(0, 10)),
            ("Q".to_string(), SequenceWindow::new(0, 10)),
        ]);
        let ret = select(&chains(), &selection);
        assert_eq!(ret.len(), 1);
        assert_eq!(ret["H"], "EVQLVESGGG");
        assert!(select(&chains(), &ResidueSelection::new()).is_empty());
    }

    #[test]
    fn test_out_of_range_is_clamped_and_reported() {
        let selection = ResidueSelection::from([
            ("H".to_string(), SequenceWindow::new(10, 99)),
            ("L".to_string(), SequenceWindow::new(5, 2)),
        ]);
        let ret = select(&chains(), &selection);
        assert_eq!(ret["H"], "LVQ");
        assert_eq!(ret["L"], "");
        let invalid = invalid_windows(&chains(), &selection);
        assert_eq!(invalid.len(), 2);
        assert_eq!(invalid[0].0, "H");
    }
}
