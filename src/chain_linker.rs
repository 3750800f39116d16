use mesa_protocol::{ChainSelection, Linkage, LinkedChains};
use thiserror::Error;

lazy_static::lazy_static! {
    /// Five repeats of `GGGGS`.
    pub static ref DEFAULT_CHAIN_LINKER: String = "GGGGS".repeat(5);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("chain '{chain_id}' referenced by '{output_chain}' is not in the chain selection")]
    MissingChain {
        chain_id: String,
        output_chain: String,
    },
}

/// Joins the selected sub-sequences of every output chain with `linker`.
///
/// Fails for all output chains as soon as one referenced chain id is missing.
pub fn link(
    selection: &ChainSelection,
    linkage: &Linkage,
    linker: &str,
) -> Result<LinkedChains, LinkError> {
    let mut ret = LinkedChains::new();
    for (output_chain, chain_ids) in linkage {
        let parts = chain_ids
            .iter()
            .map(|chain_id| {
                selection
                    .get(chain_id)
                    .map(String::as_str)
                    .ok_or_else(|| LinkError::MissingChain {
                        chain_id: chain_id.clone(),
                        output_chain: output_chain.clone(),
                    })
            })
            .collect::<Result<Vec<&str>, LinkError>>()?;
        ret.insert(output_chain.clone(), parts.join(linker));
    }
    Ok(ret)
}
