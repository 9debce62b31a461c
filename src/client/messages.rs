use serde::Deserialize;

use crate::graph::Geneagraph;
use crate::progress::ProgressCounts;

/// Inbound message from the graph-building service, discriminated by `kind`
/// with the body under `payload`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum ServiceMessage {
    Progress(ProgressCounts),
    Graph(Geneagraph),
}

/// Decode one message. Unknown kinds, missing fields and malformed JSON all
/// come back as `None`; the caller keeps the raw text for diagnostics.
pub fn decode(text: &str) -> Option<ServiceMessage> {
    match serde_json::from_str::<ServiceMessage>(text) {
        Ok(message) => Some(message),
        Err(e) => {
            log::debug!("Unrecognized service message ({}): {}", e, text);
            None
        }
    }
}
