//! Start-node specifications and the build-graph request sent to the service.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::GeneagrapherError;
use crate::graph::RecordId;

/// A traversal seed: one record id plus the directions to follow from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartNodeSpec {
    #[serde(rename = "recordId")]
    pub record_id: RecordId,
    #[serde(rename = "getAdvisors")]
    pub request_advisors: bool,
    #[serde(rename = "getDescendants")]
    pub request_descendants: bool,
}

impl StartNodeSpec {
    /// Create a spec; with neither direction requested, advisors are traversed.
    pub fn new(record_id: RecordId, request_advisors: bool, request_descendants: bool) -> Self {
        Self {
            record_id,
            request_advisors: request_advisors || !request_descendants,
            request_descendants,
        }
    }
}

fn start_node_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)(?::(a|d|ad|da))?$").expect("Invalid regex pattern"))
}

impl FromStr for StartNodeSpec {
    type Err = GeneagrapherError;

    /// Parse `ID`, `ID:a`, `ID:d`, `ID:ad` or `ID:da`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GeneagrapherError::InvalidStartNode(s.to_string());

        let caps = start_node_regex().captures(s).ok_or_else(invalid)?;
        let record_id: RecordId = caps[1].parse().map_err(|_| invalid())?;
        if record_id == 0 {
            return Err(invalid());
        }

        let directions = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        Ok(Self::new(
            record_id,
            directions.contains('a'),
            directions.contains('d'),
        ))
    }
}

impl fmt::Display for StartNodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match (self.request_advisors, self.request_descendants) {
            (true, true) => "ad",
            (false, true) => "d",
            _ => "a",
        };
        write!(f, "{}:{}", self.record_id, suffix)
    }
}

/// Fixed `kind` tag of the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    #[serde(rename = "build-graph")]
    BuildGraph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Ask the service to stream progress messages.
    #[serde(rename = "reportingCallback")]
    pub reporting_callback: bool,
}

/// The single message sent to the service per exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPayload {
    pub kind: RequestKind,
    pub options: RequestOptions,
    #[serde(rename = "startNodes")]
    pub start_nodes: Vec<StartNodeSpec>,
}

impl RequestPayload {
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Build the request for the given seeds. Progress reporting is the negation of `quiet`.
pub fn build(start_nodes: &[StartNodeSpec], quiet: bool) -> RequestPayload {
    RequestPayload {
        kind: RequestKind::BuildGraph,
        options: RequestOptions {
            reporting_callback: !quiet,
        },
        start_nodes: start_nodes.to_vec(),
    }
}
