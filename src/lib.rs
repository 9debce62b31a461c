pub mod config;
pub mod error;
pub mod request;
pub mod graph;
pub mod progress;
pub mod client;
pub mod dot;
pub mod report;

pub use client::GraphClient;
pub use config::Config;
pub use error::{GeneagrapherError, Result};
pub use graph::{Geneagraph, GraphStatus, Nodes, Record, RecordId};
pub use progress::ProgressCounts;
pub use request::{RequestPayload, StartNodeSpec};
