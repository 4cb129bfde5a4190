//! FlowGuard: browser user-flow validation with cached vision assertions.
//!
//! The binary is a thin layer over this library: configuration loading,
//! flow-file parsing, wiring of the engine crates and benchmark scoring.

pub mod config;
pub mod context;
pub mod evaluate;
pub mod flow_file;

pub use config::{Config, ConfigError, VisionSettings, MAX_TTL_HOURS};
pub use context::AppContext;
pub use evaluate::{
    evaluate, generate_mock_dataset, predict, BenchmarkCategory, Dataset, EvaluationReport,
    Prediction, PredictionSet,
};
pub use flow_file::{load_flows, parse_flows, FlowFileError, FlowFormat};
