pub mod engine;
pub mod sizing;

pub use engine::PolicyEngine;
pub use sizing::RiskConfig;
