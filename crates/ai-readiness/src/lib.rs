//! AI readiness assessment: questionnaire scoring, maturity classification, report
//! generation and the paid submission pipeline around them.

pub mod assessment;
pub mod config;
pub mod error;
pub mod integrations;
pub mod telemetry;
