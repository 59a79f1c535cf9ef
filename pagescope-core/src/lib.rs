pub mod analyze;
pub mod config;
pub mod doctype;
pub mod login;
pub mod model;
pub mod report;

pub use analyze::{
    AnalysisError, AnalysisProgressCallback, AnalyzeOptions, PageAnalyzer, PageSurvey,
    execute_analysis,
};
pub use config::{AnalyzerConfig, ConfigError, DoctypeSignature, ProbeSettings};
pub use model::{AnalysisResult, HeadingCount, LinkDetails, Links};
pub use report::ReportFormat;
