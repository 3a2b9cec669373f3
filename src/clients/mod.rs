pub mod gemini;
pub mod report;
pub mod traits;

pub use gemini::GeminiClient;
pub use report::ReportClient;
pub use traits::{AnalyzerError, LogoAnalyzer};
