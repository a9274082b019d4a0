mod loader;

pub use loader::{Config, DetectionConfig, ReportConfig};
