use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for swiftdeadcode analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Treat public and open declarations as entry points
    pub retain_public: bool,

    /// Retain declarations reachable from the Objective-C runtime
    pub retain_objc_accessible: bool,

    /// Do not eliminate write-only property references
    pub retain_assign_only_properties: bool,

    /// Keep unused parameters of functions that satisfy a protocol requirement
    pub retain_unused_protocol_func_params: bool,

    /// Retain SwiftUI preview providers
    pub retain_swift_ui_previews: bool,

    /// Name patterns to retain - never report as dead code
    pub retain_patterns: Vec<String>,

    /// Base classes declared outside the project whose subclasses are test cases
    pub external_test_case_classes: Vec<String>,

    /// Path patterns whose findings are not reported
    pub report_exclude: Vec<String>,

    /// Report configuration
    pub report: ReportConfig,

    /// Detection configuration
    pub detection: DetectionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: terminal, json
    pub format: String,

    /// Also list declarations suppressed by comment directives
    pub show_ignored: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Enable unused import detection
    pub unused_imports: bool,

    /// Enable unused parameter detection
    pub unused_parameters: bool,

    /// Enable redundant `public` detection
    pub redundant_public: bool,

    /// Enable redundant `internal` detection
    pub redundant_internal: bool,

    /// Enable redundant `fileprivate` detection
    pub redundant_fileprivate: bool,

    /// Enable redundant protocol detection
    pub redundant_protocols: bool,

    /// Enable assign-only property detection
    pub assign_only_properties: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retain_public: false,
            retain_objc_accessible: false,
            retain_assign_only_properties: false,
            retain_unused_protocol_func_params: false,
            retain_swift_ui_previews: true,
            retain_patterns: vec![],
            external_test_case_classes: vec!["XCTestCase".to_string(), "QuickSpec".to_string()],
            report_exclude: vec![],
            report: ReportConfig::default(),
            detection: DetectionConfig::default(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "terminal".to_string(),
            show_ignored: false,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            unused_imports: true,
            unused_parameters: true,
            redundant_public: true,
            redundant_internal: true,
            redundant_fileprivate: true,
            redundant_protocols: true,
            assign_only_properties: true,
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")
                }
            }
        }
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let default_names = [
            ".swiftdeadcode.yml",
            ".swiftdeadcode.yaml",
            ".swiftdeadcode.toml",
            "swiftdeadcode.yml",
            "swiftdeadcode.yaml",
            "swiftdeadcode.toml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        // No config file found, use defaults
        Ok(Self::default())
    }

    /// Check whether findings in a file are excluded from the report
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.report_exclude
            .iter()
            .any(|pattern| glob_match(pattern, &path_str))
    }

    /// Check if a declaration name matches a retain pattern
    pub fn should_retain(&self, name: &str) -> bool {
        self.retain_patterns.iter().any(|p| glob_match(p, name))
    }
}

/// Simple glob matching for patterns like "*Handler" or "**/Generated/**"
pub(crate) fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern.starts_with('*') && !pattern.contains('/') {
        // "*Handler" matches "EventHandler"
        return text.ends_with(&pattern[1..]);
    }

    if pattern.ends_with('*') && !pattern.contains('/') {
        // "Legacy*" matches "LegacyParser"
        return text.starts_with(&pattern[..pattern.len() - 1]);
    }

    if pattern.contains("**") {
        // "**/Generated/**" must match a whole directory name
        if pattern.starts_with("**/") && pattern.ends_with("/**") {
            let dir_name = pattern.replace("**/", "").replace("/**", "");
            let dir_pattern = format!("/{}/", dir_name.trim_matches('/'));
            return text.contains(&dir_pattern) || text.starts_with(&dir_pattern[1..]);
        }

        let parts: Vec<&str> = pattern.split("**").collect();
        if parts.len() == 2 {
            let prefix = parts[0].trim_end_matches('/');
            let suffix = parts[1].trim_start_matches('/');

            if prefix.is_empty() && suffix.is_empty() {
                return true;
            }

            // "**/*.generated.swift" style suffix globs
            let suffix_matches = |text: &str| match suffix.strip_prefix('*') {
                Some(tail) => text.ends_with(tail),
                None => text.ends_with(suffix) || text.contains(&format!("/{}", suffix)),
            };

            if prefix.is_empty() {
                return suffix_matches(text);
            }

            if suffix.is_empty() {
                return text.starts_with(prefix) || text.contains(&format!("/{}/", prefix));
            }

            return (text.starts_with(prefix) || text.contains(&format!("/{}/", prefix)))
                && suffix_matches(text);
        }
    }

    text == pattern
}
