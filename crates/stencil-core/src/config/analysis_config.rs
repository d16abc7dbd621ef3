//! Analysis configuration.

use serde::{Deserialize, Serialize};

/// Tunable thresholds for template analysis.
///
/// All fields are optional so a partial TOML file overrides only what it
/// names; the `effective_*` accessors supply the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Line count above which a template is flagged as large. Default: 200.
    pub large_template_lines: Option<usize>,
    /// Complexity score above which decomposition is recommended. Default: 20.0.
    pub complexity_threshold: Option<f64>,
    /// Longest single line (bytes) a pattern rule will scan before the rule
    /// is abandoned for that template. Default: 65536.
    pub max_scan_line_len: Option<usize>,
}

impl AnalysisConfig {
    /// Parse a TOML config document.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Returns the effective large-template threshold, defaulting to 200.
    pub fn effective_large_template_lines(&self) -> usize {
        self.large_template_lines.unwrap_or(200)
    }

    /// Returns the effective complexity threshold, defaulting to 20.0.
    pub fn effective_complexity_threshold(&self) -> f64 {
        self.complexity_threshold.unwrap_or(20.0)
    }

    /// Returns the effective per-rule line-length scan bound, defaulting to 65536.
    pub fn effective_max_scan_line_len(&self) -> usize {
        self.max_scan_line_len.unwrap_or(65_536)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.effective_large_template_lines(), 200);
        assert_eq!(cfg.effective_complexity_threshold(), 20.0);
        assert_eq!(cfg.effective_max_scan_line_len(), 65_536);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let cfg = AnalysisConfig::from_toml("large_template_lines = 50\n").unwrap();
        assert_eq!(cfg.effective_large_template_lines(), 50);
        assert_eq!(cfg.effective_complexity_threshold(), 20.0);
    }
}
