//! Knobs for semantic analysis.

use serde::{Deserialize, Serialize};

/// Options shared by the MAS and test analyzers.
///
/// Every field has a default, so a partial JSON object is enough:
///
/// ```rust
/// use mas2g_resolver::AnalysisOptions;
///
/// let options = AnalysisOptions::from_json(r#"{ "check_resources": false }"#).unwrap();
/// assert!(!options.check_resources);
/// assert!(options.report_unused);
/// assert_eq!(options.agent_extension, "goal");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Probe referenced files for existence and archive shape.
    pub check_resources: bool,
    /// Warn about agent files no launch rule uses.
    pub report_unused: bool,
    pub agent_extension: String,
    pub environment_extension: String,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            check_resources: true,
            report_unused: true,
            agent_extension: "goal".to_string(),
            environment_extension: "jar".to_string(),
        }
    }
}

impl AnalysisOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Defaults, without touching the file system.
    pub fn offline() -> Self {
        Self {
            check_resources: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_object_gives_defaults() {
        assert_eq!(AnalysisOptions::from_json("{}").unwrap(), AnalysisOptions::default());
    }

    #[test]
    fn test_unknown_field_is_ignored() {
        let options = AnalysisOptions::from_json(r#"{ "agent_extension": "g2", "x": 1 }"#).unwrap();
        assert_eq!(options.agent_extension, "g2");
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        assert!(AnalysisOptions::from_json(r#"{ "report_unused": "yes" }"#).is_err());
    }
}
