//! Flow input files.
//!
//! A file holds either a single flow object or an array of them, as JSON or
//! YAML. The extension picks the format; anything else is tried as JSON first.

use std::path::{Path, PathBuf};

use flowguard_core_types::{FlowDefinition, FlowDefinitionError};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowFileError {
    #[error("failed to read flow file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a valid flow file: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("{path} contains no flows")]
    Empty { path: PathBuf },

    #[error("flow #{index} in {path} is invalid: {source}")]
    Invalid {
        path: PathBuf,
        index: usize,
        #[source]
        source: FlowDefinitionError,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowFormat {
    Json,
    Yaml,
    /// JSON, falling back to YAML.
    Detect,
}

impl FlowFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => FlowFormat::Json,
            Some("yaml") | Some("yml") => FlowFormat::Yaml,
            _ => FlowFormat::Detect,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlowDocument {
    Many(Vec<FlowDefinition>),
    One(FlowDefinition),
}

impl FlowDocument {
    fn into_flows(self) -> Vec<FlowDefinition> {
        match self {
            FlowDocument::Many(flows) => flows,
            FlowDocument::One(flow) => vec![flow],
        }
    }
}

pub async fn load_flows(path: &Path) -> Result<Vec<FlowDefinition>, FlowFileError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FlowFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    parse_flows(&content, FlowFormat::from_path(path), path)
}

/// Parse and structurally validate every flow in `content`.
pub fn parse_flows(
    content: &str,
    format: FlowFormat,
    origin: &Path,
) -> Result<Vec<FlowDefinition>, FlowFileError> {
    let parse_error = |reason: String| FlowFileError::Parse {
        path: origin.to_path_buf(),
        reason,
    };
    let document: FlowDocument = match format {
        FlowFormat::Json => serde_json::from_str(content).map_err(|err| parse_error(err.to_string()))?,
        FlowFormat::Yaml => serde_yaml::from_str(content).map_err(|err| parse_error(err.to_string()))?,
        FlowFormat::Detect => match serde_json::from_str(content) {
            Ok(document) => document,
            Err(_) => serde_yaml::from_str(content).map_err(|err| parse_error(err.to_string()))?,
        },
    };

    let flows = document.into_flows();
    if flows.is_empty() {
        return Err(FlowFileError::Empty {
            path: origin.to_path_buf(),
        });
    }
    for (index, flow) in flows.iter().enumerate() {
        flow.validate().map_err(|source| FlowFileError::Invalid {
            path: origin.to_path_buf(),
            index,
            source,
        })?;
    }
    Ok(flows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowguard_core_types::StepAction;

    fn origin() -> PathBuf {
        PathBuf::from("flows.json")
    }

    #[test]
    fn single_json_object() {
        let json = r##"{
            "name": "login",
            "intent": "user can sign in",
            "url": "https://app.example/login",
            "steps": [
                {"action": "type", "target": "#email", "value": "a@b.c"},
                {"action": "click", "target": "button[type=submit]"},
                {"action": "screenshot", "assert": "dashboard is visible"}
            ]
        }"##;
        let flows = parse_flows(json, FlowFormat::Json, &origin()).unwrap();
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].steps.len(), 3);
        assert_eq!(flows[0].steps[0].action, StepAction::Type);
    }

    #[test]
    fn yaml_array_detected() {
        let yaml = r##"
- name: home
  url: https://shop.example
  steps:
    - action: screenshot
- name: cart
  url: https://shop.example/cart
  viewport: { width: 375, height: 812 }
  steps:
    - action: hover
      target: "#cart"
"##;
        let flows = parse_flows(yaml, FlowFormat::Detect, Path::new("flows")).unwrap();
        assert_eq!(flows.len(), 2);
        assert_eq!(flows[1].viewport.unwrap().width, 375);
        // unknown actions survive loading for the executor to report
        assert_eq!(flows[1].steps[0].action, StepAction::Other("hover".into()));
    }

    #[test]
    fn empty_array_rejected() {
        let err = parse_flows("[]", FlowFormat::Json, &origin()).unwrap_err();
        assert!(matches!(err, FlowFileError::Empty { .. }));
    }

    #[test]
    fn structural_errors_name_the_flow_index() {
        let json = r#"[
            {"name": "ok", "url": "https://a.example", "steps": [{"action": "screenshot"}]},
            {"name": "no-steps", "url": "https://b.example", "steps": []}
        ]"#;
        let err = parse_flows(json, FlowFormat::Json, &origin()).unwrap_err();
        assert!(matches!(err, FlowFileError::Invalid { index: 1, .. }));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = parse_flows("{ not json", FlowFormat::Json, &origin()).unwrap_err();
        assert!(matches!(err, FlowFileError::Parse { .. }));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smoke.yml");
        std::fs::write(
            &path,
            "name: smoke\nurl: https://x.example\nsteps:\n  - action: screenshot\n",
        )
        .unwrap();
        let flows = tokio_test::block_on(load_flows(&path)).unwrap();
        assert_eq!(flows[0].name, "smoke");

        let missing = tokio_test::block_on(load_flows(&dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(missing, FlowFileError::Read { .. }));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(FlowFormat::from_path(Path::new("a.YML")), FlowFormat::Yaml);
        assert_eq!(FlowFormat::from_path(Path::new("a.json")), FlowFormat::Json);
        assert_eq!(FlowFormat::from_path(Path::new("a.txt")), FlowFormat::Detect);
    }
}
