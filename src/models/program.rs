use serde::{Deserialize, Serialize};

/// How to recognise (and, if needed, start) one program of a layout.
///
/// The `detected_*` fields are filled in by capture. Each one that is present
/// narrows window matching; removing it from the file drops the criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSpec {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_class: Option<String>,
    #[serde(default)]
    pub suppress_start: bool,
}

impl ProgramSpec {
    /// Descriptor for a window seen during capture.
    pub fn detected(command: &str, title: &str, class: &str) -> Self {
        Self {
            command: command.to_string(),
            detected_command: Some(command.to_string()),
            detected_title: Some(title.to_string()),
            detected_class: Some(class.to_string()),
            suppress_start: false,
        }
    }

    /// Command line a running window must have to match: the detected one if
    /// recorded, else the configured launch command.
    pub fn expected_command(&self) -> &str {
        self.detected_command.as_deref().unwrap_or(&self.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_command_prefers_detected() {
        let mut spec = ProgramSpec::detected("/usr/bin/foot", "foot", "foot");
        spec.command = "foot --server".into();
        assert_eq!(spec.expected_command(), "/usr/bin/foot");

        spec.detected_command = None;
        assert_eq!(spec.expected_command(), "foot --server");
    }

    #[test]
    fn test_minimal_hand_written_entry() {
        let spec: ProgramSpec = serde_json::from_str(r#"{"command": "spotify"}"#).unwrap();
        assert_eq!(spec.command, "spotify");
        assert!(spec.detected_title.is_none());
        assert!(spec.detected_class.is_none());
        assert!(!spec.suppress_start);
    }

    #[test]
    fn test_empty_detected_title_is_still_a_criterion() {
        let spec: ProgramSpec =
            serde_json::from_str(r#"{"command": "x", "detected_title": ""}"#).unwrap();
        assert_eq!(spec.detected_title.as_deref(), Some(""));
    }

    #[test]
    fn test_serialized_field_order() {
        let spec = ProgramSpec::detected("/usr/bin/foot", "Terminal", "foot");
        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"command":"/usr/bin/foot","detected_command":"/usr/bin/foot","#,
                r#""detected_title":"Terminal","detected_class":"foot","suppress_start":false}"#,
            )
        );
    }
}
