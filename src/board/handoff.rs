#![forbid(unsafe_code)]

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::board::model::{Project, ProjectPatch};
use crate::error::PmtuiError;

// The characters encodeURIComponent leaves alone, so payloads match its
// output byte for byte.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Serializes a project record for a cross-screen navigation parameter:
/// JSON, then percent-encoded.
pub fn encode_project(project: &Project) -> Result<String, PmtuiError> {
    let json = serde_json::to_string(project)
        .map_err(|e| PmtuiError::Other(format!("failed to encode project payload: {e}")))?;
    Ok(utf8_percent_encode(&json, COMPONENT).to_string())
}

/// Decodes a handoff payload. Malformed input yields `None`; the receiving
/// screen treats that the same as no payload at all.
#[must_use]
pub fn decode_patch(payload: &str) -> Option<ProjectPatch> {
    let json = percent_decode_str(payload).decode_utf8().ok()?;
    serde_json::from_str(&json).ok()
}

/// Merges a decoded payload over the project list entry with the matching
/// id (string-compared). Absent, malformed, or unknown-id payloads change
/// nothing. Returns whether a record was updated.
pub fn apply_update(projects: &mut [Project], payload: &str) -> bool {
    let Some(patch) = decode_patch(payload) else {
        return false;
    };
    let Some(id) = patch.id.as_deref() else {
        return false;
    };
    let Some(project) = projects.iter_mut().find(|p| p.id == id) else {
        return false;
    };

    if let Some(name) = patch.name {
        project.name = name;
    }
    if let Some(description) = patch.description {
        project.description = description;
    }
    if let Some(deadline) = patch.deadline {
        project.deadline = Some(deadline);
    }
    if let Some(budget) = patch.budget {
        project.budget = Some(budget);
    }
    if let Some(progress) = patch.progress {
        project.progress = Some(progress);
    }
    if let Some(departments) = patch.departments {
        project.departments = departments;
    }
    true
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    fn projects() -> Vec<Project> {
        vec![
            Project {
                id: "1".to_owned(),
                name: "Bridge Structural Analysis".to_owned(),
                description: "Finite element modeling.".to_owned(),
                deadline: Some(date!(2025 - 12 - 01)),
                budget: None,
                progress: Some(46),
                departments: vec!["Design Mecanic".to_owned()],
            },
            Project {
                id: "2".to_owned(),
                name: "Robotics Automation System".to_owned(),
                description: String::new(),
                deadline: None,
                budget: None,
                progress: Some(72),
                departments: Vec::new(),
            },
        ]
    }

    #[test]
    fn round_trips_through_percent_encoded_json() {
        let project = projects().remove(0);
        let payload = encode_project(&project).unwrap();
        assert!(!payload.contains('{'), "JSON must be escaped: {payload}");
        assert!(!payload.contains('"'));

        let mut list = projects();
        list[0].name = "stale".to_owned();
        assert!(apply_update(&mut list, &payload));
        assert_eq!(list[0].name, "Bridge Structural Analysis");
    }

    #[test]
    fn merges_only_fields_present_in_payload() {
        let mut list = projects();
        // {"id":"2","deadline":"2026-01-15"} percent-encoded.
        let payload =
            "%7B%22id%22%3A%222%22%2C%22deadline%22%3A%222026-01-15%22%7D";
        assert!(apply_update(&mut list, payload));
        assert_eq!(list[1].deadline, Some(date!(2026 - 01 - 15)));
        // Untouched fields keep their values.
        assert_eq!(list[1].name, "Robotics Automation System");
        assert_eq!(list[1].progress, Some(72));
    }

    #[test]
    fn unknown_id_changes_nothing() {
        let mut list = projects();
        let before = list.clone();
        let payload = "%7B%22id%22%3A%2299%22%2C%22name%22%3A%22ghost%22%7D";
        assert!(!apply_update(&mut list, payload));
        assert_eq!(list, before);
    }

    #[test]
    fn malformed_payloads_are_ignored_silently() {
        let mut list = projects();
        let before = list.clone();
        assert!(!apply_update(&mut list, "%zz-not-json"));
        assert!(!apply_update(&mut list, "plain text"));
        assert!(!apply_update(&mut list, ""));
        assert_eq!(list, before);
    }

    #[test]
    fn payload_without_id_is_a_no_op() {
        let mut list = projects();
        let before = list.clone();
        // {"name":"anonymous"}
        let payload = "%7B%22name%22%3A%22anonymous%22%7D";
        assert!(!apply_update(&mut list, payload));
        assert_eq!(list, before);
    }
}
