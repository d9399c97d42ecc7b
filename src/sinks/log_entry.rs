use serde::Serialize;
use std::collections::HashMap;

pub const DEFAULT_LOG_NAME_TEMPLATE: &str = "projects/{log.project_id}/logs/{log.log_id}";
pub const DEFAULT_MESSAGE_TEMPLATE: &str = "{log.message}";
pub const DEFAULT_SEVERITY_TEMPLATE: &str = "{log.severity}";
pub const DEFAULT_SEVERITY: &str = "INFO";

/// Body of a cloud logging `entries:write` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntriesRequest {
    pub log_name: String,
    pub resource: MonitoredResource,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
    pub entries: Vec<LogEntry>,
    pub partial_success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoredResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub severity: String,
    pub text_payload: String,
}

impl LogEntriesRequest {
    /// Single text entry against the `api` resource type.
    pub fn single(log_name: String, severity: String, text_payload: String) -> Self {
        Self {
            log_name,
            resource: MonitoredResource { resource_type: "api".to_owned(), labels: HashMap::new() },
            labels: HashMap::new(),
            entries: vec![LogEntry { severity, text_payload }],
            partial_success: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_to_entries_write_shape() {
        let req = LogEntriesRequest::single("projects/p/logs/l".into(), "INFO".into(), "hello, world".into());
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "logName": "projects/p/logs/l",
                "resource": { "type": "api", "labels": {} },
                "entries": [{ "severity": "INFO", "textPayload": "hello, world" }],
                "partialSuccess": true
            })
        );
    }
}
