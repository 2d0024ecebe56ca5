// src/events/payloads.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{electoral::DataType, tasks::Priority};

// Arquivo aceito pela ingestão e gravado no bucket de uploads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataUploaded {
    pub tenant_id: Uuid,
    pub data_type: DataType,
    pub file_name: String,
    pub file_path: String,
    pub uploaded_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProcessed {
    pub tenant_id: Uuid,
    pub data_type: DataType,
    pub records_processed: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTaskCreated {
    pub task_id: Uuid,
    pub tenant_id: Uuid,
    pub agent_id: Uuid,
    pub task_type: String,
    pub input_data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTaskCompleted {
    pub task_id: Uuid,
    pub tenant_id: Uuid,
    pub agent_id: Uuid,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Insight,
    Task,
    Alert,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub tenant_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub priority: Priority,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_processed_omits_empty_errors() {
        let ok = DataProcessed {
            tenant_id: Uuid::nil(),
            data_type: DataType::Polls,
            records_processed: 4,
            success: true,
            errors: None,
        };

        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value["dataType"], "polls");
        assert_eq!(value["recordsProcessed"], 4);
        assert!(value.get("errors").is_none());
    }

    #[test]
    fn notification_uses_type_field() {
        let n = Notification {
            tenant_id: Uuid::nil(),
            kind: NotificationKind::Insight,
            title: "t".into(),
            message: "m".into(),
            priority: Priority::High,
        };

        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["type"], json!("insight"));
        assert_eq!(value["priority"], json!("high"));
    }
}
