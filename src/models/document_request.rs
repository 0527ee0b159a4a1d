use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::aiforged::DocumentExtraction;

/// Status label the platform uses while a document waits for human verification.
pub const VERIFICATION_STATUS: &str = "Verification";

/// Webhook payload posted by the platform when a document changes state.
///
/// Accepts both the camelCase and PascalCase spellings .NET senders produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRequest {
    #[serde(rename = "docId", alias = "DocId", default)]
    pub doc_id: i32,
    #[serde(rename = "masterID", alias = "MasterID", alias = "masterId", default)]
    pub master_id: i32,
    #[serde(rename = "projectID", alias = "ProjectID", alias = "projectId", default)]
    pub project_id: i32,
    #[serde(rename = "documentID", alias = "DocumentID", alias = "documentId", default)]
    pub document_id: i32,
    #[serde(
        rename = "dateCreated",
        alias = "DateCreated",
        default,
        with = "crate::utils::datetime::option"
    )]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(
        rename = "dateModified",
        alias = "DateModified",
        default,
        with = "crate::utils::datetime::option"
    )]
    pub date_modified: Option<DateTime<Utc>>,
    #[serde(rename = "filename", alias = "Filename", deserialize_with = "required_text")]
    pub filename: String,
    #[serde(rename = "catagory", alias = "Catagory", default)]
    pub catagory: i32,
    #[serde(rename = "status", alias = "Status", deserialize_with = "required_text")]
    pub status: String,
    #[serde(rename = "comment", alias = "Comment", deserialize_with = "required_text")]
    pub comment: String,
    #[serde(rename = "result", alias = "Result", deserialize_with = "required_text")]
    pub result: String,
}

/// The key must be present; an explicit `null` reads as empty text.
fn required_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl DocumentRequest {
    pub fn is_in_verification(&self) -> bool {
        self.status == VERIFICATION_STATUS
    }
}

/// `Field: <name> Value: <value>` for every extracted field, comma separated, in order.
pub fn summarize_fields(fields: &[DocumentExtraction]) -> String {
    fields
        .iter()
        .map(|field| {
            format!(
                "Field: {} Value: {}",
                field.name.as_deref().unwrap_or_default(),
                field.value.as_deref().unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, value: Option<&str>) -> DocumentExtraction {
        DocumentExtraction {
            name: Some(name.to_string()),
            value: value.map(str::to_string),
            extra: Default::default(),
        }
    }

    #[test]
    fn test_accepts_pascal_case_payload() {
        let request: DocumentRequest = serde_json::from_value(serde_json::json!({
            "DocId": 12,
            "MasterID": 3,
            "ProjectID": 44,
            "DateCreated": "2024-06-01T09:30:00",
            "Filename": "invoice.pdf",
            "Status": "Processed",
            "Comment": "",
            "Result": ""
        }))
        .unwrap();

        assert_eq!(request.doc_id, 12);
        assert_eq!(request.master_id, 3);
        assert_eq!(request.project_id, 44);
        assert!(request.date_created.is_some());
        assert!(!request.is_in_verification());
    }

    #[test]
    fn test_required_text_fields() {
        let missing_status = serde_json::from_value::<DocumentRequest>(serde_json::json!({
            "docId": 1,
            "filename": "a.pdf",
            "comment": "",
            "result": ""
        }));
        assert!(missing_status.is_err());
    }

    #[test]
    fn test_null_text_fields_read_as_empty() {
        let request: DocumentRequest = serde_json::from_value(serde_json::json!({
            "DocId": 5,
            "Filename": "a.pdf",
            "Status": "Processed",
            "Comment": null,
            "Result": null
        }))
        .unwrap();

        assert_eq!(request.comment, "");
        assert_eq!(request.result, "");

        let missing_result = serde_json::from_value::<DocumentRequest>(serde_json::json!({
            "DocId": 5,
            "Filename": "a.pdf",
            "Status": "Processed",
            "Comment": null
        }));
        assert!(missing_result.is_err());
    }

    #[test]
    fn test_verification_label_is_exact() {
        let mut request: DocumentRequest = serde_json::from_value(serde_json::json!({
            "docId": 1, "filename": "a.pdf", "status": "Verification", "comment": "", "result": ""
        }))
        .unwrap();
        assert!(request.is_in_verification());

        request.status = "verification".into();
        assert!(!request.is_in_verification());
    }

    #[test]
    fn test_summary_keeps_order_and_duplicates() {
        let fields = vec![
            field("Total", Some("100.00")),
            field("Line", Some("A")),
            field("Line", None),
        ];

        assert_eq!(
            summarize_fields(&fields),
            "Field: Total Value: 100.00, Field: Line Value: A, Field: Line Value: "
        );
        assert_eq!(summarize_fields(&[]), "");
    }
}
