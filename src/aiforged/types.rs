use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Errors raised by the AIForged sub-clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid AIForged configuration: {0}")]
    Config(String),

    #[error("Request to {operation} failed: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The platform answered with a non-success status code.
    #[error("{operation} returned status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} returned no result")]
    EmptyResult(&'static str),
}

impl ClientError {
    /// Status code reported by the platform, if the failure was a status failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Envelope returned by every sub-client call: the HTTP status plus the decoded body.
/// `result` is `None` when the platform answered with an empty or `null` body.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteResponse<T> {
    pub status_code: u16,
    pub result: Option<T>,
}

impl<T> RemoteResponse<T> {
    pub fn ok(result: T) -> Self {
        Self {
            status_code: 200,
            result: Some(result),
        }
    }

    pub fn empty(status_code: u16) -> Self {
        Self {
            status_code,
            result: None,
        }
    }
}

/// Document lifecycle state.
///
/// Values the platform sends that are not listed here are kept verbatim in `Other`
/// and written back unchanged. Callers of this service can only pick a listed value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DocumentStatus {
    #[default]
    Received,
    Queued,
    Processing,
    Processed,
    Verification,
    Completed,
    Error,
    Cancelled,
    Archived,
    Deleted,
    Other(String),
}

impl DocumentStatus {
    const KNOWN: [DocumentStatus; 10] = [
        DocumentStatus::Received,
        DocumentStatus::Queued,
        DocumentStatus::Processing,
        DocumentStatus::Processed,
        DocumentStatus::Verification,
        DocumentStatus::Completed,
        DocumentStatus::Error,
        DocumentStatus::Cancelled,
        DocumentStatus::Archived,
        DocumentStatus::Deleted,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            DocumentStatus::Received => "Received",
            DocumentStatus::Queued => "Queued",
            DocumentStatus::Processing => "Processing",
            DocumentStatus::Processed => "Processed",
            DocumentStatus::Verification => "Verification",
            DocumentStatus::Completed => "Completed",
            DocumentStatus::Error => "Error",
            DocumentStatus::Cancelled => "Cancelled",
            DocumentStatus::Archived => "Archived",
            DocumentStatus::Deleted => "Deleted",
            DocumentStatus::Other(raw) => raw,
        }
    }

    /// Exact wire match; anything else is carried as `Other`.
    fn from_wire(raw: String) -> Self {
        Self::KNOWN
            .iter()
            .find(|status| status.as_str() == raw)
            .cloned()
            .unwrap_or(DocumentStatus::Other(raw))
    }
}

impl Serialize for DocumentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DocumentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from_wire)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::KNOWN
            .iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .cloned()
            .ok_or_else(|| format!("unknown document status '{}'", s))
    }
}

/// What a document is used for on the platform. Unlisted values round-trip through `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UsageType {
    #[default]
    Inbox,
    Outbox,
    Training,
    Definition,
    Template,
    Classification,
    Other(String),
}

impl UsageType {
    const KNOWN: [UsageType; 6] = [
        UsageType::Inbox,
        UsageType::Outbox,
        UsageType::Training,
        UsageType::Definition,
        UsageType::Template,
        UsageType::Classification,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            UsageType::Inbox => "Inbox",
            UsageType::Outbox => "Outbox",
            UsageType::Training => "Training",
            UsageType::Definition => "Definition",
            UsageType::Template => "Template",
            UsageType::Classification => "Classification",
            UsageType::Other(raw) => raw,
        }
    }

    fn from_wire(raw: String) -> Self {
        Self::KNOWN
            .iter()
            .find(|usage| usage.as_str() == raw)
            .cloned()
            .unwrap_or(UsageType::Other(raw))
    }
}

impl Serialize for UsageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UsageType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from_wire)
    }
}

impl fmt::Display for UsageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UsageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::KNOWN
            .iter()
            .find(|usage| usage.as_str().eq_ignore_ascii_case(s))
            .cloned()
            .ok_or_else(|| format!("unknown usage type '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserViewModel {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// A document as the platform represents it.
///
/// Fields this service does not model are kept in `extra` so a fetched document
/// can be sent back through `Document/Update` without losing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentViewModel {
    pub id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stpd_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_id: Option<i32>,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::utils::datetime::option"
    )]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::utils::datetime::option"
    )]
    pub date_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_index: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Uuid>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One extracted field. Names are not unique across a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentExtraction {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Filters accepted by `Document/GetExtended`. Unset filters are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    pub user_id: String,
    pub project_id: i32,
    pub stpd_id: i32,
    pub usage: Option<UsageType>,
    pub statuses: Vec<DocumentStatus>,
    pub class_name: Option<String>,
    pub filename: Option<String>,
    pub file_type: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub master_id: Option<i32>,
    pub page_no: Option<i32>,
    pub page_size: Option<i32>,
    pub sort_field: Option<String>,
    pub sort_direction: Option<String>,
}

impl DocumentFilter {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("userId", self.user_id.clone()),
            ("projectId", self.project_id.to_string()),
            ("stpdId", self.stpd_id.to_string()),
        ];

        if let Some(usage) = &self.usage {
            query.push(("usage", usage.to_string()));
        }
        for status in &self.statuses {
            query.push(("statuses", status.to_string()));
        }
        if let Some(v) = &self.class_name {
            query.push(("classname", v.clone()));
        }
        if let Some(v) = &self.filename {
            query.push(("filename", v.clone()));
        }
        if let Some(v) = &self.file_type {
            query.push(("filetype", v.clone()));
        }
        if let Some(v) = &self.start {
            query.push(("start", v.to_rfc3339()));
        }
        if let Some(v) = &self.end {
            query.push(("end", v.to_rfc3339()));
        }
        if let Some(v) = self.master_id {
            query.push(("masterid", v.to_string()));
        }
        if let Some(v) = self.page_no {
            query.push(("pageNo", v.to_string()));
        }
        if let Some(v) = self.page_size {
            query.push(("pageSize", v.to_string()));
        }
        if let Some(v) = &self.sort_field {
            query.push(("sortField", v.clone()));
        }
        if let Some(v) = &self.sort_direction {
            query.push(("sortDirection", v.clone()));
        }

        query
    }
}

/// Metadata attached to every file of one upload request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadParams {
    pub stpd_id: i32,
    pub project_id: i32,
    pub class_id: Option<i32>,
    pub status: DocumentStatus,
    pub usage: UsageType,
    pub master_id: Option<i32>,
    pub comment: Option<String>,
    pub external_id: Option<String>,
    pub result: Option<String>,
    pub result_id: Option<String>,
    pub result_index: Option<i32>,
    pub guid: Option<Uuid>,
}

impl UploadParams {
    /// Query pairs for one file. A missing `guid` gets a fresh one per call.
    pub fn to_query(&self, user_id: &str) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("stpdId", self.stpd_id.to_string()),
            ("userId", user_id.to_string()),
            ("projectId", self.project_id.to_string()),
            ("status", self.status.to_string()),
            ("usage", self.usage.to_string()),
        ];

        if let Some(v) = self.class_id {
            query.push(("classId", v.to_string()));
        }
        if let Some(v) = self.master_id {
            query.push(("masterId", v.to_string()));
        }
        if let Some(v) = &self.comment {
            query.push(("comment", v.clone()));
        }
        if let Some(v) = &self.external_id {
            query.push(("externalId", v.clone()));
        }
        if let Some(v) = &self.result {
            query.push(("result", v.clone()));
        }
        if let Some(v) = &self.result_id {
            query.push(("resultId", v.clone()));
        }
        if let Some(v) = self.result_index {
            query.push(("resultIndex", v.to_string()));
        }
        query.push(("guid", self.guid.unwrap_or_else(Uuid::new_v4).to_string()));

        query
    }
}

/// A file received by the upload endpoint, buffered in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing_is_case_insensitive() {
        assert_eq!("processed".parse::<DocumentStatus>().unwrap(), DocumentStatus::Processed);
        assert_eq!(" VERIFICATION ".parse::<DocumentStatus>().unwrap(), DocumentStatus::Verification);
        assert!("Unknown".parse::<DocumentStatus>().is_err());
        assert_eq!("training".parse::<UsageType>().unwrap(), UsageType::Training);
    }

    #[test]
    fn test_document_keeps_unmodelled_fields() {
        let raw = serde_json::json!({
            "id": 42,
            "status": "Processed",
            "usage": "Inbox",
            "filename": "invoice.pdf",
            "dateCreated": "2024-05-02T08:00:00",
            "availablePages": 3,
            "shred": false
        });

        let doc: DocumentViewModel = serde_json::from_value(raw).unwrap();
        assert_eq!(doc.id, 42);
        assert_eq!(doc.status, DocumentStatus::Processed);
        assert!(doc.date_created.is_some());
        assert_eq!(doc.extra.get("availablePages"), Some(&serde_json::json!(3)));

        let back = serde_json::to_value(&doc).unwrap();
        assert_eq!(back["availablePages"], 3);
        assert_eq!(back["shred"], false);
        assert_eq!(back["status"], "Processed");
    }

    #[test]
    fn test_unlisted_values_are_written_back_verbatim() {
        let doc: DocumentViewModel = serde_json::from_value(serde_json::json!({
            "id": 1,
            "status": "Sleeping",
            "usage": "Dataset"
        }))
        .unwrap();
        assert_eq!(doc.status, DocumentStatus::Other("Sleeping".into()));
        assert_eq!(doc.usage, Some(UsageType::Other("Dataset".into())));

        let back = serde_json::to_value(&doc).unwrap();
        assert_eq!(back["status"], "Sleeping");
        assert_eq!(back["usage"], "Dataset");

        // Callers still cannot pick an unlisted value.
        assert!("Dataset".parse::<UsageType>().is_err());
        assert!("Sleeping".parse::<DocumentStatus>().is_err());
    }

    #[test]
    fn test_absent_fields_stay_absent() {
        let doc: DocumentViewModel =
            serde_json::from_value(serde_json::json!({ "id": 3, "status": "Processed" })).unwrap();
        let back = serde_json::to_value(&doc).unwrap();
        let keys: Vec<&str> = back.as_object().unwrap().keys().map(String::as_str).collect();

        assert_eq!(keys, vec!["id", "status"]);
        assert!(back.get("userId").is_none());
        assert!(back.get("usage").is_none());
    }

    #[test]
    fn test_filter_query_forwards_optional_filters() {
        let start = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let filter = DocumentFilter {
            user_id: "u-1".into(),
            project_id: 5,
            stpd_id: 9,
            usage: Some(UsageType::Outbox),
            class_name: Some("Invoice".into()),
            filename: Some("a.pdf".into()),
            file_type: Some("application/pdf".into()),
            start: Some(start),
            master_id: Some(12),
            page_no: Some(2),
            page_size: Some(50),
            sort_field: Some("DateCreated".into()),
            sort_direction: Some("Descending".into()),
            ..Default::default()
        };

        let query = filter.to_query();
        let value = |key: &str| query.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str());

        assert_eq!(value("usage"), Some("Outbox"));
        assert_eq!(value("classname"), Some("Invoice"));
        assert_eq!(value("filename"), Some("a.pdf"));
        assert_eq!(value("filetype"), Some("application/pdf"));
        assert_eq!(value("start"), Some("2024-01-01T00:00:00+00:00"));
        assert_eq!(value("end"), None);
        assert_eq!(value("masterid"), Some("12"));
        assert_eq!(value("pageNo"), Some("2"));
        assert_eq!(value("pageSize"), Some("50"));
        assert_eq!(value("sortField"), Some("DateCreated"));
        assert_eq!(value("sortDirection"), Some("Descending"));
    }

    #[test]
    fn test_filter_query_repeats_statuses_and_skips_unset() {
        let filter = DocumentFilter {
            user_id: "u-1".into(),
            project_id: 5,
            stpd_id: 9,
            statuses: vec![DocumentStatus::Processed, DocumentStatus::Error],
            ..Default::default()
        };

        let query = filter.to_query();
        assert_eq!(
            query,
            vec![
                ("userId", "u-1".to_string()),
                ("projectId", "5".to_string()),
                ("stpdId", "9".to_string()),
                ("statuses", "Processed".to_string()),
                ("statuses", "Error".to_string()),
            ]
        );
    }

    #[test]
    fn test_upload_query_generates_guid_when_missing() {
        let params = UploadParams {
            stpd_id: 3,
            project_id: 4,
            ..Default::default()
        };

        let first = params.to_query("u-1");
        let second = params.to_query("u-1");
        let guid = |q: &[(&str, String)]| q.iter().find(|(k, _)| *k == "guid").map(|(_, v)| v.clone());

        assert!(guid(&first).unwrap().parse::<Uuid>().is_ok());
        assert_ne!(guid(&first), guid(&second));

        let fixed = Uuid::new_v4();
        let params = UploadParams { guid: Some(fixed), ..params };
        assert_eq!(guid(&params.to_query("u-1")), Some(fixed.to_string()));
    }
}
