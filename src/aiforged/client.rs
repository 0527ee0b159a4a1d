use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::sync::Arc;

use super::config::Config;
use super::types::{
    ClientError, DocumentExtraction, DocumentFilter, DocumentViewModel, RemoteResponse,
    UploadParams, UploadedFile, UserViewModel,
};
use super::{AccountApi, DocumentApi, ParametersApi, ServicesApi};

const GET_CURRENT_USER: &str = "Account/GetCurrentUser";
const GET_EXTENDED: &str = "Document/GetExtended";
const UPLOAD_FILE: &str = "Document/UploadFile";
const GET_DOCUMENT: &str = "Document/GetDocument";
const UPDATE_DOCUMENT: &str = "Document/Update";
const DELETE_DOCUMENT: &str = "Document/Delete";
const EXTRACT: &str = "Parameters/Extract";
const PROCESS: &str = "Services/Process";

fn path(operation: &str) -> String {
    format!("api/{}", operation)
}

pub struct AccountClient {
    config: Arc<Config>,
}

impl AccountClient {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl AccountApi for AccountClient {
    async fn get_current_user(&self) -> Result<RemoteResponse<UserViewModel>, ClientError> {
        let url = self.config.endpoint(&path(GET_CURRENT_USER))?;
        self.config
            .send(GET_CURRENT_USER, self.config.http().get(url))
            .await
    }
}

pub struct DocumentClient {
    config: Arc<Config>,
}

impl DocumentClient {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DocumentApi for DocumentClient {
    async fn get_extended(
        &self,
        filter: &DocumentFilter,
    ) -> Result<RemoteResponse<Vec<DocumentViewModel>>, ClientError> {
        let url = self.config.endpoint(&path(GET_EXTENDED))?;
        let request = self.config.http().get(url).query(&filter.to_query());
        self.config.send(GET_EXTENDED, request).await
    }

    async fn upload_file(
        &self,
        user_id: &str,
        params: &UploadParams,
        file: UploadedFile,
    ) -> Result<RemoteResponse<Vec<DocumentViewModel>>, ClientError> {
        let url = self.config.endpoint(&path(UPLOAD_FILE))?;

        log::debug!("📤 Uploading {} ({} bytes)", file.filename, file.bytes.len());

        let part = Part::bytes(file.bytes)
            .file_name(file.filename)
            .mime_str("application/octet-stream")
            .map_err(|source| ClientError::Http {
                operation: UPLOAD_FILE,
                source,
            })?;
        let form = Form::new().part("file", part);

        let request = self
            .config
            .http()
            .post(url)
            .query(&params.to_query(user_id))
            .multipart(form);
        self.config.send(UPLOAD_FILE, request).await
    }

    async fn get_document(
        &self,
        id: i32,
    ) -> Result<RemoteResponse<DocumentViewModel>, ClientError> {
        let url = self.config.endpoint(&path(GET_DOCUMENT))?;
        let request = self.config.http().get(url).query(&[("id", id)]);
        self.config.send(GET_DOCUMENT, request).await
    }

    async fn update(
        &self,
        document: &DocumentViewModel,
    ) -> Result<RemoteResponse<DocumentViewModel>, ClientError> {
        let url = self.config.endpoint(&path(UPDATE_DOCUMENT))?;
        let request = self.config.http().put(url).json(document);
        self.config.send(UPDATE_DOCUMENT, request).await
    }

    async fn delete(
        &self,
        id: i32,
        delete_recursive: bool,
        delete_only_children: bool,
    ) -> Result<RemoteResponse<()>, ClientError> {
        let url = self.config.endpoint(&path(DELETE_DOCUMENT))?;
        let request = self.config.http().delete(url).query(&[
            ("id", id.to_string()),
            ("deleteRecursive", delete_recursive.to_string()),
            ("deleteOnlyChildren", delete_only_children.to_string()),
        ]);
        self.config.send_unit(DELETE_DOCUMENT, request).await
    }
}

pub struct ParametersClient {
    config: Arc<Config>,
}

impl ParametersClient {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ParametersApi for ParametersClient {
    async fn extract(
        &self,
        doc_id: i32,
    ) -> Result<RemoteResponse<Vec<DocumentExtraction>>, ClientError> {
        let url = self.config.endpoint(&path(EXTRACT))?;
        let request = self.config.http().get(url).query(&[("docId", doc_id)]);
        self.config.send(EXTRACT, request).await
    }
}

pub struct ServicesClient {
    config: Arc<Config>,
}

impl ServicesClient {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ServicesApi for ServicesClient {
    async fn process(
        &self,
        user_id: &str,
        project_id: i32,
        stpd_id: i32,
        doc_ids: &[i32],
    ) -> Result<RemoteResponse<()>, ClientError> {
        let url = self.config.endpoint(&path(PROCESS))?;
        let request = self
            .config
            .http()
            .post(url)
            .query(&[
                ("userId", user_id.to_string()),
                ("projectId", project_id.to_string()),
                ("stpdId", stpd_id.to_string()),
            ])
            .json(doc_ids);
        self.config.send_unit(PROCESS, request).await
    }
}
