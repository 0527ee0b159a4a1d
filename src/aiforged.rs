//! Typed access to the AIForged document-processing API.
//!
//! The platform is reached through four sub-clients grouped in a [`Context`]. Each
//! sub-client sits behind a trait so handlers can be exercised without the network.

pub mod client;
pub mod config;
pub mod types;

use async_trait::async_trait;
use std::sync::Arc;

pub use client::{AccountClient, DocumentClient, ParametersClient, ServicesClient};
pub use config::Config;
pub use types::*;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn get_current_user(&self) -> Result<RemoteResponse<UserViewModel>, ClientError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentApi: Send + Sync {
    async fn get_extended(
        &self,
        filter: &DocumentFilter,
    ) -> Result<RemoteResponse<Vec<DocumentViewModel>>, ClientError>;

    async fn upload_file(
        &self,
        user_id: &str,
        params: &UploadParams,
        file: UploadedFile,
    ) -> Result<RemoteResponse<Vec<DocumentViewModel>>, ClientError>;

    async fn get_document(&self, id: i32)
        -> Result<RemoteResponse<DocumentViewModel>, ClientError>;

    async fn update(
        &self,
        document: &DocumentViewModel,
    ) -> Result<RemoteResponse<DocumentViewModel>, ClientError>;

    async fn delete(
        &self,
        id: i32,
        delete_recursive: bool,
        delete_only_children: bool,
    ) -> Result<RemoteResponse<()>, ClientError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParametersApi: Send + Sync {
    async fn extract(
        &self,
        doc_id: i32,
    ) -> Result<RemoteResponse<Vec<DocumentExtraction>>, ClientError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServicesApi: Send + Sync {
    async fn process(
        &self,
        user_id: &str,
        project_id: i32,
        stpd_id: i32,
        doc_ids: &[i32],
    ) -> Result<RemoteResponse<()>, ClientError>;
}

/// The sub-clients every handler works with, plus the identity confirmed at startup.
///
/// Immutable once built; shared across workers through `web::Data`.
#[derive(Clone)]
pub struct Context {
    pub account: Arc<dyn AccountApi>,
    pub documents: Arc<dyn DocumentApi>,
    pub parameters: Arc<dyn ParametersApi>,
    pub services: Arc<dyn ServicesApi>,
    current_user_id: Option<String>,
}

impl Context {
    pub fn new(config: Arc<Config>) -> Self {
        Self::from_parts(
            Arc::new(AccountClient::new(config.clone())),
            Arc::new(DocumentClient::new(config.clone())),
            Arc::new(ParametersClient::new(config.clone())),
            Arc::new(ServicesClient::new(config)),
        )
    }

    pub fn from_parts(
        account: Arc<dyn AccountApi>,
        documents: Arc<dyn DocumentApi>,
        parameters: Arc<dyn ParametersApi>,
        services: Arc<dyn ServicesApi>,
    ) -> Self {
        Self {
            account,
            documents,
            parameters,
            services,
            current_user_id: None,
        }
    }

    pub fn with_current_user(mut self, user_id: impl Into<String>) -> Self {
        self.current_user_id = Some(user_id.into());
        self
    }

    /// Id of the account the API key belongs to, as confirmed by [`Context::authenticate`].
    pub fn current_user_id(&self) -> Option<&str> {
        self.current_user_id.as_deref()
    }

    /// Confirms the API key works by fetching the current user once.
    ///
    /// Called at startup; any failure is fatal for the process.
    pub async fn authenticate(self) -> Result<(Self, UserViewModel), ClientError> {
        let response = self.account.get_current_user().await?;
        let user = response
            .result
            .ok_or(ClientError::EmptyResult("Account/GetCurrentUser"))?;

        let context = self.with_current_user(user.id.clone());
        Ok((context, user))
    }
}

#[cfg(test)]
pub mod testing {
    //! Context assembly for handler tests.

    use super::*;

    pub struct MockContext {
        pub account: MockAccountApi,
        pub documents: MockDocumentApi,
        pub parameters: MockParametersApi,
        pub services: MockServicesApi,
    }

    impl MockContext {
        pub fn new() -> Self {
            Self {
                account: MockAccountApi::new(),
                documents: MockDocumentApi::new(),
                parameters: MockParametersApi::new(),
                services: MockServicesApi::new(),
            }
        }

        pub fn build(self) -> Context {
            Context::from_parts(
                Arc::new(self.account),
                Arc::new(self.documents),
                Arc::new(self.parameters),
                Arc::new(self.services),
            )
        }
    }

    pub fn user(id: &str) -> UserViewModel {
        UserViewModel {
            id: id.to_string(),
            email: Some(format!("{}@example.com", id)),
            user_name: None,
            full_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{user, MockContext};
    use super::*;

    #[tokio::test]
    async fn test_authenticate_records_current_user() {
        let mut mocks = MockContext::new();
        mocks
            .account
            .expect_get_current_user()
            .times(1)
            .returning(|| Ok(RemoteResponse::ok(user("u-42"))));

        let (context, user) = mocks.build().authenticate().await.unwrap();
        assert_eq!(user.id, "u-42");
        assert_eq!(context.current_user_id(), Some("u-42"));
    }

    #[tokio::test]
    async fn test_authenticate_fails_without_user() {
        let mut mocks = MockContext::new();
        mocks
            .account
            .expect_get_current_user()
            .returning(|| Ok(RemoteResponse::empty(200)));

        let err = mocks.build().authenticate().await.err().unwrap();
        assert!(matches!(err, ClientError::EmptyResult(_)));
    }

    #[tokio::test]
    async fn test_authenticate_propagates_rejection() {
        let mut mocks = MockContext::new();
        mocks.account.expect_get_current_user().returning(|| {
            Err(ClientError::Status {
                operation: "Account/GetCurrentUser",
                status: 401,
                body: "Invalid API key".into(),
            })
        });

        let err = mocks.build().authenticate().await.err().unwrap();
        assert_eq!(err.status(), Some(401));
    }
}
