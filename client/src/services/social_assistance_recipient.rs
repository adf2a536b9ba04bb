//! Recipient application service, including the approval decisions.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::{Page, PageRequest, SearchTerm};
use serde_json::{json, Value};

use crate::domain::error::ApiError;
use crate::domain::social_assistance_recipient::{
    ApprovalPayload, RecipientPayload, RejectionPayload, SocialAssistanceRecipient,
};
use crate::http::classifier::ClassifyOptions;
use crate::http::transport::{file_field, text_field, HttpTransport};
use crate::notify::{messages, Notification};
use crate::query::controller::{PageFetcher, PaginatedQuery, PaginatedQueryBuilder};
use crate::services::crud::CrudService;
use crate::services::{decode, ServiceDeps};

const PATH: &str = "social-assistance-recipient";

/// Typed operations for recipient applications.
pub struct RecipientService<T> {
    crud: CrudService<T>,
}

impl<T: HttpTransport + 'static> RecipientService<T> {
    /// Service over the shared dependencies.
    #[must_use]
    pub fn new(deps: ServiceDeps<T>) -> Self {
        Self {
            crud: CrudService::new(deps, PATH),
        }
    }

    /// List controller builder for this entity.
    #[must_use]
    pub fn query_builder(self: &Arc<Self>) -> PaginatedQueryBuilder {
        PaginatedQuery::builder(
            Arc::clone(self) as Arc<dyn PageFetcher>,
            self.crud.keys(),
            Arc::clone(&self.crud.deps().cache),
        )
    }

    /// Fetch one application.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] per the taxonomy.
    pub async fn fetch_by_id(&self, id: &str) -> Result<SocialAssistanceRecipient, ApiError> {
        let record = self.crud.fetch_detail(id).await?;
        decode(&record)
    }

    /// Submit a new application.
    ///
    /// # Errors
    ///
    /// Validation failures bubble with their field map for form binding.
    pub async fn create(&self, payload: &RecipientPayload) -> Result<Value, ApiError> {
        let body = serde_json::to_value(payload)
            .map_err(|error| ApiError::decode(error.to_string()))?;
        self.crud.create_json(body).await
    }

    /// Approve an application; the transfer proof travels as a file part.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] per the taxonomy after surfacing it.
    pub async fn approve(&self, id: &str, payload: ApprovalPayload) -> Result<Value, ApiError> {
        let fields = vec![
            text_field("status", "approved"),
            file_field("proof", payload.proof),
        ];
        let result = self
            .crud
            .deps()
            .client
            .post_multipart(&format!("{PATH}/{id}/approve"), fields)
            .await;
        self.after_decision(id, result, messages::RECIPIENT_APPROVED)
    }

    /// Reject an application with its mandatory reason.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] per the taxonomy after surfacing it.
    pub async fn reject(&self, id: &str, payload: &RejectionPayload) -> Result<Value, ApiError> {
        let body = json!({
            "status": "reject",
            "rejection_reason": payload.reason(),
        });
        let result = self
            .crud
            .deps()
            .client
            .post_json(&format!("{PATH}/{id}/reject"), body)
            .await;
        self.after_decision(id, result, messages::RECIPIENT_REJECTED)
    }

    /// Delete an application.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] per the taxonomy.
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.crud.delete(id).await
    }

    fn after_decision(
        &self,
        id: &str,
        result: Result<Value, ApiError>,
        success_message: &str,
    ) -> Result<Value, ApiError> {
        let deps = self.crud.deps();
        match result {
            Ok(body) => {
                deps.cache.invalidate_prefix(&self.crud.keys().lists());
                deps.cache.invalidate_prefix(&self.crud.keys().detail(id));
                deps.sink.notify(Notification::success(success_message));
                Ok(body)
            }
            Err(error) => {
                deps.classifier
                    .handle(&error, &ClassifyOptions::for_context("recipient-decision"));
                Err(error)
            }
        }
    }
}

#[async_trait]
impl<T: HttpTransport + 'static> PageFetcher for RecipientService<T> {
    async fn fetch_page(
        &self,
        request: PageRequest,
        search: Option<&SearchTerm>,
    ) -> Result<Page<Value>, ApiError> {
        self.crud.fetch_page(request, search).await
    }
}
