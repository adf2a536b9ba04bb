//! Social-assistance program service.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::{Page, PageRequest, SearchTerm};
use serde_json::Value;

use crate::domain::error::ApiError;
use crate::domain::social_assistance::{SocialAssistance, SocialAssistancePayload};
use crate::http::transport::{file_field, text_field, FormField, HttpTransport};
use crate::query::controller::{PageFetcher, PaginatedQuery, PaginatedQueryBuilder};
use crate::services::crud::CrudService;
use crate::services::{decode, ServiceDeps};

const PATH: &str = "social-assistance";

/// Typed operations for social-assistance programs.
pub struct SocialAssistanceService<T> {
    crud: CrudService<T>,
}

impl<T: HttpTransport + 'static> SocialAssistanceService<T> {
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

    /// Fetch one program.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] per the taxonomy.
    pub async fn fetch_by_id(&self, id: &str) -> Result<SocialAssistance, ApiError> {
        let record = self.crud.fetch_detail(id).await?;
        decode(&record)
    }

    /// Create a program.
    ///
    /// # Errors
    ///
    /// Validation failures bubble with their field map for form binding.
    pub async fn create(&self, payload: &SocialAssistancePayload) -> Result<Value, ApiError> {
        self.crud.create_multipart(form_fields(payload)).await
    }

    /// Update a program via the `_method=PUT` override.
    ///
    /// # Errors
    ///
    /// See [`SocialAssistanceService::create`].
    pub async fn update(
        &self,
        id: &str,
        payload: &SocialAssistancePayload,
    ) -> Result<Value, ApiError> {
        self.crud.update_multipart(id, form_fields(payload)).await
    }

    /// Delete a program.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] per the taxonomy.
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.crud.delete(id).await
    }

    /// Optimistic delete with exact rollback on failure.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`ApiError`] after restoring the cache.
    pub async fn delete_optimistic(&self, id: &str) -> Result<(), ApiError> {
        self.crud.delete_optimistic(id).await
    }
}

fn form_fields(payload: &SocialAssistancePayload) -> Vec<FormField> {
    let mut fields: Vec<FormField> = payload
        .text_fields()
        .into_iter()
        .map(|(name, value)| text_field(name, value))
        .collect();
    if let Some(thumbnail) = &payload.thumbnail {
        fields.push(file_field("thumbnail", thumbnail.clone()));
    }
    fields
}

#[async_trait]
impl<T: HttpTransport + 'static> PageFetcher for SocialAssistanceService<T> {
    async fn fetch_page(
        &self,
        request: PageRequest,
        search: Option<&SearchTerm>,
    ) -> Result<Page<Value>, ApiError> {
        self.crud.fetch_page(request, search).await
    }
}
