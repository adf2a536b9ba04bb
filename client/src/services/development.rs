//! Development project service.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::{Page, PageRequest, SearchTerm};
use serde_json::Value;

use crate::domain::development::{parse_display_amount, Development, DevelopmentPayload};
use crate::domain::error::ApiError;
use crate::http::transport::{file_field, text_field, FormField, HttpTransport};
use crate::query::controller::{PageFetcher, PaginatedQueryBuilder, PaginatedQuery};
use crate::services::crud::CrudService;
use crate::services::{decode, ServiceDeps};

const PATH: &str = "development";

/// Typed operations for development projects.
pub struct DevelopmentService<T> {
    crud: CrudService<T>,
}

impl<T: HttpTransport + 'static> DevelopmentService<T> {
    /// Service over the shared dependencies.
    #[must_use]
    pub fn new(deps: ServiceDeps<T>) -> Self {
        Self {
            crud: CrudService::new(deps, PATH),
        }
    }

    /// List controller builder for this entity; callers attach their
    /// permission gate and page size before building.
    #[must_use]
    pub fn query_builder(self: &Arc<Self>) -> PaginatedQueryBuilder {
        PaginatedQuery::builder(
            Arc::clone(self) as Arc<dyn PageFetcher>,
            self.crud.keys(),
            Arc::clone(&self.crud.deps().cache),
        )
    }

    /// Fetch one project.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] per the taxonomy.
    pub async fn fetch_by_id(&self, id: &str) -> Result<Development, ApiError> {
        let record = self.crud.fetch_detail(id).await?;
        decode(&record)
    }

    /// Create a project; the thumbnail travels as a file part.
    ///
    /// # Errors
    ///
    /// Validation failures bubble with their field map for form binding.
    pub async fn create(&self, payload: &DevelopmentPayload) -> Result<Development, ApiError> {
        let mut fields = self.form_fields(payload)?;
        if let Some(amount) = payload.amount {
            fields.push(text_field("amount", amount.to_string()));
        }
        let body = self.crud.create_multipart(fields).await?;
        decode(body.get("data").unwrap_or(&Value::Null))
    }

    /// Update a project. The amount is not a form input on edit: the
    /// stored display value is parsed and re-sent instead.
    ///
    /// # Errors
    ///
    /// See [`DevelopmentService::create`].
    pub async fn update(
        &self,
        id: &str,
        payload: &DevelopmentPayload,
        original_amount: &str,
    ) -> Result<Value, ApiError> {
        let mut fields = self.form_fields(payload)?;
        let amount = parse_display_amount(original_amount).unwrap_or(0);
        fields.push(text_field("amount", amount.to_string()));
        self.crud.update_multipart(id, fields).await
    }

    /// Delete a project.
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

    fn form_fields(&self, payload: &DevelopmentPayload) -> Result<Vec<FormField>, ApiError> {
        let mut fields: Vec<FormField> = payload
            .text_fields()
            .map_err(|error| {
                use crate::domain::development::DevelopmentPayloadError;
                let field = match error {
                    DevelopmentPayloadError::InvalidStartDate => "start_date",
                    DevelopmentPayloadError::DaysNeededOutOfRange => "days_needed",
                };
                ApiError::Validation {
                    errors: std::collections::BTreeMap::from([(
                        field.to_owned(),
                        vec![error.to_string()],
                    )]),
                }
            })?
            .into_iter()
            .map(|(name, value)| text_field(name, value))
            .collect();
        if let Some(thumbnail) = &payload.thumbnail {
            fields.push(file_field("thumbnail", thumbnail.clone()));
        }
        Ok(fields)
    }
}

#[async_trait]
impl<T: HttpTransport + 'static> PageFetcher for DevelopmentService<T> {
    async fn fetch_page(
        &self,
        request: PageRequest,
        search: Option<&SearchTerm>,
    ) -> Result<Page<Value>, ApiError> {
        self.crud.fetch_page(request, search).await
    }
}
