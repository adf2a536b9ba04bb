//! Shared CRUD core every entity service composes.
//!
//! Owns the list/detail fetch paths and the mutation contract: invalidate
//! exactly the entity's list entries plus the touched detail entry on
//! success, leave the cache untouched on failure, and for optimistic
//! deletes roll back to the exact pre-mutation snapshot before notifying.

use pagination::{parse_page, Page, PageRequest, SearchTerm};
use serde_json::Value;
use tracing::{info, warn};

use crate::domain::error::ApiError;
use crate::http::classifier::ClassifyOptions;
use crate::http::transport::{text_field, FormField, HttpTransport};
use crate::notify::{messages, Notification};
use crate::query::keys::QueryKeys;
use crate::services::{data_field, ServiceDeps};

/// CRUD operations for one entity path.
pub struct CrudService<T> {
    deps: ServiceDeps<T>,
    path: &'static str,
    keys: QueryKeys,
}

impl<T: HttpTransport> CrudService<T> {
    /// Core over an entity path such as `"development"`.
    #[must_use]
    pub fn new(deps: ServiceDeps<T>, path: &'static str) -> Self {
        Self {
            deps,
            path,
            keys: QueryKeys::new(path),
        }
    }

    /// Key builders for this entity.
    #[must_use]
    pub fn keys(&self) -> QueryKeys {
        self.keys
    }

    /// Shared dependencies, for composing services.
    #[must_use]
    pub fn deps(&self) -> &ServiceDeps<T> {
        &self.deps
    }

    /// Fetch one validated list page.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] for a malformed envelope; never
    /// partial data.
    pub async fn fetch_page(
        &self,
        request: PageRequest,
        search: Option<&SearchTerm>,
    ) -> Result<Page<Value>, ApiError> {
        let mut query = vec![
            ("page".to_owned(), request.page().to_string()),
            ("per_page".to_owned(), request.per_page().to_string()),
        ];
        if let Some(term) = search {
            query.push(("search".to_owned(), term.as_str().to_owned()));
        }

        let body = self
            .deps
            .client
            .get(&format!("{}/all/paginated", self.path), query)
            .await?;
        let envelope = data_field(&body)?;
        let page = parse_page::<Value>(envelope)
            .map_err(|error| ApiError::decode(error.to_string()))?;

        info!(
            entity = self.path,
            page = request.page(),
            count = page.items.len(),
            "fetched list page"
        );
        Ok(page)
    }

    /// Fetch one record and cache it under its detail key.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] per the taxonomy.
    pub async fn fetch_detail(&self, id: &str) -> Result<Value, ApiError> {
        let body = self
            .deps
            .client
            .get(&format!("{}/{id}", self.path), Vec::new())
            .await?;
        let record = data_field(&body)?.clone();
        self.deps
            .cache
            .put_detail(self.keys.detail(id), record.clone());
        Ok(record)
    }

    /// Create via multipart form.
    ///
    /// # Errors
    ///
    /// Validation failures bubble with their field map; other kinds are
    /// surfaced through the classifier before re-throwing.
    pub async fn create_multipart(&self, fields: Vec<FormField>) -> Result<Value, ApiError> {
        let result = self.deps.client.post_multipart(self.path, fields).await;
        self.after_create(result)
    }

    /// Create via JSON body.
    ///
    /// # Errors
    ///
    /// See [`CrudService::create_multipart`].
    pub async fn create_json(&self, body: Value) -> Result<Value, ApiError> {
        let result = self.deps.client.post_json(self.path, body).await;
        self.after_create(result)
    }

    /// Update via multipart form with the `_method=PUT` override.
    ///
    /// # Errors
    ///
    /// See [`CrudService::create_multipart`].
    pub async fn update_multipart(
        &self,
        id: &str,
        mut fields: Vec<FormField>,
    ) -> Result<Value, ApiError> {
        fields.insert(0, text_field("_method", "PUT"));
        let result = self
            .deps
            .client
            .post_multipart(&format!("{}/{id}", self.path), fields)
            .await;

        match result {
            Ok(body) => {
                self.invalidate(Some(id));
                self.deps.sink.notify(Notification::success(messages::UPDATED));
                Ok(body)
            }
            Err(error) => Err(self.surface(error)),
        }
    }

    /// Delete, invalidating on success only.
    ///
    /// # Errors
    ///
    /// See [`CrudService::create_multipart`].
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        match self
            .deps
            .client
            .delete(&format!("{}/{id}", self.path))
            .await
        {
            Ok(_) => {
                self.invalidate(Some(id));
                self.deps.sink.notify(Notification::success(messages::DELETED));
                Ok(())
            }
            Err(error) => Err(self.surface(error)),
        }
    }

    /// Optimistic delete: remove locally first, roll back to the exact
    /// snapshot when the server refuses.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`ApiError`] after restoring the cache.
    pub async fn delete_optimistic(&self, id: &str) -> Result<(), ApiError> {
        let mut snapshot = self.deps.cache.snapshot_prefix(&self.keys.lists());
        snapshot.extend(self.deps.cache.snapshot_prefix(&self.keys.detail(id)));

        self.deps.cache.remove_item_from_pages(&self.keys.lists(), id);
        self.deps.cache.remove(&self.keys.detail(id));

        match self
            .deps
            .client
            .delete(&format!("{}/{id}", self.path))
            .await
        {
            Ok(_) => {
                self.invalidate(Some(id));
                self.deps.sink.notify(Notification::success(messages::DELETED));
                Ok(())
            }
            Err(error) => {
                warn!(entity = self.path, id, "optimistic delete rolled back");
                self.deps.cache.restore(snapshot);
                self.deps.classifier.handle(
                    &error,
                    &ClassifyOptions {
                        show_notification: false,
                        ..ClassifyOptions::default()
                    },
                );
                self.deps
                    .sink
                    .notify(Notification::error(messages::DELETE_FAILED));
                Err(error)
            }
        }
    }

    fn after_create(&self, result: Result<Value, ApiError>) -> Result<Value, ApiError> {
        match result {
            Ok(body) => {
                self.invalidate(None);
                self.deps.sink.notify(Notification::success(messages::CREATED));
                Ok(body)
            }
            Err(error) => Err(self.surface(error)),
        }
    }

    fn invalidate(&self, id: Option<&str>) {
        self.deps.cache.invalidate_prefix(&self.keys.lists());
        if let Some(id) = id {
            self.deps.cache.invalidate_prefix(&self.keys.detail(id));
        }
    }

    fn surface(&self, error: ApiError) -> ApiError {
        self.deps
            .classifier
            .handle(&error, &ClassifyOptions::for_context("mutation"));
        error
    }
}

#[cfg(test)]
mod tests {
    //! Mutation-contract coverage, including optimistic rollback.

    use super::*;
    use crate::domain::ports::{MockNavigator, MockNotificationSink, MockTokenStore};
    use crate::http::classifier::ErrorClassifier;
    use crate::http::client::ApiClient;
    use crate::http::transport::{MockHttpTransport, RawResponse};
    use crate::notify::Level;
    use crate::query::cache::QueryCache;
    use pagination::PageMeta;
    use serde_json::json;
    use std::sync::Arc;

    fn page_of(ids: &[&str]) -> Page<Value> {
        Page {
            items: ids.iter().map(|id| json!({ "id": id })).collect(),
            meta: PageMeta {
                current_page: 1,
                from: Some(1),
                last_page: 1,
                per_page: 10,
                to: Some(ids.len() as u64),
                total: ids.len() as u64,
            },
        }
    }

    fn anonymous_tokens() -> MockTokenStore {
        let mut tokens = MockTokenStore::new();
        tokens.expect_get().returning(|| None);
        tokens
    }

    fn service_with(
        transport: MockHttpTransport,
        sink: MockNotificationSink,
    ) -> CrudService<MockHttpTransport> {
        let sink: Arc<dyn crate::domain::ports::NotificationSink> = Arc::new(sink);
        let client = Arc::new(ApiClient::new(
            Arc::new(transport),
            Arc::new(anonymous_tokens()),
            Arc::new(MockNavigator::new()),
            Arc::clone(&sink),
        ));
        let deps = ServiceDeps {
            client,
            cache: Arc::new(QueryCache::new()),
            classifier: Arc::new(ErrorClassifier::new(Arc::clone(&sink))),
            sink,
        };
        CrudService::new(deps, "development")
    }

    fn request() -> PageRequest {
        PageRequest::new(1, 10).expect("valid fixture request")
    }

    #[tokio::test]
    async fn successful_delete_invalidates_lists_and_detail() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .withf(|req| req.path == "development/d-1")
            .returning(|_| Ok(RawResponse { status: 200, body: Value::Null }));

        let mut sink = MockNotificationSink::new();
        sink.expect_notify()
            .times(1)
            .withf(|n| n.level == Level::Success)
            .return_const(());

        let service = service_with(transport, sink);
        let keys = service.keys();
        let key = keys.list(None, request());
        service.deps().cache.put_page(key.clone(), page_of(&["d-1", "d-2"]));

        service.delete("d-1").await.expect("delete succeeds");

        let (_, fresh) = service
            .deps()
            .cache
            .get_page(&key)
            .expect("entry kept for display");
        assert!(!fresh, "list entries must be stale after the mutation");
    }

    #[tokio::test]
    async fn failed_delete_leaves_cache_untouched() {
        let mut transport = MockHttpTransport::new();
        transport.expect_execute().returning(|_| {
            Ok(RawResponse {
                status: 500,
                body: json!({ "message": "boom" }),
            })
        });

        // One taxonomy notification from the classifier.
        let mut sink = MockNotificationSink::new();
        sink.expect_notify()
            .times(1)
            .withf(|n| n.level == Level::Error)
            .return_const(());

        let service = service_with(transport, sink);
        let keys = service.keys();
        let key = keys.list(None, request());
        service.deps().cache.put_page(key.clone(), page_of(&["d-1", "d-2"]));

        let error = service.delete("d-1").await.expect_err("delete fails");
        assert!(matches!(error, ApiError::Server { .. }));

        let (page, fresh) = service.deps().cache.get_page(&key).expect("entry kept");
        assert!(fresh, "a failed mutation must not invalidate");
        assert_eq!(page.items.len(), 2);
    }

    #[tokio::test]
    async fn failed_optimistic_delete_restores_the_exact_snapshot() {
        let mut transport = MockHttpTransport::new();
        transport.expect_execute().returning(|_| {
            Ok(RawResponse {
                status: 500,
                body: json!({ "message": "boom" }),
            })
        });

        // Exactly one failure notification for the optimistic path.
        let mut sink = MockNotificationSink::new();
        sink.expect_notify()
            .times(1)
            .withf(|n| n.level == Level::Error && n.message.contains("delete"))
            .return_const(());

        let service = service_with(transport, sink);
        let keys = service.keys();
        let key = keys.list(None, request());
        service
            .deps()
            .cache
            .put_page(key.clone(), page_of(&["a", "b", "c"]));
        service
            .deps()
            .cache
            .put_detail(keys.detail("b"), json!({ "id": "b" }));

        service
            .delete_optimistic("b")
            .await
            .expect_err("server refuses");

        let (page, _) = service.deps().cache.get_page(&key).expect("entry restored");
        let ids: Vec<&str> = page
            .items
            .iter()
            .filter_map(|item| item.get("id").and_then(Value::as_str))
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"], "same items, same order");
        assert!(
            service.deps().cache.get_detail(&keys.detail("b")).is_some(),
            "the detail entry comes back too",
        );
    }

    #[tokio::test]
    async fn malformed_list_envelope_is_a_fetch_failure() {
        let mut transport = MockHttpTransport::new();
        transport.expect_execute().returning(|_| {
            // Items present, metadata missing.
            Ok(RawResponse {
                status: 200,
                body: json!({ "data": { "data": [] } }),
            })
        });

        let mut sink = MockNotificationSink::new();
        sink.expect_notify().times(0);

        let service = service_with(transport, sink);
        let error = service
            .fetch_page(request(), None)
            .await
            .expect_err("malformed envelope must fail");
        assert!(matches!(error, ApiError::Decode { .. }));
    }

    #[tokio::test]
    async fn update_travels_as_post_with_method_override() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .withf(|req| {
                req.path == "development/d-1"
                    && matches!(
                        &req.body,
                        crate::http::transport::RequestBody::Multipart(fields)
                            if fields.first().is_some_and(|field| field.name == "_method")
                    )
            })
            .returning(|_| {
                Ok(RawResponse {
                    status: 200,
                    body: json!({ "data": { "id": "d-1" } }),
                })
            });

        let mut sink = MockNotificationSink::new();
        sink.expect_notify().times(1).return_const(());

        let service = service_with(transport, sink);
        service
            .update_multipart("d-1", vec![text_field("name", "Bridge")])
            .await
            .expect("update succeeds");
    }
}
