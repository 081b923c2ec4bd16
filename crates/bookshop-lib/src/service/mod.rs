//! Synchronization service
//!
//! `SyncService` turns criteria into searches, keeps the identity cache for
//! fetch-by-id, publishes results and errors on broadcast channels, and
//! guards updates with the entity's version in `If-Match`.
//!
//! Every operation issues at most one request and makes no retry. Two
//! overlapping calls are not coalesced: each publishes when it completes,
//! so the last one to complete determines what subscribers saw last.

use reqwest::header::{ACCEPT, ETAG, IF_MATCH, LOCATION};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::cache::IdentityCache;
use crate::channel::{BroadcastChannel, ChannelStream, Subscription};
use crate::chart::{build_chart, ChartKind, ChartSurface};
use crate::config::ClientConfig;
use crate::criteria::{QueryParams, SearchCriteria};
use crate::error::{ErrorValue, SyncError, SyncResult};
use crate::mapper::{map_record, map_records};
use crate::models::{Buch, Entity, Kunde};
use crate::observability::SyncMetrics;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Transport};


pub type BuchService = SyncService<Buch>;
pub type KundeService = SyncService<Kunde>;

/// `If-Match` value for a version token; quoted and weak tokens are kept as they are
pub fn if_match_value(version: &str) -> String {
    let version = version.trim();
    if version.starts_with('"') || version.starts_with("W/\"") {
        version.to_string()
    } else {
        format!("\"{}\"", version)
    }
}

/// Entity access and synchronization for one collection
pub struct SyncService<E: Entity> {
    transport: Arc<dyn Transport>,
    cache: IdentityCache<E>,
    list_channel: BroadcastChannel<Vec<E>>,
    entity_channel: BroadcastChannel<E>,
    error_channel: BroadcastChannel<ErrorValue>,
    metrics: SyncMetrics,
}

impl<E: Entity> SyncService<E> {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        debug!(collection = E::COLLECTION, "Creating synchronization service");
        Self {
            transport,
            cache: IdentityCache::new(),
            list_channel: BroadcastChannel::new(),
            entity_channel: BroadcastChannel::new(),
            error_channel: BroadcastChannel::new(),
            metrics: SyncMetrics::new(),
        }
    }

    /// Create a service talking HTTP to the configured base URI
    pub fn from_config(config: &ClientConfig) -> SyncResult<Self> {
        let transport = HttpTransport::new(config)?;
        info!(base_uri = %transport.base_url(), collection = E::COLLECTION, "Service configured");
        Ok(Self::new(Arc::new(transport)))
    }

    /// Subscribe to search results
    pub fn subscribe_list<F>(&self, next: F) -> Subscription
    where
        F: Fn(&Vec<E>) + Send + Sync + 'static,
    {
        self.list_channel.subscribe(next)
    }

    /// Subscribe to single entities from fetch-by-id
    pub fn subscribe_entity<F>(&self, next: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.entity_channel.subscribe(next)
    }

    /// Subscribe to read failures
    pub fn subscribe_error<F>(&self, next: F) -> Subscription
    where
        F: Fn(&ErrorValue) + Send + Sync + 'static,
    {
        self.error_channel.subscribe(next)
    }

    pub fn list_stream(&self) -> ChannelStream<Vec<E>> {
        self.list_channel.stream()
    }

    pub fn entity_stream(&self) -> ChannelStream<E> {
        self.entity_channel.stream()
    }

    pub fn error_stream(&self) -> ChannelStream<ErrorValue> {
        self.error_channel.stream()
    }

    /// Put an entity into the identity cache, replacing whatever was there
    pub fn set_cached(&self, entity: E) {
        debug!(id = ?entity.id(), "Replacing cached entity");
        self.cache.replace(entity);
    }

    pub fn cached(&self) -> Option<E> {
        self.cache.current()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Search the collection and publish the result list.
    ///
    /// Failures go to the error channel and leave the list channel untouched.
    pub async fn find(&self, criteria: &E::Criteria) {
        let query = criteria.to_query();
        debug!(collection = E::COLLECTION, query = %query.to_query_string(), "find");

        match self.fetch_list("find", query).await {
            Ok(entities) => {
                debug!(count = entities.len(), "find: publishing result list");
                self.list_channel.publish(&entities);
            }
            Err(err) => self.publish_read_failure("find", &err),
        }
    }

    /// Fetch one entity and publish it, serving the cached copy when its identity matches.
    ///
    /// A response without body or without `ETag` is dropped: neither the
    /// cache nor any channel sees it.
    pub async fn find_by_id(&self, id: Option<&str>) {
        let Some(id) = id else {
            debug!("find_by_id: no id given");
            return;
        };

        if let Some(cached) = self.cache.get(id) {
            debug!(id = %id, "find_by_id: serving cached entity");
            self.metrics.inc_cache_hits();
            self.entity_channel.publish(&cached);
            return;
        }

        let request = HttpRequest::get(E::COLLECTION).segment(id);
        let started = Instant::now();
        let result = self.transport.execute(request).await;
        let elapsed = started.elapsed().as_secs_f64();

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.metrics.record_request("find_by_id", "failed", elapsed);
                self.publish_read_failure("find_by_id", &err);
                return;
            }
        };

        match self.accept_entity(id, &response) {
            Ok(Some(entity)) => {
                self.metrics.record_request("find_by_id", "delivered", elapsed);
                self.cache.replace(entity.clone());
                self.entity_channel.publish(&entity);
            }
            Ok(None) => {
                warn!(id = %id, status = response.status, "find_by_id: response without body or ETag dropped");
                self.metrics.record_request("find_by_id", "dropped", elapsed);
                self.metrics.inc_dropped_responses();
            }
            Err(err) => {
                self.metrics.record_request("find_by_id", "failed", elapsed);
                self.publish_read_failure("find_by_id", &err);
            }
        }
    }

    /// Create an entity; `on_success` receives the `Location` header.
    ///
    /// Server failures reach `on_error` with status and error body. Local
    /// failures are only logged.
    pub async fn save<S, F>(&self, entity: &E, on_success: S, on_error: F)
    where
        S: FnOnce(Option<String>) + Send,
        F: FnOnce(u16, Option<Value>) + Send,
    {
        let body = match serde_json::to_value(entity) {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "save: entity cannot be serialized");
                return;
            }
        };

        let request = HttpRequest::post(E::COLLECTION)
            .header(ACCEPT, "text/plain")
            .json(body);

        match self.execute_timed("save", request).await {
            Ok(response) => {
                let location = response.header(&LOCATION).map(str::to_string);
                info!(collection = E::COLLECTION, location = ?location, "Entity created");
                on_success(location);
            }
            Err(SyncError::Http { status, body }) => on_error(status, body),
            Err(err) => log_swallowed_failure("save", &err),
        }
    }

    /// Update an entity guarded by its version.
    ///
    /// An entity without version is a caller bug: the update is aborted with
    /// an error log and neither callback runs.
    pub async fn update<S, F>(&self, entity: &E, on_success: S, on_error: F)
    where
        S: FnOnce() + Send,
        F: FnOnce(u16, Option<Value>) + Send,
    {
        let Some(version) = entity.version() else {
            let err = SyncError::MissingVersion {
                id: entity.id().unwrap_or("-").to_string(),
            };
            error!(error = %err, "update aborted");
            return;
        };
        let Some(id) = entity.id() else {
            let err = SyncError::MissingIdentity;
            error!(error = %err, "update aborted");
            return;
        };

        let body = match serde_json::to_value(entity) {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, id = %id, "update: entity cannot be serialized");
                return;
            }
        };

        let request = HttpRequest::put(E::COLLECTION)
            .segment(id)
            .header(ACCEPT, "text/plain")
            .header(IF_MATCH, if_match_value(version))
            .json(body);

        match self.execute_timed("update", request).await {
            Ok(_) => {
                info!(id = %id, version = %version, "Entity updated");
                on_success();
            }
            Err(SyncError::Http { status, body }) => {
                if status == 409 || status == 412 {
                    warn!(id = %id, version = %version, status, "update rejected: version conflict");
                }
                on_error(status, body)
            }
            Err(err) => log_swallowed_failure("update", &err),
        }
    }

    /// Delete an entity; server failures reach `on_error` with the status only
    pub async fn remove<S, F>(&self, entity: &E, on_success: S, on_error: F)
    where
        S: FnOnce() + Send,
        F: FnOnce(u16) + Send,
    {
        let Some(id) = entity.id() else {
            let err = SyncError::MissingIdentity;
            error!(error = %err, "remove aborted");
            return;
        };

        let request = HttpRequest::delete(E::COLLECTION).segment(id);
        match self.execute_timed("remove", request).await {
            Ok(_) => {
                info!(id = %id, "Entity deleted");
                on_success();
            }
            Err(SyncError::Http { status, .. }) => on_error(status),
            Err(err) => log_swallowed_failure("remove", &err),
        }
    }

    pub async fn create_bar_chart<S: ChartSurface + ?Sized>(&self, surface: &S) {
        self.create_chart(ChartKind::Bar, surface).await
    }

    pub async fn create_linear_chart<S: ChartSurface + ?Sized>(&self, surface: &S) {
        self.create_chart(ChartKind::Line, surface).await
    }

    pub async fn create_pie_chart<S: ChartSurface + ?Sized>(&self, surface: &S) {
        self.create_chart(ChartKind::Pie, surface).await
    }

    /// Load the full collection and hand a chart of it to `surface`.
    ///
    /// No channel is involved; failures are logged.
    async fn create_chart<S: ChartSurface + ?Sized>(&self, kind: ChartKind, surface: &S) {
        match self.fetch_list("chart", QueryParams::new()).await {
            Ok(entities) => {
                let config = build_chart(kind, &entities);
                debug!(kind = %kind, labels = ?config.data.labels, "Drawing chart");
                surface.draw(config);
            }
            Err(err) => warn!(kind = %kind, error = %err, "Chart data unavailable"),
        }
    }

    async fn fetch_list(&self, operation: &str, query: QueryParams) -> SyncResult<Vec<E>> {
        let request = HttpRequest::get(E::COLLECTION).query(query);
        let response = self.execute_timed(operation, request).await?;
        let body = response.json_body().map_err(|source| SyncError::Decode {
            status: response.status,
            source,
        })?;

        match body {
            Some(raw) => map_records(raw).map_err(|source| SyncError::Decode {
                status: response.status,
                source,
            }),
            None => Ok(Vec::new()),
        }
    }

    /// Map a fetch-one response; `Ok(None)` when body or `ETag` is missing
    fn accept_entity(&self, id: &str, response: &HttpResponse) -> SyncResult<Option<E>> {
        let body = response.json_body().map_err(|source| SyncError::Decode {
            status: response.status,
            source,
        })?;
        let version = response.header(&ETAG).map(str::to_string);

        let (Some(body), Some(version)) = (body, version) else {
            return Ok(None);
        };

        let mut entity: E = map_record(body, None).map_err(|source| SyncError::Decode {
            status: response.status,
            source,
        })?;
        entity.assign_identity(id.to_string(), Some(version));
        Ok(Some(entity))
    }

    async fn execute_timed(&self, operation: &str, request: HttpRequest) -> SyncResult<HttpResponse> {
        let started = Instant::now();
        let result = self.transport.execute(request).await;
        let outcome = if result.is_ok() { "delivered" } else { "failed" };
        self.metrics
            .record_request(operation, outcome, started.elapsed().as_secs_f64());
        result
    }

    fn publish_read_failure(&self, operation: &str, err: &SyncError) {
        if err.is_local() {
            warn!(operation, error = %err, "Client-side or network failure");
        } else {
            debug!(operation, error = %err, "Request failed");
        }
        self.error_channel.publish(&err.channel_value());
    }
}

fn log_swallowed_failure(operation: &str, err: &SyncError) {
    warn!(operation, error = %err, "Client-side or network failure, caller not notified");
}
