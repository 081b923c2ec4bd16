//! Client library for the bookshop REST API
//!
//! This crate provides the entity access and synchronization layer for
//! books ("Buch") and customers ("Kunde"):
//! - Search criteria encoding into query parameters
//! - Mapping of server records (including self-links and ETags) into entities
//! - Broadcast channels for search results, single entities and errors
//! - A single-slot identity cache for fetch-by-id
//! - Optimistic concurrency on updates via `If-Match`
//! - Chart configurations derived from the full collection

pub mod cache;
pub mod channel;
pub mod chart;
pub mod config;
pub mod criteria;
pub mod error;
pub mod mapper;
pub mod models;
pub mod observability;
pub mod service;
pub mod transport;

pub use cache::IdentityCache;
pub use channel::{BroadcastChannel, ChannelStream, Subscription};
pub use chart::{ChartConfig, ChartKind, ChartSurface, Dataset};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use criteria::{QueryParams, SearchCriteria};
pub use error::{describe_search_error, ErrorValue, SyncError, SyncResult};
pub use models::{Buch, BuchArt, BuchCriteria, Entity, Geschlecht, Kunde, KundeCriteria, Verlag};
pub use observability::SyncMetrics;
pub use service::{BuchService, KundeService, SyncService};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport};
