use std::sync::Arc;

use minigolf_core::booking::BookingDesk;
use minigolf_core::repository::{BookingRepository, CatalogRepository, ContactRepository};
use minigolf_store::app_config::{AuthConfig, RateLimitConfig};
use minigolf_store::{
    DbClient, InMemoryStore, PgBookingRepository, PgCatalogRepository, PgContactRepository,
    RedisClient,
};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogRepository>,
    pub bookings: BookingDesk,
    pub contacts: Arc<dyn ContactRepository>,
    /// Rate limiting is off when no Redis is configured.
    pub redis: Option<Arc<RedisClient>>,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        bookings: Arc<dyn BookingRepository>,
        contacts: Arc<dyn ContactRepository>,
        auth: AuthConfig,
        rate_limit: RateLimitConfig,
    ) -> Self {
        Self {
            catalog,
            bookings: BookingDesk::new(bookings),
            contacts,
            redis: None,
            auth,
            rate_limit,
        }
    }

    pub fn postgres(db: &DbClient, auth: AuthConfig, rate_limit: RateLimitConfig) -> Self {
        Self::new(
            Arc::new(PgCatalogRepository::new(db.pool.clone())),
            Arc::new(PgBookingRepository::new(db.pool.clone())),
            Arc::new(PgContactRepository::new(db.pool.clone())),
            auth,
            rate_limit,
        )
    }

    pub fn in_memory(auth: AuthConfig, rate_limit: RateLimitConfig) -> Self {
        let store = InMemoryStore::new();
        Self::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
            auth,
            rate_limit,
        )
    }

    pub fn with_redis(mut self, redis: Arc<RedisClient>) -> Self {
        self.redis = Some(redis);
        self
    }
}
