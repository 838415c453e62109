pub mod app_config;
pub mod booking_repo;
pub mod catalog_repo;
pub mod contact_repo;
pub mod database;
pub mod memory;
pub mod redis_repo;

pub use booking_repo::PgBookingRepository;
pub use catalog_repo::PgCatalogRepository;
pub use contact_repo::PgContactRepository;
pub use database::DbClient;
pub use memory::InMemoryStore;
pub use redis_repo::RedisClient;
