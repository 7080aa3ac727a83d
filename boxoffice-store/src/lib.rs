pub mod app_config;
pub mod database;
pub mod memory;
pub mod redis_repo;
pub mod seat_repo;

pub use database::DbClient;
pub use memory::{MemoryLeaseStore, MemorySeatRepository};
pub use redis_repo::RedisLeaseStore;
pub use seat_repo::PgSeatRepository;
