//! Infrastructure services that sit beside the engine: the Redis read cache
//! and the notification outbox writer.

pub mod cache;
pub mod notifications;

pub use cache::RedisCache;
