//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod command_watermark_remover;
mod in_memory_counter_backend;
mod in_memory_profile_repository;
mod postgrest_profile_repository;
mod redis_counter_backend;
mod unconfigured_profile_repository;

pub use command_watermark_remover::CommandWatermarkRemover;
pub use in_memory_counter_backend::InMemoryCounterBackend;
pub use in_memory_profile_repository::InMemoryProfileRepository;
pub use postgrest_profile_repository::PostgrestProfileRepository;
pub use redis_counter_backend::RedisCounterBackend;
pub use unconfigured_profile_repository::UnconfiguredProfileRepository;
