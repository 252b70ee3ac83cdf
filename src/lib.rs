pub mod catalogue;
pub mod config;
pub mod domain;
pub mod emit;
pub mod error;
pub mod search;
pub mod shard;
pub mod tmalign;
