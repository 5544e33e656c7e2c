//! Persistence layer for tripgenius: connection pool, embedded migrations,
//! row models, and query functions for the `users` and `trips` tables.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
