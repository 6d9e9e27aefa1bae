//! # genai-sql
//!
//! Translates natural-language questions into read-only SQL against a
//! PostgreSQL database, runs the SQL, and returns the rows as text.
//!
//! ## Architecture
//!
//! One request flows through a fixed pipeline:
//! - **Describe**: render the catalog as a flat schema description
//! - **Generate**: prompt a language model for a single SELECT
//! - **Filter**: reject generated SQL containing mutating keywords
//! - **Execute**: run the SQL and coerce every value to text
//!
//! Each stage sits behind a trait ([`database::Catalog`],
//! [`generation::TextGenerator`], [`database::QueryRunner`]) so backends
//! can be swapped or stubbed.

pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod generation;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod security;
pub mod server;
pub mod shutdown;
pub mod telemetry;
pub mod transport;

pub use config::Config;
pub use error::ServerError;
pub use pipeline::{QueryPipeline, QueryRequest, QueryResponse};
pub use server::GenaiSqlServer;
