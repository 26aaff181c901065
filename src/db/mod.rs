pub mod connection;
pub mod evaluation_store;
pub mod migrations;
pub mod models;

pub use evaluation_store::{EvaluationStore, PostgresEvaluationStore, StoreError};
