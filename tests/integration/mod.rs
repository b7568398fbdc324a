//! Integration tests for hr-ask.

pub mod pipeline_test;
pub mod query_test;
pub mod schema_test;
pub mod server_test;
