mod client;
mod queries;

pub use client::{GraphqlClient, GraphqlTransport};
pub use queries::QuerySet;
