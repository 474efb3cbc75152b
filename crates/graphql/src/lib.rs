//! GraphQL adapter for the customer directory.

pub mod dto;
pub mod http;

pub use dto::{decode_snapshot, GraphqlRequest, LIST_CUSTOMERS_QUERY};
pub use http::{GatewayBuildError, GraphqlDirectoryGateway};
