//! DynamoDB record store.

mod filter;
mod item;
mod store;

pub use filter::{FilterExpression, build as build_filter};
pub use item::{from_item, to_item};
pub use store::{DynamoRecordStore, build_client};
