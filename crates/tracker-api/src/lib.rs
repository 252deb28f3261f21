//! Clients for the results API: the node store and the pub/sub event feed.

pub mod client;
pub mod error;
pub mod feed;
pub mod memory;
pub mod store;

pub use client::ApiClient;
pub use error::ApiError;
pub use feed::{EventFeed, EventFilter, SubscriptionId};
pub use memory::InMemoryApi;
pub use store::ResultStore;
