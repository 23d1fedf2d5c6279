pub mod error;
#[cfg(test)]
pub mod fake;
pub mod sqlite;
pub mod store;
pub mod subscription;

pub use error::DocumentStoreError;
#[cfg(test)]
pub use fake::FakeDocumentStore;
pub use sqlite::SqliteDocumentStore;
pub use store::DocumentStore;
pub use subscription::{RelationSubscription, Subscription, VideoSubscription};
