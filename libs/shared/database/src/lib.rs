pub mod store;

pub use store::{DocumentStore, HttpDocumentStore, InsertOutcome, StoreError};
