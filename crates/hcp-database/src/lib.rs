//! # hcp-database
//!
//! Persisted documents of the resource provider and the store they live in.
//!
//! - [`ResourceDocument`]: one per managed resource, partitioned by
//!   subscription.
//! - [`OperationDocument`]: one per asynchronous request, with the status
//!   state machine ([`OperationDocument::update_status`]).
//! - [`SubscriptionDocument`]: subscription metadata from ARM.
//!
//! [`DocumentStore`] is the optimistic-concurrency contract a backend
//! implements; [`InMemoryDocumentStore`] is the bundled backend and
//! [`DocumentClient`] the typed access layer on top.

pub mod client;
pub mod document;
pub mod error;
pub mod memory;
pub mod operation;
pub mod resource;
pub mod subscription;
pub mod traits;

pub use client::{ClientOptions, DocumentClient};
pub use document::{BaseDocument, Document, ETag};
pub use error::{DatabaseError, ErrorCategory, Result};
pub use memory::InMemoryDocumentStore;
pub use operation::{OperationDocument, OperationRequest, StatusUpdate};
pub use resource::{ResourceDocument, ResourceKeyDocument, key_document_id, partition_key_for};
pub use subscription::SubscriptionDocument;
pub use traits::{DocumentPredicate, DocumentStore};
