//! Record store adapter.
//!
//! Typed read/write access to the three persistent collections (Ideas,
//! Structures, Settings) held in an Airtable-style REST store. The
//! adapter owns three concerns the rest of the workspace must never see:
//!
//! - **Field-name indirection**: every table, view, and column is
//!   addressed by an externally-configured name ([`schema::StoreSchema`]),
//!   validated eagerly at startup.
//! - **Rate limiting**: all requests are serialized through a
//!   [`pacer::RequestPacer`] enforcing the store's minimum inter-request
//!   spacing.
//! - **Wire mapping**: status strings are normalized here and nowhere
//!   deeper; linked-record and attachment columns become plain fields;
//!   patches are sparse, so omitted fields are never cleared.
//!
//! Consumers depend on the [`RecordStore`] trait, which keeps the
//! pipeline testable against in-memory fakes.

pub mod client;
pub mod error;
pub mod mapping;
pub mod pacer;
pub mod schema;

pub use client::{RecordStore, RecordStoreClient, StructureView};
pub use error::StoreError;
pub use pacer::RequestPacer;
pub use schema::StoreSchema;
