//! REST client for the RAG Studio backend.
//!
//! `ApiClient` owns the HTTP plumbing (base address, bearer credential,
//! error normalization). The resource modules add typed wrappers for each
//! backend area on top of it:
//!
//! - `pipelines`: RAG pipeline CRUD, execution and metrics
//! - `benchmarks`: benchmark runs, test cases, exports and comparisons
//! - `opensearch`: cluster health, indices, documents, search and tasks
//! - `rag_builder`: visual builder components, validation and templates

pub mod benchmarks;
pub mod client;
pub mod error;
pub mod opensearch;
pub mod pipelines;
pub mod rag_builder;

pub use client::{ApiClient, Download, RequestOptions, UploadFile};
pub use error::ApiError;
