//! Anuvad Database Library
//!
//! Metadata-store client: repositories over Postgres for the document records
//! the conversion pipeline reads. The metadata store is an external
//! collaborator; only point lookups and simple filtered queries live here.

pub mod db;

pub use db::DocumentRepository;
