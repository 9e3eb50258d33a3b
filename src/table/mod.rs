// Table module
// Reading and writing the metadata table

pub mod metadata;

pub use metadata::{delimiter_for, MetadataTable, TableError};
