#![forbid(unsafe_code)]

pub mod github;
pub mod mapping;
pub mod repository;
pub mod table;
pub mod table_store;

pub use repository::{
    FileOp, FileSha, InMemoryFileStore, RemoteFile, RemoteFileStore, Storage, StorageError,
    WriteOutcome,
};
pub use table::{CsvTable, TableError};
pub use table_store::TableStore;
