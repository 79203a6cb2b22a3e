pub mod error;
pub mod table_client;

pub use error::StoreError;
pub use table_client::{Filter, Row, TableClient, TableStore};
