pub mod builder;
pub mod error;
pub mod http;
pub mod memory;
pub mod store;

#[cfg(feature = "mongodb")]
pub mod dbs;

pub use builder::{StoreBackend, StoreBuilder, StoreConfig};
pub use error::{PersistError, Result};
pub use http::{HttpThreadStore, ListThreadsResponse, RenameThreadRequest};
pub use memory::{InMemoryThreadStore, StoreOperation};
pub use store::{fallback_thread_name, normalize_name, ThreadStore};

#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoThreadStore;
