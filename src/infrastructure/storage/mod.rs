mod local_store;
mod memory_store;

pub use local_store::LocalStagingStore;
pub use memory_store::InMemoryStagingStore;
