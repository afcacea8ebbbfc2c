pub mod memory;
pub mod etcd;
pub mod types;

pub use memory::MemoryMetaStore;
pub use etcd::EtcdMetaStore;
pub use types::{get_json, list_json, put_json, MetaStore, SharedMetaStore};
