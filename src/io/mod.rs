pub mod chain_store;
pub mod file;

pub use chain_store::{ChainMap, ChainStore, JsonChainStore, LiftMap, MemoryChainStore, PersistedChains};
pub use file::{load_plan, save_plan};
