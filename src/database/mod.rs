pub mod db;
pub mod db_structs;
pub mod memory;
pub mod store;

pub use db::DbClient;
pub use memory::MemoryStore;
pub use store::{RecipeStore, StoreError};
