//! 収集対象アイテムとその保存

pub mod model;
pub mod store;

pub use model::{merge_user_items, remove_item, upsert_item, validate_name, ItemError, WatchedItem};
pub use store::{default_items_path, SaveOutcome};
