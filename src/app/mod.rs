pub mod config;
pub mod events;
pub mod poller;
pub mod state;

pub use config::{BuiltinItem, Config};
pub use events::{Action, AppEvent, poll_event};
pub use poller::spawn_poller;
pub use state::{AppState, ItemRow, ViewMode};
