pub mod actionlog;
pub mod app;
pub mod items;
pub mod ui;
