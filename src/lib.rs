pub mod app;
pub mod calendar;
pub mod config;
pub mod editor;
pub mod errors;
pub mod handlers;
pub mod images;
pub mod models;
pub mod normalize;
pub mod pages;
pub mod state;
pub mod storage;
pub mod summary;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::{load_entries, persist_entries};
