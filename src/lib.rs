pub mod app;
pub mod calendar;
pub mod config;
pub mod contract;
pub mod errors;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod palette;
pub mod registry;
pub mod session;
pub mod state;
pub mod stats;
pub mod storage;
pub mod transaction;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
