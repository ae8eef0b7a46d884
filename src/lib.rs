pub mod app;
pub mod calendar;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod notify;
pub mod page;
pub mod plans;
pub mod state;
pub mod stats;
pub mod status;
pub mod storage;
pub mod sync;
pub mod ui;
pub mod view;

pub use app::router;
pub use config::ServerConfig;
pub use state::AppState;
pub use status::{next_status, next_status_str, Status};
pub use view::{CalendarView, ClickOutcome, StatusCycler};
