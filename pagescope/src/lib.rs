// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;
pub mod server;

pub use handlers::{
    DEFAULT_BIND_ADDR, ProbeOverrides, apply_probe_overrides, load_config, parse_report_format,
};
pub use server::{ApiError, AppState, build_app, validate_request};
