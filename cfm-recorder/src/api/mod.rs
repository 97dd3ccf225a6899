//! HTTP API handlers for cfm-recorder

pub mod buildinfo;
pub mod extract;
pub mod health;
pub mod identity;
pub mod now_playing;
pub mod playbacks;

pub use buildinfo::{get_build_info, BuildInfo};
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use health::health_routes;
pub use identity::{AdminUser, CurrentUser};
pub use now_playing::now_playing_routes;
pub use playbacks::playback_routes;
