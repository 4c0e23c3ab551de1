//! # Configuration
//!
//! Server and WebSocket endpoint settings, layered as:
//! built-in defaults, `config/default.toml`, `config/{RUN_ENV}.toml`,
//! `APP__*` environment variables, then `SERVER_HOST` / `SERVER_PORT`.
//! A `.env` file is read first when present.
//!
//! ```rust,ignore
//! use peerbus::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("WebSocket endpoint: {}{}", settings.server_addr(), settings.websocket.path);
//! ```

mod settings;

pub use settings::{ServerSettings, Settings, WebSocketSettings};
