//! Server Module
//!
//! This module contains all server-side code for initializing and configuring
//! the Axum HTTP server.
//!
//! # Architecture
//!
//! - **`state`** - Application state structure and `FromRef` implementations
//! - **`config`** - Environment configuration and database loading
//! - **`init`** - State construction, app creation and shutdown
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs          - Module exports and documentation
//! ├── state.rs        - AppState and FromRef implementations
//! ├── config.rs       - ServerConfig and load_database
//! └── init.rs         - build_state, create_app, shutdown
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Configuration Loading**: `ServerConfig::from_env()`
//! 2. **State Creation**: `build_state` picks PostgreSQL or in-memory components
//! 3. **Router Creation**: `create_app` configures all routes and middleware
//! 4. **Shutdown**: `shutdown` clears the presence router
//!
//! # Example
//!
//! ```rust,no_run
//! use campus_dm::backend::server::{build_state, create_app, ServerConfig};
//!
//! # async fn example() {
//! let config = ServerConfig::from_env().unwrap();
//! let state = build_state(&config).await;
//! let app = create_app(state.clone());
//! # }
//! ```

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

// Re-export commonly used types
pub use config::ServerConfig;
pub use init::{build_state, create_app, shutdown, shutdown_signal};
pub use state::AppState;
