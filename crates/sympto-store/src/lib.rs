pub mod config;
pub mod error;
pub mod json_bridge;
pub mod paths;
pub mod schema;
pub mod store;

pub use config::{CONFIG_FILE, Config};
pub use error::{Result, StoreError};
pub use json_bridge::{CURRENT_VERSION, ExportDocument};
pub use paths::{DATA_DIR_ENV, DB_FILE, data_dir, default_base_dir, open_in_dir};
pub use store::{Store, User};
