pub mod config;
pub mod entity;
pub mod error;
pub mod metric;
pub mod snapshot;

pub use config::Config;
pub use entity::*;
pub use error::*;
pub use metric::*;
pub use snapshot::*;
