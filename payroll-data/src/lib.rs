pub mod loader;
pub mod logging;

pub use loader::{ConfigLoader, ConfigLoaderError};
