pub mod config;
pub mod error;
pub mod logging;
pub mod bootstrap;
pub mod credentials;
pub mod stream;

pub use config::Config;
pub use error::{exit_code, StreamError, StreamResult};
pub use stream::StreamGroupController;
