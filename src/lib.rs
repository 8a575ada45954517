pub mod config;
pub mod decoders;
pub mod detection;
pub mod error;
pub mod logging;
pub mod packet;
pub mod rules;

pub use error::{NidsError, Result};
