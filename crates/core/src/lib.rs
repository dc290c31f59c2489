pub mod config;
pub mod error;
pub mod fanout;
pub mod link;
pub mod queue;
pub mod types;

pub use error::ParseError;
