#![forbid(unsafe_code)]

pub mod error;
pub mod grading;
pub mod model;
pub mod options;
pub mod random;
pub mod selection;
pub mod time;

pub use error::Error;
pub use random::RngSource;
pub use time::Clock;
