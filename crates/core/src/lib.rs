#![forbid(unsafe_code)]

pub mod model;
pub mod summary;
pub mod time;
pub mod timer;

pub use time::Clock;
