//! Sink implementations
//!
//! Contains InfluxSink, LogSink and FileSink.

mod file;
mod influx;
mod log;

pub use self::file::FileSink;
pub use self::influx::InfluxSink;
pub use self::log::LogSink;
