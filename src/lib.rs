//! Synthetic sales events in, newline-delimited JSON out.
//!
//! The producer writes events to a Kinesis data stream until its invocation
//! runs out of time. The transformer is the Firehose processing step that
//! re-encodes each delivered record as one JSON line.

pub mod clock;
pub mod config;
pub mod event;
pub mod producer;
pub mod server;
pub mod sink;
pub mod telemetry;
pub mod transformer;
