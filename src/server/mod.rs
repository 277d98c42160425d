// HTTP surface — hosts the segment relay and the health probe.

pub mod handler;

pub use handler::{router, RelayServer};
