// Segment relay — forwards player segment requests to their origin.

pub mod error;
pub mod headers;
pub mod segment;
pub mod upstream;

pub use error::RelayError;
pub use headers::HeadersPayload;
pub use segment::{RelayRequest, SegmentRelay};
