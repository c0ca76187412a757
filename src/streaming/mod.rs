//! Paginated point loading: the loader loop, its HTTP transport and
//! background sessions.

pub mod http;
pub mod loader;
#[cfg(feature = "tokio-runtime")]
pub mod session;

pub use http::{fetch_aggregates, fetch_boundaries, HttpPageFetcher};
pub use loader::{
    estimate_remaining, CancellationFlag, LoadStatus, Page, PageFetcher, PageToken, Progress,
    SessionId, StreamState, StreamSummary, StreamingLoader,
};
#[cfg(feature = "tokio-runtime")]
pub use session::{BackgroundLoad, LoadMessage};
