// Adapters for the two external collaborators: the geocoding service and the
// distance-matrix service, plus the shared HTTP retry plumbing.

pub mod distance;
pub mod geocode;
pub mod http;
pub mod retry;

pub use distance::DistanceClient;
pub use geocode::GeocodeClient;
pub use retry::RetryPolicy;
