pub mod access;
pub mod guardian;
pub mod metrics;

pub use access::{access_gate_middleware, denial_response, Viewer};
pub use guardian::guardian_gate_middleware;
pub use metrics::http_metrics_middleware;
