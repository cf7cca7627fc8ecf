pub mod service;
pub mod stats;

pub use service::QueryService;
pub use stats::Statistics;
