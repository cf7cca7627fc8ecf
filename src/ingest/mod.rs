pub mod service;
pub mod submission;

pub use service::IngestService;
pub use submission::ReadingSubmission;
