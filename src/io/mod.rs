pub mod backend;
pub mod csv_export;
pub mod http;
pub mod records;
pub mod snapshot;
pub mod worker;

pub use backend::SchedulerBackend;
pub use http::HttpBackend;
pub use records::ProjectSnapshot;
pub use snapshot::SnapshotBackend;
pub use worker::{Worker, WorkerEvent};
