mod errors;
mod router;
mod service;

pub use errors::DataError;
pub use router::{ListRoute, list_route, resource_alias};
pub use service::{ListResult, RecordService};
