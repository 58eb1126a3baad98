//! Database repository layer

pub mod reorder;
pub mod service_repo;
pub mod template_repo;

pub use reorder::*;
pub use service_repo::*;
pub use template_repo::*;
