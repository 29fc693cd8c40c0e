//! Job store - job records and their assets

pub mod memory;
pub mod traits;

pub use memory::InMemoryJobStore;
pub use traits::JobStore;
