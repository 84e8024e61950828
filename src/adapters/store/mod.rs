//! Storage seam: the [`PatientStore`] trait and its in-memory implementation

pub mod memory;
pub mod traits;

pub use memory::MemoryStore;
pub use traits::PatientStore;
