pub mod codec;
pub mod error;
pub mod math;
pub mod topology;

pub use error::{Result, UgridError};
pub use topology::MeshStore;
