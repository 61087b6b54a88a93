//! Algorithms: communication substrate, the halo exchange protocol, the
//! stencil kernel, and the iteration controller that ties them together.

pub mod communicator;
pub mod exchange;
pub mod iterate;
pub mod kernel;
pub mod wire;

pub use iterate::run_convolution;
pub use kernel::{Filter3, apply_filter};
