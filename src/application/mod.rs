// Application layer: use cases over the repository, with the pure engine in
// `domain` doing all of the arithmetic.

pub mod error;
pub mod events;
pub mod reporting;
pub mod service;

pub use error::*;
pub use events::*;
pub use reporting::*;
pub use service::*;
