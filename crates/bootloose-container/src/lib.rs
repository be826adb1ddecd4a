pub mod docker;
pub mod error;
pub mod inspect;
pub mod run_args;
pub mod runtime;

pub use docker::*;
pub use error::*;
pub use inspect::*;
pub use run_args::*;
pub use runtime::*;
