mod runner;
mod shutdown;

pub use runner::{RunOptions, ShutdownOptions, run};
pub use shutdown::wait_for_shutdown;
