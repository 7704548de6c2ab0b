pub mod driver;
pub mod kernels;
pub mod state;
pub mod step;

pub use driver::{RunOptions, RunReport, simulate};
pub use state::SimState;
