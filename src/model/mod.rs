pub mod overlay;
pub mod schedule;
pub mod task;

pub use overlay::*;
pub use schedule::*;
pub use task::*;
