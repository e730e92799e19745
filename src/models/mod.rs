pub mod review;
pub mod sentiment;
pub mod analysis;

pub use review::*;
pub use sentiment::*;
pub use analysis::*;
