pub mod questions;
pub mod answers;
pub mod scoring;
pub mod session;

pub use questions::*;
pub use answers::*;
pub use scoring::*;
pub use session::*;
