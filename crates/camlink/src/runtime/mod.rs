//! Process supervision runtime

pub mod fallback;
pub mod launcher;
pub mod process;
pub mod supervisor;

pub use fallback::*;
pub use launcher::*;
pub use process::*;
pub use supervisor::*;
