pub mod coord_utils;
pub use coord_utils::*;

pub mod errors;
pub use errors::*;

pub mod logging;
pub use logging::*;

pub mod async_helper;
pub use async_helper::*;
