pub mod color;
pub use color::*;

pub mod entities;
pub use entities::*;

pub mod data_sources;
pub use data_sources::*;

pub mod overlay;
pub use overlay::*;

pub mod viewer;
pub use viewer::*;
