pub mod camera;
pub use camera::*;

pub mod helper;
pub use helper::*;

pub mod input_manager;
pub use input_manager::*;
