pub mod arcgis;
pub use arcgis::*;

pub mod download_client;
pub use download_client::*;

pub mod geojson;
pub use geojson::*;

pub mod service_area;
pub use service_area::*;

pub mod tilesets;
pub use tilesets::*;
