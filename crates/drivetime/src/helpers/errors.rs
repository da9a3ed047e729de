use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriveTimeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Tile loading failed: {0}")]
    TileLoading(String),

    #[error("Network failure: {0}")]
    Network(String),
}

pub trait TileLoadingContext<T> {
    fn tile_loading(self, msg: &str) -> Result<T, DriveTimeError>;
}

impl<T, E> TileLoadingContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn tile_loading(self, msg: &str) -> Result<T, DriveTimeError> {
        self.map_err(|e| DriveTimeError::TileLoading(format!("{}: {}", msg, e)))
    }
}
