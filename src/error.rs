/// All errors that `spritebatch` can return.
///
/// Geometry and texture preconditions (non-empty rectangles, non-zero texture
/// sizes) are never checked. The only runtime failures are lifecycle misuse and
/// errors reported by the device or asset adapters.
#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    /// `begin` was called while a batch was already open.
    #[error("a batch is already open; call end() before begin()")]
    AlreadyOpen,
    /// A draw or `end` call was made without an open batch.
    #[error("no batch is open; call begin() first")]
    NotOpen,
    /// The configured capacity is zero or exceeds what 16-bit indices can address.
    #[error("batch capacity {requested} is outside 1..={max}")]
    InvalidCapacity { requested: usize, max: usize },
    /// The device has no shader matching the requested name and defines.
    #[error("no shader named '{name}' with defines '{defines}'")]
    UnknownShader { name: String, defines: String },
    /// A device call referenced a buffer, texture or shader it does not own.
    #[error("device error: {0}")]
    Device(String),
    /// An image could not be decoded into a texture.
    #[error("error reading image: {0}")]
    Image(#[from] image::ImageError),
    /// A font could not be parsed.
    #[error("error parsing font: {0}")]
    Font(String),
    /// Text was drawn at a size the font has no face for.
    #[error("font has no face at size {size}")]
    MissingFace { size: f32 },
}

/// Alias for [`std::result::Result`] where the error type is [`BatchError`].
pub type Result<T> = std::result::Result<T, BatchError>;
