use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("failed to read config {}: {source}", path.display())]
  ConfigRead {
    path: PathBuf,
    source: std::io::Error,
  },

  #[error("config parse error: {0}")]
  ConfigParse(#[from] toml::de::Error),

  #[error("config serialize error: {0}")]
  ConfigSerialize(#[from] toml::ser::Error),

  #[error("failed to write point cloud: {0}")]
  Dump(#[from] serde_json::Error),

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error("event loop error: {0}")]
  EventLoop(#[from] winit::error::EventLoopError),

  #[error("window error: {0}")]
  Window(#[from] winit::error::OsError),

  #[error("surface error: {0}")]
  Surface(#[from] wgpu::CreateSurfaceError),

  #[error("no suitable GPU adapter found")]
  NoAdapter,

  #[error("surface is not supported by the adapter")]
  UnsupportedSurface,

  #[error("device error: {0}")]
  Device(#[from] wgpu::RequestDeviceError),

  #[error("failed to install Ctrl-C handler: {0}")]
  Signal(#[from] ctrlc::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
