use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatmulError {
    #[error("shape mismatch: [{}x{}] @ [{}x{}] -> [{}x{}]", a.0, a.1, b.0, b.1, c.0, c.1)]
    ShapeMismatch {
        a: (usize, usize),
        b: (usize, usize),
        c: (usize, usize),
    },
    #[error("invalid dimensions: {rows}x{cols} cannot hold {len} elements")]
    InvalidDimensions { rows: usize, cols: usize, len: usize },
    #[error("precondition violated: {0}")]
    Precondition(String),
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),
    #[error("accelerator unavailable: {0}")]
    AcceleratorUnavailable(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("thread pool error: {0}")]
    ThreadPool(String),
    #[error("device error: {0}")]
    Device(String),
}

pub type Result<T> = std::result::Result<T, MatmulError>;
