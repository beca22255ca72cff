mod environment;
mod error;

pub use environment::{ClassifierSettings, Environment};
pub use error::AppError;
