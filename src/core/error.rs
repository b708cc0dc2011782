use thiserror::Error;

use crate::ai::registry::ObjectId;
use crate::core::types::UnitId;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("Missing reference: {0}")]
    MissingReference(ObjectId),

    #[error("Object referenced before it was populated: {0}")]
    ForwardDeclared(ObjectId),

    #[error("Carrier {carrier} asked to carry {unit} but is not on a transport task")]
    CarrierNotTransporting { carrier: UnitId, unit: UnitId },

    #[error("Unknown type identifier: {0}")]
    UnknownType(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AiError>;
