use loam_world::WorldId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenError {
    #[error("generator used before set_seed")]
    NotSeeded,
    #[error("generator seed may only be set once")]
    AlreadySeeded,
    #[error("block `{0}` is not registered")]
    UnknownBlock(String),
    #[error("no generator registered for world {0}")]
    NoGenerator(WorldId),
    #[error("stage `{stage}` failed: {message}")]
    Stage { stage: &'static str, message: String },
}
