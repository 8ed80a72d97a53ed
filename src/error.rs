use crate::blockchain::client::ClientError;
use crate::input::InputError;
use crate::validation::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("RPC error: {0}")]
    Rpc(#[from] ClientError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),
}
