use rigger_core::{ids::IdError, pipeline::PipelineError, registry::RegistryError};
use thiserror::Error as ThisError;

///
/// MarketError
///

#[derive(Debug, ThisError)]
pub enum MarketError {
    #[error("markets {first} and {second} share shard {shard}")]
    DuplicateShard {
        first: String,
        second: String,
        shard: String,
    },

    #[error(transparent)]
    Id(#[from] IdError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
