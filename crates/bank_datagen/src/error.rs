use bank_core::csv_codec::CodecError;
use bank_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("failed to serialize table: {0}")]
    Codec(#[from] CodecError),
    #[error("failed to upload table: {0}")]
    Store(#[from] StoreError),
}
