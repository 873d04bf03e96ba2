//! Error types

use solana_program::program_error::ProgramError;
use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum EscrowError {
    #[error("Required signature is missing")]
    MissingSignature,

    #[error("Escrow address does not match its derivation")]
    InvalidSeed,

    #[error("Escrow is already initialized")]
    AlreadyInitialized,

    #[error("Escrow amounts must be non-zero")]
    InvalidAmount,

    #[error("Escrow terms do not match the supplied accounts")]
    EscrowMismatch,

    #[error("Custody balance does not match the escrowed amount")]
    AmountMismatch,

    #[error("Escrow does not exist")]
    EscrowNotFound,

    #[error("Malformed instruction or state data")]
    MalformedData,
}

impl From<EscrowError> for ProgramError {
    fn from(e: EscrowError) -> Self {
        ProgramError::Custom(e as u32)
    }
}
