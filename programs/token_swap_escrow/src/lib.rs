//! Token Swap Escrow Program (Native Solana)
//!
//! This program implements a two-party atomic token swap. A depositor locks
//! SPL tokens in a program-controlled custody account together with the terms
//! of the exchange; any taker who pays the asked counter-amount receives the
//! locked tokens in the same instruction, and the escrow is destroyed.

pub mod error;
pub mod instruction;
pub mod processor;
pub mod state;

#[cfg(not(feature = "no-entrypoint"))]
mod entrypoint;

pub use solana_program;

// Re-export for tests
pub use error::EscrowError;
pub use instruction::EscrowInstruction;
pub use state::Escrow;
