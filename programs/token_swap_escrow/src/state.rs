//! Account state definitions

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{program_error::ProgramError, pubkey::Pubkey};

use crate::error::EscrowError;

/// Escrow account state, one per active escrow.
///
/// Fixed 145-byte layout:
/// `is_initialized(1) | authority(32) | sell_mint(32) | buy_mint(32) |
/// escrow_token_account(32) | sell_amount(8) | buy_amount(8)`
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Escrow {
    /// Set on creation, cleared when the escrow is settled and closed
    pub is_initialized: bool,
    /// Depositor who created the escrow; receives the taker's payment
    pub authority: Pubkey,
    /// Mint of the deposited (sold) tokens
    pub sell_mint: Pubkey,
    /// Mint the authority asks for in return
    pub buy_mint: Pubkey,
    /// Custody token account holding the deposit, owned by the escrow PDA
    pub escrow_token_account: Pubkey,
    /// Deposited amount of `sell_mint`
    pub sell_amount: u64,
    /// Asked amount of `buy_mint`
    pub buy_amount: u64,
}

impl Escrow {
    pub const LEN: usize = 1 + 32 + 32 + 32 + 32 + 8 + 8; // 145 bytes

    pub fn new(
        authority: Pubkey,
        sell_mint: Pubkey,
        buy_mint: Pubkey,
        escrow_token_account: Pubkey,
        sell_amount: u64,
        buy_amount: u64,
    ) -> Self {
        Self {
            is_initialized: true,
            authority,
            sell_mint,
            buy_mint,
            escrow_token_account,
            sell_amount,
            buy_amount,
        }
    }

    /// Decode escrow state from account data. The buffer must be exactly
    /// `LEN` bytes.
    pub fn unpack(data: &[u8]) -> Result<Self, ProgramError> {
        if data.len() != Self::LEN {
            return Err(EscrowError::MalformedData.into());
        }
        Self::try_from_slice(data).map_err(|_| EscrowError::MalformedData.into())
    }

    /// Encode escrow state into its fixed-width byte representation.
    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        self.try_to_vec().map_err(|_| EscrowError::MalformedData.into())
    }
}

/// Seeds for PDA derivation
pub mod seeds {
    pub const ESCROW_SEED: &[u8] = b"escrow";
}

/// Derive the escrow state address for an `(authority, sell_mint)` pair.
pub fn find_escrow_address(
    authority: &Pubkey,
    sell_mint: &Pubkey,
    program_id: &Pubkey,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[seeds::ESCROW_SEED, authority.as_ref(), sell_mint.as_ref()],
        program_id,
    )
}
