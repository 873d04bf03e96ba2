//! Instruction definitions

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::program_error::ProgramError;

use crate::error::EscrowError;

/// Wire format, little-endian, 17 bytes for both variants:
/// `tag(u8) | sell_amount(u64) | buy_amount(u64)`
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum EscrowInstruction {
    /// Create an escrow and deposit `sell_amount` into program custody
    ///
    /// Accounts expected:
    /// 0. `[writable, signer]` Authority (depositor, pays rent)
    /// 1. `[]` Sell mint
    /// 2. `[]` Buy mint
    /// 3. `[writable]` Authority sell-token account (deposit source)
    /// 4. `[]` Authority buy-token account (proceeds destination)
    /// 5. `[writable]` Escrow state account (PDA)
    /// 6. `[writable]` Escrow custody token account (ATA of the escrow PDA)
    /// 7. `[]` Rent sysvar
    /// 8. `[]` System program
    /// 9. `[]` Token program
    /// 10. `[]` Associated token program
    /// 11. `[]` This program
    InitEscrow { sell_amount: u64, buy_amount: u64 },

    /// Settle the escrow: pay the authority, release custody to the taker,
    /// close both escrow accounts
    ///
    /// Accounts expected:
    /// 0. `[writable]` Authority (proceeds and rent recipient)
    /// 1. `[signer]` Taker
    /// 2. `[]` Buy mint
    /// 3. `[]` Sell mint
    /// 4. `[writable]` Taker source account (pays `buy_mint` tokens)
    /// 5. `[writable]` Taker destination account (receives `sell_mint` tokens)
    /// 6. `[writable]` Authority buy-token account
    /// 7. `[writable]` Escrow state account (PDA)
    /// 8. `[writable]` Escrow custody token account
    /// 9. `[]` Token program
    Exchange { sell_amount: u64, buy_amount: u64 },
}

impl EscrowInstruction {
    /// Decode an instruction payload. Fails on any length mismatch or an
    /// out-of-range tag byte.
    pub fn unpack(data: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(data).map_err(|_| EscrowError::MalformedData.into())
    }
}
