//! Instruction processing

#![allow(deprecated)] // system_instruction deprecation - will migrate when solana_system_interface is stable

use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    system_program::ID as SYSTEM_PROGRAM_ID,
    sysvar::Sysvar,
};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account,
};
use spl_token::{
    error::TokenError,
    state::{Account as TokenAccount, Mint},
};

use crate::{
    error::EscrowError,
    instruction::EscrowInstruction,
    state::{find_escrow_address, seeds, Escrow},
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = EscrowInstruction::unpack(instruction_data)?;

        match instruction {
            EscrowInstruction::InitEscrow {
                sell_amount,
                buy_amount,
            } => {
                msg!("Instruction: InitEscrow");
                Self::process_init_escrow(program_id, accounts, sell_amount, buy_amount)
            }
            EscrowInstruction::Exchange {
                sell_amount,
                buy_amount,
            } => {
                msg!("Instruction: Exchange");
                Self::process_exchange(program_id, accounts, sell_amount, buy_amount)
            }
        }
    }

    fn process_init_escrow(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        sell_amount: u64,
        buy_amount: u64,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority = next_account_info(account_info_iter)?;
        let sell_mint = next_account_info(account_info_iter)?;
        let buy_mint = next_account_info(account_info_iter)?;
        let authority_sell_token = next_account_info(account_info_iter)?;
        let authority_buy_token = next_account_info(account_info_iter)?;
        let escrow_account = next_account_info(account_info_iter)?;
        let escrow_token_account = next_account_info(account_info_iter)?;
        let rent_sysvar = next_account_info(account_info_iter)?;
        let system_program = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;
        let associated_token_program = next_account_info(account_info_iter)?;
        let this_program = next_account_info(account_info_iter)?;

        if !authority.is_signer {
            return Err(EscrowError::MissingSignature.into());
        }

        // Both mints must be live SPL mints.
        let sell_mint_info = Self::validated_mint(sell_mint)?;
        Self::validated_mint(buy_mint)?;

        // The deposit source and the proceeds destination must be usable
        // token accounts up front, so the exchange cannot strand the deposit.
        Self::validated_token_account(authority_sell_token)?;
        Self::validated_token_account(authority_buy_token)?;

        if system_program.key != &SYSTEM_PROGRAM_ID {
            return Err(ProgramError::IncorrectProgramId);
        }
        if token_program.key != &spl_token::id() {
            return Err(ProgramError::IncorrectProgramId);
        }
        if associated_token_program.key != &spl_associated_token_account::id() {
            return Err(ProgramError::IncorrectProgramId);
        }
        if this_program.key != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        // The state account must sit at its derived address.
        let (escrow_pda, escrow_bump) =
            find_escrow_address(authority.key, sell_mint.key, program_id);
        if escrow_account.key != &escrow_pda {
            return Err(EscrowError::InvalidSeed.into());
        }

        // Check if an escrow already exists for this (authority, sell_mint)
        if escrow_account.data_len() > 0 {
            if let Ok(existing) = Escrow::unpack(&escrow_account.data.borrow()) {
                if existing.is_initialized {
                    return Err(EscrowError::AlreadyInitialized.into());
                }
            }
        }

        if sell_amount == 0 || buy_amount == 0 {
            return Err(EscrowError::InvalidAmount.into());
        }

        // Custody is the canonical associated token account of the escrow PDA.
        let custody_address = get_associated_token_address(&escrow_pda, sell_mint.key);
        if escrow_token_account.key != &custody_address {
            return Err(EscrowError::InvalidSeed.into());
        }

        // Create the state account, signed with the escrow seeds.
        let rent = Rent::from_account_info(rent_sysvar)?;
        let required_lamports = rent.minimum_balance(Escrow::LEN);

        invoke_signed(
            &system_instruction::create_account(
                authority.key,
                escrow_account.key,
                required_lamports,
                Escrow::LEN as u64,
                program_id,
            ),
            &[
                authority.clone(),
                escrow_account.clone(),
                system_program.clone(),
            ],
            &[&[
                seeds::ESCROW_SEED,
                authority.key.as_ref(),
                sell_mint.key.as_ref(),
                &[escrow_bump],
            ]],
        )?;

        // Create the custody account. The ATA program sets the escrow PDA as
        // its owner-authority, so only this program can move it afterwards.
        if escrow_token_account.data_len() == 0 {
            invoke(
                &create_associated_token_account(
                    authority.key,
                    escrow_account.key,
                    sell_mint.key,
                    &spl_token::id(),
                ),
                &[
                    authority.clone(),
                    escrow_token_account.clone(),
                    escrow_account.clone(),
                    sell_mint.clone(),
                    system_program.clone(),
                    token_program.clone(),
                    associated_token_program.clone(),
                ],
            )?;
        }

        // Move the deposit into custody.
        invoke(
            &spl_token::instruction::transfer_checked(
                &spl_token::id(),
                authority_sell_token.key,
                sell_mint.key,
                escrow_token_account.key,
                authority.key,
                &[],
                sell_amount,
                sell_mint_info.decimals,
            )?,
            &[
                authority_sell_token.clone(),
                sell_mint.clone(),
                escrow_token_account.clone(),
                authority.clone(),
                token_program.clone(),
            ],
        )?;

        let escrow = Escrow::new(
            *authority.key,
            *sell_mint.key,
            *buy_mint.key,
            *escrow_token_account.key,
            sell_amount,
            buy_amount,
        );
        escrow.serialize(&mut &mut escrow_account.data.borrow_mut()[..])?;

        msg!(
            "Escrow created: sell_amount={}, buy_amount={}",
            sell_amount,
            buy_amount
        );
        Ok(())
    }

    fn process_exchange(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        sell_amount: u64,
        buy_amount: u64,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority = next_account_info(account_info_iter)?;
        let taker = next_account_info(account_info_iter)?;
        let buy_mint = next_account_info(account_info_iter)?;
        let sell_mint = next_account_info(account_info_iter)?;
        let taker_source = next_account_info(account_info_iter)?;
        let taker_destination = next_account_info(account_info_iter)?;
        let authority_buy_token = next_account_info(account_info_iter)?;
        let escrow_account = next_account_info(account_info_iter)?;
        let escrow_token_account = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;

        if !taker.is_signer {
            return Err(EscrowError::MissingSignature.into());
        }
        if token_program.key != &spl_token::id() {
            return Err(ProgramError::IncorrectProgramId);
        }

        // A settled escrow is reaped by the runtime; a replay lands here.
        if escrow_account.data_is_empty() || escrow_account.owner != program_id {
            return Err(EscrowError::EscrowNotFound.into());
        }
        let escrow = Escrow::unpack(&escrow_account.data.borrow())?;
        if !escrow.is_initialized {
            return Err(EscrowError::EscrowNotFound.into());
        }

        // Never trust the supplied state address: recompute it.
        let (escrow_pda, escrow_bump) =
            find_escrow_address(&escrow.authority, &escrow.sell_mint, program_id);
        if escrow_account.key != &escrow_pda {
            return Err(EscrowError::InvalidSeed.into());
        }

        // The supplied accounts and the restated terms must match the
        // recorded state exactly.
        if escrow.authority != *authority.key
            || escrow.buy_mint != *buy_mint.key
            || escrow.sell_mint != *sell_mint.key
            || escrow.escrow_token_account != *escrow_token_account.key
            || escrow.sell_amount != sell_amount
            || escrow.buy_amount != buy_amount
        {
            return Err(EscrowError::EscrowMismatch.into());
        }

        let proceeds_info = Self::validated_token_account(authority_buy_token)?;
        if proceeds_info.mint != escrow.buy_mint || proceeds_info.owner != escrow.authority {
            return Err(EscrowError::EscrowMismatch.into());
        }

        // Custody must hold exactly the recorded deposit.
        let custody_info = TokenAccount::unpack(&escrow_token_account.data.borrow())?;
        if custody_info.amount != escrow.sell_amount {
            return Err(EscrowError::AmountMismatch.into());
        }

        let buy_mint_info = Self::validated_mint(buy_mint)?;
        let sell_mint_info = Self::validated_mint(sell_mint)?;

        // Taker pays the authority.
        invoke(
            &spl_token::instruction::transfer_checked(
                &spl_token::id(),
                taker_source.key,
                buy_mint.key,
                authority_buy_token.key,
                taker.key,
                &[],
                escrow.buy_amount,
                buy_mint_info.decimals,
            )?,
            &[
                taker_source.clone(),
                buy_mint.clone(),
                authority_buy_token.clone(),
                taker.clone(),
                token_program.clone(),
            ],
        )?;

        // Custody releases to the taker, authorized by the escrow PDA.
        let bump_seed = [escrow_bump];
        let escrow_signer_seeds: &[&[u8]] = &[
            seeds::ESCROW_SEED,
            escrow.authority.as_ref(),
            escrow.sell_mint.as_ref(),
            &bump_seed,
        ];

        invoke_signed(
            &spl_token::instruction::transfer_checked(
                &spl_token::id(),
                escrow_token_account.key,
                sell_mint.key,
                taker_destination.key,
                escrow_account.key,
                &[],
                escrow.sell_amount,
                sell_mint_info.decimals,
            )?,
            &[
                escrow_token_account.clone(),
                sell_mint.clone(),
                taker_destination.clone(),
                escrow_account.clone(),
                token_program.clone(),
            ],
            &[escrow_signer_seeds],
        )?;

        // Close the custody account, returning its rent to the authority.
        invoke_signed(
            &spl_token::instruction::close_account(
                &spl_token::id(),
                escrow_token_account.key,
                authority.key,
                escrow_account.key,
                &[],
            )?,
            &[
                escrow_token_account.clone(),
                authority.clone(),
                escrow_account.clone(),
                token_program.clone(),
            ],
            &[escrow_signer_seeds],
        )?;

        // Close the state account: sweep its rent and clear is_initialized.
        let escrow_lamports = escrow_account.lamports();
        **authority.try_borrow_mut_lamports()? = authority
            .lamports()
            .checked_add(escrow_lamports)
            .ok_or(ProgramError::ArithmeticOverflow)?;
        **escrow_account.try_borrow_mut_lamports()? = 0;
        escrow_account.data.borrow_mut().fill(0);

        msg!(
            "Escrow settled: sell_amount={}, buy_amount={}",
            escrow.sell_amount,
            escrow.buy_amount
        );
        Ok(())
    }

    fn validated_mint(mint: &AccountInfo) -> Result<Mint, ProgramError> {
        if mint.owner != &spl_token::id() {
            return Err(ProgramError::InvalidAccountOwner);
        }
        let mint_info = Mint::unpack(&mint.data.borrow())?;
        Ok(mint_info)
    }

    fn validated_token_account(account: &AccountInfo) -> Result<TokenAccount, ProgramError> {
        if account.owner != &spl_token::id() {
            return Err(ProgramError::InvalidAccountOwner);
        }
        let token_info = TokenAccount::unpack(&account.data.borrow())?;
        if token_info.is_frozen() {
            return Err(TokenError::AccountFrozen.into());
        }
        Ok(token_info)
    }
}
