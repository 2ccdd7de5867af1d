//! Calldata for the two ERC-20 methods the transfer board needs.

use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::json_abi::Function;
use alloy::primitives::{Address, Bytes, U256};

use crate::error::ChainError;

const TRANSFER_SIGNATURE: &str = "transfer(address,uint256)";
const BALANCE_OF_SIGNATURE: &str = "balanceOf(address)";

pub fn transfer_calldata(to: Address, amount: U256) -> Result<Bytes, ChainError> {
    encode(
        TRANSFER_SIGNATURE,
        &[DynSolValue::Address(to), DynSolValue::Uint(amount, 256)],
    )
}

pub fn balance_of_calldata(owner: Address) -> Result<Bytes, ChainError> {
    encode(BALANCE_OF_SIGNATURE, &[DynSolValue::Address(owner)])
}

/// Decode a single `uint256` return word.
pub fn decode_uint256(output: &[u8]) -> Result<U256, ChainError> {
    if output.len() < 32 {
        return Err(ChainError::InvalidInput(format!(
            "uint256 return data must be 32 bytes, got {}",
            output.len()
        )));
    }
    Ok(U256::from_be_slice(&output[..32]))
}

fn encode(signature: &str, args: &[DynSolValue]) -> Result<Bytes, ChainError> {
    let function = Function::parse(signature)
        .map_err(|e| ChainError::InvalidInput(format!("invalid signature {signature}: {e}")))?;
    let data = function
        .abi_encode_input(args)
        .map_err(|e| ChainError::InvalidInput(format!("{signature} encoding failed: {e}")))?;
    Ok(Bytes::from(data))
}
