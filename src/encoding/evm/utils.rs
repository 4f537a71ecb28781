use alloy_primitives::{Address, Keccak256, U256};
use num_bigint::BigUint;

use crate::encoding::errors::EncodingError;

pub fn biguint_to_u256(value: &BigUint) -> U256 {
    let bytes = value.to_bytes_be();
    U256::from_be_slice(&bytes)
}

/// ABI encoding of an amount, as it appears inside exchange calldata.
///
/// Returns an `EncodingError` if the amount does not fit in 256 bits.
pub fn amount_word(value: &BigUint) -> Result<[u8; 32], EncodingError> {
    if value.bits() > 256 {
        return Err(EncodingError::StructuralViolation(format!(
            "Amount {} does not fit in a uint256",
            value
        )));
    }
    Ok(biguint_to_u256(value).to_be_bytes::<32>())
}

/// ABI encoding of an address: 12 zero bytes followed by the 20 address bytes.
pub fn address_word(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word
}

pub fn usize_word(value: usize) -> [u8; 32] {
    U256::from(value).to_be_bytes::<32>()
}

/// Big-endian encoding of `value` on exactly `width` bytes.
///
/// Returns a `StructuralViolation` naming `field` if the value needs more bytes.
pub fn be_bytes(value: u64, width: usize, field: &str) -> Result<Vec<u8>, EncodingError> {
    let full = value.to_be_bytes();
    let needed = 8 - (value.leading_zeros() as usize / 8);
    if needed > width {
        return Err(EncodingError::StructuralViolation(format!(
            "{} {} does not fit in {} bytes",
            field, value, width
        )));
    }
    let mut out = vec![0u8; width.saturating_sub(8)];
    out.extend_from_slice(&full[8 - width.min(8)..]);
    Ok(out)
}

pub fn encode_input(selector: &str, mut encoded_args: Vec<u8>) -> Vec<u8> {
    let mut hasher = Keccak256::new();
    hasher.update(selector.as_bytes());
    let selector_bytes = &hasher.finalize()[..4];
    let mut call_data = selector_bytes.to_vec();
    // Remove extra prefix if present (32 bytes for dynamic data)
    // Alloy encoding is including a prefix for dynamic data indicating the offset or length
    // but at this point we don't want that
    if encoded_args.len() > 32 && encoded_args[..32] == usize_word(32) {
        encoded_args = encoded_args[32..].to_vec();
    }
    call_data.extend(encoded_args);
    call_data
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use alloy_sol_types::SolValue;

    use super::*;

    #[test]
    fn test_amount_word() {
        let word = amount_word(&BigUint::from(1000u32)).unwrap();
        assert_eq!(
            hex::encode(word),
            "00000000000000000000000000000000000000000000000000000000000003e8"
        );
    }

    #[test]
    fn test_amount_word_overflow() {
        let too_big = BigUint::from(1u8) << 256;
        assert!(matches!(amount_word(&too_big), Err(EncodingError::StructuralViolation(_))));
    }

    #[test]
    fn test_address_word() {
        let dai = Address::from_str("0x6b175474e89094c44da98b954eedeac495271d0f").unwrap();
        assert_eq!(
            hex::encode(address_word(&dai)),
            "0000000000000000000000006b175474e89094c44da98b954eedeac495271d0f"
        );
    }

    #[test]
    fn test_be_bytes() {
        assert_eq!(be_bytes(0x1234, 2, "offset").unwrap(), vec![0x12, 0x34]);
        assert_eq!(be_bytes(5, 4, "length").unwrap(), vec![0, 0, 0, 5]);
        assert_eq!(be_bytes(1, 16, "length").unwrap(), [vec![0u8; 15], vec![1]].concat());
        assert_eq!(be_bytes(0, 1, "return amount").unwrap(), vec![0]);
        assert!(matches!(
            be_bytes(0x1_0000, 2, "offset"),
            Err(EncodingError::StructuralViolation(_))
        ));
    }

    #[test]
    fn test_encode_input_approve() {
        let spender = Address::from_str("0x7a250d5630b4cf539739df2c5dacb4c659f2488d").unwrap();
        let calldata =
            encode_input("approve(address,uint256)", (spender, U256::from(1000u32)).abi_encode());
        assert_eq!(
            hex::encode(calldata),
            String::from(concat!(
                "095ea7b3",
                "0000000000000000000000007a250d5630b4cf539739df2c5dacb4c659f2488d",
                "00000000000000000000000000000000000000000000000000000000000003e8",
            ))
        );
    }
}
