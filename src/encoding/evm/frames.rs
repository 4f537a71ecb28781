use alloy_primitives::Address;
use alloy_sol_types::SolValue;
use num_bigint::BigUint;
use tracing::trace;

use crate::encoding::{
    errors::EncodingError,
    evm::{
        constants::{BYTES_28_LENGTH, FRAME_HEADER_LENGTH, WITHDRAW_AMOUNT_POS},
        flags::{BalanceCheck, Flag, APPROVE_FLAG, SEND_NATIVE_FLAG, TRANSFER_FLAG, WRAP_FLAG},
        offsets::require_offset,
        utils::{address_word, amount_word, be_bytes, biguint_to_u256, encode_input},
    },
    models::SpecialDex,
};

/// One self-describing call of the executor bytecode.
///
/// # Fields
/// * `target`: Contract the interpreter calls
/// * `from_amount_pos`: Offset in `body` where the running amount is patched in, 0 for none
/// * `dest_token_pos`: Offset in `body` of the ABI word of the token whose balance is checked
/// * `return_amount_pos`: Fixed position of the returned amount
/// * `special_dex`: Opcode for calls needing custom handling
/// * `flag`: Amount insertion and balance check modes
/// * `body`: The call's calldata
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub target: Address,
    pub from_amount_pos: usize,
    pub dest_token_pos: usize,
    pub return_amount_pos: u8,
    pub special_dex: SpecialDex,
    pub flag: Flag,
    pub body: Vec<u8>,
}

impl Frame {
    /// Packs the frame as
    /// `target (20) | body length + 28 (4) | fromAmount pos (2) | destToken pos (2) |
    /// return amount pos (1) | opcode (1) | flag (2) | zeros (28) | body`.
    pub fn encode(&self) -> Result<Vec<u8>, EncodingError> {
        let mut encoded = Vec::with_capacity(FRAME_HEADER_LENGTH + self.body.len());
        encoded.extend_from_slice(self.target.as_slice());
        encoded.extend(be_bytes((self.body.len() + BYTES_28_LENGTH) as u64, 4, "Frame length")?);
        encoded.extend(be_bytes(self.from_amount_pos as u64, 2, "fromAmount offset")?);
        encoded.extend(be_bytes(self.dest_token_pos as u64, 2, "destToken offset")?);
        encoded.push(self.return_amount_pos);
        encoded.push(self.special_dex.opcode());
        encoded.extend(be_bytes(self.flag.code() as u64, 2, "Flag")?);
        encoded.extend_from_slice(&[0u8; BYTES_28_LENGTH]);
        encoded.extend_from_slice(&self.body);
        Ok(encoded)
    }
}

/// Everything needed to pack one exchange call.
///
/// # Fields
/// * `target`: Contract to call
/// * `calldata`: Opaque calldata built by the exchange adapter
/// * `src_amount`: Quoted input amount, embedded literally in `calldata`
/// * `dest_token`: Token received by this call (the wrapped token when the call unwraps later)
/// * `flag`: Modes selected for this call
/// * `special_dex`: Opcode for this call
/// * `dex_func_has_dest_token`: `calldata` already contains `dest_token` as an ABI word
/// * `force_dest_token`: An enclosing branch reads `dest_token` out of this call's bytes
/// * `return_amount_pos`: Fixed position of the returned amount
#[derive(Clone, Debug)]
pub struct CallFrameParams<'a> {
    pub target: Address,
    pub calldata: &'a [u8],
    pub src_amount: &'a BigUint,
    pub dest_token: Address,
    pub flag: Flag,
    pub special_dex: SpecialDex,
    pub dex_func_has_dest_token: bool,
    pub force_dest_token: bool,
    pub return_amount_pos: u8,
}

/// Packs one call, discovering the patch offsets inside its calldata.
///
/// Fails with `PatternNotFound` when the flag mandates a patch whose literal is absent.
pub fn pack_call_frame(params: CallFrameParams) -> Result<Frame, EncodingError> {
    let mut body = params.calldata.to_vec();

    let checks_dest_token = params.flag.balance_check == BalanceCheck::DestTokenBalance;
    let dest_token_pos = if checks_dest_token || params.force_dest_token {
        let dest_token_word = address_word(&params.dest_token);
        if !params.dex_func_has_dest_token {
            body.extend_from_slice(&dest_token_word);
        }
        let position = require_offset(&body, &dest_token_word, "destination token")?;
        if checks_dest_token {
            position
        } else {
            0
        }
    } else {
        0
    };

    // sending native value alone never patches the calldata
    let from_amount_pos = if params.flag.insertion.inserts_amount() {
        require_offset(&body, &amount_word(params.src_amount)?, "source amount")?
    } else {
        0
    };

    trace!(
        target = %params.target,
        flag = params.flag.code(),
        from_amount_pos,
        dest_token_pos,
        "packed call frame"
    );

    Ok(Frame {
        target: params.target,
        from_amount_pos,
        dest_token_pos,
        return_amount_pos: params.return_amount_pos,
        special_dex: params.special_dex,
        flag: params.flag,
        body,
    })
}

/// ERC20 `approve(spender, amount)` on `token`, receiving the running amount.
pub fn approve_frame(
    token: Address,
    spender: Address,
    amount: &BigUint,
) -> Result<Frame, EncodingError> {
    let calldata = encode_input(
        "approve(address,uint256)",
        (spender, biguint_to_u256(amount)).abi_encode(),
    );
    pack_call_frame(CallFrameParams {
        target: token,
        calldata: &calldata,
        src_amount: amount,
        dest_token: Address::ZERO,
        flag: APPROVE_FLAG,
        special_dex: SpecialDex::Default,
        dex_func_has_dest_token: false,
        force_dest_token: false,
        return_amount_pos: 0,
    })
}

/// ERC20 `transfer(recipient, amount)` forwarding the received tokens.
pub fn transfer_frame(
    token: Address,
    recipient: Address,
    amount: &BigUint,
) -> Result<Frame, EncodingError> {
    let calldata = encode_input(
        "transfer(address,uint256)",
        (recipient, biguint_to_u256(amount)).abi_encode(),
    );
    pack_call_frame(CallFrameParams {
        target: token,
        calldata: &calldata,
        src_amount: amount,
        dest_token: Address::ZERO,
        flag: TRANSFER_FLAG,
        special_dex: SpecialDex::Default,
        dex_func_has_dest_token: false,
        force_dest_token: false,
        return_amount_pos: 0,
    })
}

/// Deposits the running amount of native asset into the wrapped native token.
pub fn wrap_frame(wrapped_token: Address, deposit_calldata: &[u8]) -> Frame {
    Frame {
        target: wrapped_token,
        from_amount_pos: 0,
        dest_token_pos: 0,
        return_amount_pos: 0,
        special_dex: SpecialDex::Default,
        flag: WRAP_FLAG,
        body: deposit_calldata.to_vec(),
    }
}

/// Withdraws the running amount of the wrapped native token.
///
/// The amount argument of `withdraw(uint256)` sits right after the selector.
pub fn unwrap_frame(
    wrapped_token: Address,
    withdraw_calldata: &[u8],
    flag: Flag,
) -> Result<Frame, EncodingError> {
    if withdraw_calldata.len() < WITHDRAW_AMOUNT_POS + 32 {
        return Err(EncodingError::StructuralViolation(format!(
            "Withdraw calldata must hold a selector and an amount, got {} bytes",
            withdraw_calldata.len()
        )));
    }
    Ok(Frame {
        target: wrapped_token,
        from_amount_pos: if flag.insertion.inserts_amount() { WITHDRAW_AMOUNT_POS } else { 0 },
        dest_token_pos: 0,
        return_amount_pos: 0,
        special_dex: SpecialDex::Default,
        flag,
        body: withdraw_calldata.to_vec(),
    })
}

/// Terminal frame forwarding the executor's whole native balance.
pub fn send_native_frame() -> Frame {
    Frame {
        target: Address::ZERO,
        from_amount_pos: 0,
        dest_token_pos: 0,
        return_amount_pos: 0,
        special_dex: SpecialDex::SendNative,
        flag: SEND_NATIVE_FLAG,
        body: vec![],
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use alloy_primitives::U256;
    use rstest::rstest;

    use super::*;

    fn usdc() -> Address {
        Address::from_str("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48").unwrap()
    }

    fn router() -> Address {
        Address::from_str("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D").unwrap()
    }

    fn withdraw_calldata(amount: &BigUint) -> Vec<u8> {
        let amount: U256 = biguint_to_u256(amount);
        encode_input("withdraw(uint256)", amount.abi_encode())
    }

    fn swap_calldata(amount: &BigUint) -> Vec<u8> {
        let mut calldata = vec![0x38, 0xed, 0x17, 0x39];
        calldata.extend(amount_word(amount).unwrap());
        calldata.extend([0u8; 32]);
        calldata
    }

    #[test]
    fn test_frame_layout() {
        let frame = Frame {
            target: router(),
            from_amount_pos: 4,
            dest_token_pos: 0x44,
            return_amount_pos: 0,
            special_dex: SpecialDex::Default,
            flag: Flag::INSERT_CHECK_DEST_TOKEN,
            body: vec![0xab, 0xcd],
        };
        let encoded = frame.encode().unwrap();
        assert_eq!(encoded.len(), FRAME_HEADER_LENGTH + 2);
        assert_eq!(
            hex::encode(encoded),
            String::from(concat!(
                // target
                "7a250d5630b4cf539739df2c5dacb4c659f2488d",
                // body length + 28
                "0000001e",
                // fromAmount pos
                "0004",
                // destToken pos
                "0044",
                // return amount pos
                "00",
                // special opcode
                "00",
                // flag
                "000b",
                // padding
                "00000000000000000000000000000000000000000000000000000000",
                // body
                "abcd",
            ))
        );
    }

    #[test]
    fn test_frame_offset_overflow() {
        let frame = Frame {
            target: router(),
            from_amount_pos: 70_000,
            dest_token_pos: 0,
            return_amount_pos: 0,
            special_dex: SpecialDex::Default,
            flag: Flag::INSERT_DONT_CHECK,
            body: vec![],
        };
        assert!(matches!(frame.encode(), Err(EncodingError::StructuralViolation(_))));
    }

    #[test]
    fn test_pack_call_frame_inserts_amount_and_appends_dest_token() {
        let amount = BigUint::from(1_000_000u64);
        let calldata = swap_calldata(&amount);
        let frame = pack_call_frame(CallFrameParams {
            target: router(),
            calldata: &calldata,
            src_amount: &amount,
            dest_token: usdc(),
            flag: Flag::INSERT_CHECK_DEST_TOKEN,
            special_dex: SpecialDex::Default,
            dex_func_has_dest_token: false,
            force_dest_token: false,
            return_amount_pos: 0,
        })
        .unwrap();
        assert_eq!(frame.from_amount_pos, 4);
        assert_eq!(frame.dest_token_pos, calldata.len());
        assert_eq!(frame.body.len(), calldata.len() + 32);
        assert_eq!(&frame.body[calldata.len()..], &address_word(&usdc()));
    }

    #[test]
    fn test_pack_call_frame_uses_existing_dest_token() {
        let amount = BigUint::from(5u8);
        let mut calldata = swap_calldata(&amount);
        calldata.extend(address_word(&usdc()));
        let frame = pack_call_frame(CallFrameParams {
            target: router(),
            calldata: &calldata,
            src_amount: &amount,
            dest_token: usdc(),
            flag: Flag::DONT_INSERT_CHECK_DEST_TOKEN,
            special_dex: SpecialDex::Default,
            dex_func_has_dest_token: true,
            force_dest_token: false,
            return_amount_pos: 0,
        })
        .unwrap();
        assert_eq!(frame.body, calldata);
        assert_eq!(frame.dest_token_pos, 68);
        assert_eq!(frame.from_amount_pos, 0);
    }

    #[test]
    fn test_pack_call_frame_missing_dest_token() {
        let amount = BigUint::from(5u8);
        let calldata = swap_calldata(&amount);
        let result = pack_call_frame(CallFrameParams {
            target: router(),
            calldata: &calldata,
            src_amount: &amount,
            dest_token: usdc(),
            flag: Flag::DONT_INSERT_CHECK_DEST_TOKEN,
            special_dex: SpecialDex::Default,
            dex_func_has_dest_token: true,
            force_dest_token: false,
            return_amount_pos: 0,
        });
        assert!(matches!(result, Err(EncodingError::PatternNotFound(_))));
    }

    #[test]
    fn test_pack_call_frame_missing_amount() {
        let quoted = BigUint::from(5u8);
        let calldata = swap_calldata(&BigUint::from(6u8));
        let params = CallFrameParams {
            target: router(),
            calldata: &calldata,
            src_amount: &quoted,
            dest_token: usdc(),
            flag: Flag::INSERT_DONT_CHECK,
            special_dex: SpecialDex::Default,
            dex_func_has_dest_token: false,
            force_dest_token: false,
            return_amount_pos: 0,
        };
        assert!(matches!(
            pack_call_frame(params.clone()),
            Err(EncodingError::PatternNotFound(_))
        ));

        // Sending native value only reads the amount, so its absence is tolerated.
        let frame = pack_call_frame(CallFrameParams {
            flag: Flag::SEND_NATIVE_DONT_CHECK,
            ..params
        })
        .unwrap();
        assert_eq!(frame.from_amount_pos, 0);
    }

    #[rstest]
    #[case::send_native(Flag::SEND_NATIVE_DONT_CHECK, 0)]
    #[case::send_native_check_dest_token(Flag::SEND_NATIVE_CHECK_DEST_TOKEN, 0)]
    #[case::dont_insert(Flag::DONT_INSERT_CHECK_NATIVE, 0)]
    #[case::send_native_and_insert(Flag::SEND_NATIVE_INSERT_DONT_CHECK, 4)]
    #[case::insert(Flag::INSERT_CHECK_NATIVE, 4)]
    fn test_pack_call_frame_amount_pos_follows_insertion(
        #[case] flag: Flag,
        #[case] expected: usize,
    ) {
        let amount = BigUint::from(1_000u32);
        let calldata = swap_calldata(&amount);
        let frame = pack_call_frame(CallFrameParams {
            target: router(),
            calldata: &calldata,
            src_amount: &amount,
            dest_token: usdc(),
            flag,
            special_dex: SpecialDex::Default,
            dex_func_has_dest_token: false,
            force_dest_token: false,
            return_amount_pos: 0,
        })
        .unwrap();
        // the literal is present, yet only inserting flags point at it
        assert_eq!(frame.from_amount_pos, expected);
    }

    #[test]
    fn test_pack_call_frame_forced_dest_token() {
        let amount = BigUint::from(5u8);
        let calldata = swap_calldata(&amount);
        let frame = pack_call_frame(CallFrameParams {
            target: router(),
            calldata: &calldata,
            src_amount: &amount,
            dest_token: usdc(),
            flag: Flag::DONT_INSERT_DONT_CHECK,
            special_dex: SpecialDex::SwapOnMakerPsm,
            dex_func_has_dest_token: false,
            force_dest_token: true,
            return_amount_pos: 7,
        })
        .unwrap();
        // the word is exposed for the enclosing branch, but this frame does not check it
        assert_eq!(frame.dest_token_pos, 0);
        assert_eq!(frame.body.len(), calldata.len() + 32);
        let encoded = frame.encode().unwrap();
        assert_eq!(encoded[28], 7);
        assert_eq!(encoded[29], 3);
    }

    #[test]
    fn test_approve_frame() {
        let amount = BigUint::from(1000u32);
        let frame = approve_frame(usdc(), router(), &amount).unwrap();
        assert_eq!(frame.target, usdc());
        assert_eq!(frame.flag.code(), 3);
        assert_eq!(frame.from_amount_pos, 36);
        assert_eq!(
            hex::encode(&frame.body),
            String::from(concat!(
                "095ea7b3",
                "0000000000000000000000007a250d5630b4cf539739df2c5dacb4c659f2488d",
                "00000000000000000000000000000000000000000000000000000000000003e8",
            ))
        );
    }

    #[test]
    fn test_transfer_frame() {
        let amount = BigUint::from(42u32);
        let frame = transfer_frame(usdc(), router(), &amount).unwrap();
        assert_eq!(hex::encode(&frame.body[..4]), "a9059cbb");
        assert_eq!(frame.from_amount_pos, 36);
        assert_eq!(frame.flag, TRANSFER_FLAG);
    }

    #[test]
    fn test_unwrap_frame() {
        let calldata = withdraw_calldata(&BigUint::from(1u8));
        assert_eq!(hex::encode(&calldata[..4]), "2e1a7d4d");
        let frame = unwrap_frame(usdc(), &calldata, Flag::INSERT_DONT_CHECK).unwrap();
        assert_eq!(frame.from_amount_pos, 4);

        let frame = unwrap_frame(usdc(), &calldata, Flag::DONT_INSERT_DONT_CHECK).unwrap();
        assert_eq!(frame.from_amount_pos, 0);

        let result = unwrap_frame(usdc(), &[0x2e, 0x1a, 0x7d, 0x4d], Flag::INSERT_DONT_CHECK);
        assert!(matches!(result, Err(EncodingError::StructuralViolation(_))));
    }

    #[test]
    fn test_send_native_frame() {
        let encoded = send_native_frame().encode().unwrap();
        assert_eq!(encoded.len(), FRAME_HEADER_LENGTH);
        // declared length is the padding only
        assert_eq!(&encoded[20..24], &[0, 0, 0, 28]);
        assert_eq!(encoded[29], SpecialDex::SendNative.opcode());
        assert_eq!(&encoded[30..32], &[0, 0]);
    }
}
