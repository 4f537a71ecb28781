use alloy_primitives::Address;
use tracing::trace;

use crate::encoding::{
    errors::EncodingError,
    evm::{
        constants::{
            BYTES_28_LENGTH, BYTES_64_LENGTH, CALLDATA_OFFSET, METADATA_HEADER_LENGTH,
            NATIVE_SRC_TOKEN_POS, PERCENT_SUM_TOLERANCE, SWAP_EXCHANGE_100_PERCENTAGE,
            ZERO_SELECTOR,
        },
        flags::{BalanceCheck, Flag},
        frames::Frame,
        offsets::require_offset,
        utils::{address_word, be_bytes, usize_word},
    },
    models::SpecialDex,
};

/// Body of a branch frame: 28 zero bytes, a zero selector, then the children as ABI `bytes`.
pub fn pack_vertical_branch_data(children: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(BYTES_28_LENGTH + 4 + BYTES_64_LENGTH + children.len());
    data.extend_from_slice(&[0u8; BYTES_28_LENGTH]);
    data.extend_from_slice(&ZERO_SELECTOR);
    data.extend_from_slice(&usize_word(CALLDATA_OFFSET));
    data.extend_from_slice(&usize_word(children.len()));
    data.extend_from_slice(children);
    data
}

/// Wraps already encoded child frames in one frame with the vertical branching opcode.
///
/// The interpreter splits the incoming amount between the children by their metadata
/// percentages. When the flag checks a token balance, `dest_token` must appear as an ABI word
/// inside one of the children.
pub fn pack_vertical_branch(
    executor: Address,
    children: &[u8],
    flag: Flag,
    dest_token: Option<Address>,
) -> Result<Frame, EncodingError> {
    let body = pack_vertical_branch_data(children);

    let dest_token_pos = if flag.balance_check == BalanceCheck::DestTokenBalance {
        let token = dest_token.ok_or_else(|| {
            EncodingError::StructuralViolation(
                "Branch checks a destination token balance but has no destination token"
                    .to_string(),
            )
        })?;
        require_offset(&body, &address_word(&token), "branch destination token")?
    } else {
        0
    };
    let from_amount_pos = if flag.insertion.inserts_amount() {
        body.len() - BYTES_64_LENGTH - BYTES_28_LENGTH
    } else {
        0
    };

    trace!(children = children.len(), flag = flag.code(), dest_token_pos, "packed branch");

    Ok(Frame {
        target: executor,
        from_amount_pos,
        dest_token_pos,
        return_amount_pos: 0,
        special_dex: SpecialDex::ExecuteVerticalBranching,
        flag,
        body,
    })
}

/// Where the interpreter finds the token an amount share is computed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SrcTokenPos {
    /// The share is the whole amount.
    Full,
    /// The share is taken from the native balance.
    Native,
    /// The share is taken from this token, located inside the body.
    Token(Address),
}

/// Scales a percentage to hundredths of a percent, rounding up.
///
/// Floating point noise (`33.33 * 100.0 = 3332.9999999999995`) is not rounded up a full step.
pub fn percentage_to_fixed(percent: f64) -> u64 {
    let scaled = percent * 100.0;
    let nearest = scaled.round();
    if (scaled - nearest).abs() < PERCENT_SUM_TOLERANCE {
        nearest as u64
    } else {
        scaled.ceil() as u64
    }
}

/// Prefixes `body` with the 32 byte multi-swap metadata header:
/// `body length (16) | src token position (8) | percentage * 100 (8)`.
pub fn add_multi_swap_metadata(
    body: Vec<u8>,
    percent: f64,
    src_token: SrcTokenPos,
) -> Result<Vec<u8>, EncodingError> {
    let src_token_pos = if percent >= SWAP_EXCHANGE_100_PERCENTAGE - PERCENT_SUM_TOLERANCE {
        0
    } else {
        match src_token {
            SrcTokenPos::Full => 0,
            SrcTokenPos::Native => NATIVE_SRC_TOKEN_POS,
            SrcTokenPos::Token(token) => {
                require_offset(&body, token.as_slice(), "metadata source token")? as u64
            }
        }
    };

    let mut out = Vec::with_capacity(METADATA_HEADER_LENGTH + body.len());
    out.extend(be_bytes(body.len() as u64, 16, "Metadata body length")?);
    out.extend(be_bytes(src_token_pos, 8, "Metadata source token position")?);
    out.extend(be_bytes(percentage_to_fixed(percent), 8, "Metadata percentage")?);
    out.extend(body);
    Ok(out)
}

/// Prefixes `body` with the ABI head of a `bytes` argument: offset 32, then its length.
pub fn wrap_envelope(body: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(BYTES_64_LENGTH + body.len());
    out.extend_from_slice(&usize_word(CALLDATA_OFFSET));
    out.extend_from_slice(&usize_word(body.len() + BYTES_64_LENGTH));
    out.extend(body);
    out
}
