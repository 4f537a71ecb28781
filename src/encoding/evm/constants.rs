pub const DEFAULT_EXECUTOR_CONFIG_JSON: &str = include_str!("../../../config/executor_addresses.json");

/// Zero padding between a frame header and its body. Also counted in the declared body length.
pub const BYTES_28_LENGTH: usize = 28;
/// Two ABI words: the offset and the length heading a `bytes` argument.
pub const BYTES_64_LENGTH: usize = 64;
/// ABI offset of the single dynamic `bytes` argument of the executor and of branch bodies.
pub const CALLDATA_OFFSET: usize = 32;
pub const ZERO_SELECTOR: [u8; 4] = [0u8; 4];

/// target (20) + length (4) + fromAmount pos (2) + destToken pos (2) + return amount pos (1) +
/// special opcode (1) + flag (2) + padding (28).
pub const FRAME_HEADER_LENGTH: usize = 20 + 4 + 2 + 2 + 1 + 1 + 2 + BYTES_28_LENGTH;
/// length (16) + source token position (8) + percentage (8).
pub const METADATA_HEADER_LENGTH: usize = 32;

pub const SWAP_EXCHANGE_100_PERCENTAGE: f64 = 100.0;
/// Accepted deviation of a percentage sum from 100.
pub const PERCENT_SUM_TOLERANCE: f64 = 1e-6;
/// Source token position telling the interpreter that the source is the native asset.
pub const NATIVE_SRC_TOKEN_POS: u64 = 0xEEEE_EEEE_EEEE_EEEE;

/// Position of the amount word in `withdraw(uint256)` calldata.
pub const WITHDRAW_AMOUNT_POS: usize = 4;
