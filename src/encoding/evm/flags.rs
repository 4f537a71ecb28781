use crate::encoding::errors::EncodingError;

/// How the interpreter feeds the running amount into a call. Wire value is `flag % 4`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AmountInsertion {
    DontInsert,
    /// Send native value equal to the amount.
    SendNative,
    /// Send native value equal to the amount and insert the amount into the calldata.
    SendNativeAndInsert,
    /// Insert the amount into the calldata.
    Insert,
}

impl AmountInsertion {
    pub fn code(&self) -> u16 {
        match self {
            AmountInsertion::DontInsert => 0,
            AmountInsertion::SendNative => 1,
            AmountInsertion::SendNativeAndInsert => 2,
            AmountInsertion::Insert => 3,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(AmountInsertion::DontInsert),
            1 => Some(AmountInsertion::SendNative),
            2 => Some(AmountInsertion::SendNativeAndInsert),
            3 => Some(AmountInsertion::Insert),
            _ => None,
        }
    }

    /// The calldata gets the amount patched in at the fromAmount offset.
    pub fn inserts_amount(&self) -> bool {
        matches!(self, AmountInsertion::SendNativeAndInsert | AmountInsertion::Insert)
    }
}

/// Which balance the interpreter reads after the call. Wire value is `flag % 3`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BalanceCheck {
    DontCheck,
    NativeBalance,
    /// Reads the balance of the token found at the destToken offset.
    DestTokenBalance,
}

impl BalanceCheck {
    pub fn code(&self) -> u16 {
        match self {
            BalanceCheck::DontCheck => 0,
            BalanceCheck::NativeBalance => 1,
            BalanceCheck::DestTokenBalance => 2,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(BalanceCheck::DontCheck),
            1 => Some(BalanceCheck::NativeBalance),
            2 => Some(BalanceCheck::DestTokenBalance),
            _ => None,
        }
    }
}

/// The per-frame instruction pair, packed on the wire into one code in `[0, 11]`.
///
/// 4 and 3 are co-prime, so `(code % 4, code % 3)` recovers both modes and every pair has
/// exactly one code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Flag {
    pub insertion: AmountInsertion,
    pub balance_check: BalanceCheck,
}

impl Flag {
    pub const DONT_INSERT_DONT_CHECK: Flag =
        Flag::new(AmountInsertion::DontInsert, BalanceCheck::DontCheck);
    pub const DONT_INSERT_CHECK_NATIVE: Flag =
        Flag::new(AmountInsertion::DontInsert, BalanceCheck::NativeBalance);
    pub const DONT_INSERT_CHECK_DEST_TOKEN: Flag =
        Flag::new(AmountInsertion::DontInsert, BalanceCheck::DestTokenBalance);
    pub const SEND_NATIVE_DONT_CHECK: Flag =
        Flag::new(AmountInsertion::SendNative, BalanceCheck::DontCheck);
    pub const SEND_NATIVE_CHECK_NATIVE: Flag =
        Flag::new(AmountInsertion::SendNative, BalanceCheck::NativeBalance);
    pub const SEND_NATIVE_CHECK_DEST_TOKEN: Flag =
        Flag::new(AmountInsertion::SendNative, BalanceCheck::DestTokenBalance);
    pub const SEND_NATIVE_INSERT_DONT_CHECK: Flag =
        Flag::new(AmountInsertion::SendNativeAndInsert, BalanceCheck::DontCheck);
    pub const SEND_NATIVE_INSERT_CHECK_NATIVE: Flag =
        Flag::new(AmountInsertion::SendNativeAndInsert, BalanceCheck::NativeBalance);
    pub const SEND_NATIVE_INSERT_CHECK_DEST_TOKEN: Flag =
        Flag::new(AmountInsertion::SendNativeAndInsert, BalanceCheck::DestTokenBalance);
    pub const INSERT_DONT_CHECK: Flag =
        Flag::new(AmountInsertion::Insert, BalanceCheck::DontCheck);
    pub const INSERT_CHECK_NATIVE: Flag =
        Flag::new(AmountInsertion::Insert, BalanceCheck::NativeBalance);
    pub const INSERT_CHECK_DEST_TOKEN: Flag =
        Flag::new(AmountInsertion::Insert, BalanceCheck::DestTokenBalance);

    pub const fn new(insertion: AmountInsertion, balance_check: BalanceCheck) -> Self {
        Self { insertion, balance_check }
    }

    /// Wire code: the unique `n` in `[0, 11]` with `n % 4 == insertion` and
    /// `n % 3 == balance_check`.
    pub fn code(&self) -> u16 {
        // 9 = 1 mod 4 = 0 mod 3 and 4 = 0 mod 4 = 1 mod 3
        (self.insertion.code() * 9 + self.balance_check.code() * 4) % 12
    }

    pub fn from_code(code: u16) -> Result<Self, EncodingError> {
        if code > 11 {
            return Err(EncodingError::InvalidInput(format!("Flag {} is outside [0, 11]", code)));
        }
        match (AmountInsertion::from_code(code % 4), BalanceCheck::from_code(code % 3)) {
            (Some(insertion), Some(balance_check)) => Ok(Flag { insertion, balance_check }),
            _ => Err(EncodingError::InvalidInput(format!("Flag {} cannot be decoded", code))),
        }
    }
}

impl TryFrom<u16> for Flag {
    type Error = EncodingError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Flag::from_code(code)
    }
}

impl From<Flag> for u16 {
    fn from(flag: Flag) -> Self {
        flag.code()
    }
}

/// Allowance grants always receive the amount and never check a balance.
pub const APPROVE_FLAG: Flag = Flag::INSERT_DONT_CHECK;
/// Wrapping sends the running amount as native value to the wrapped token contract.
pub const WRAP_FLAG: Flag = Flag::SEND_NATIVE_DONT_CHECK;
pub const UNWRAP_FLAG: Flag = Flag::INSERT_DONT_CHECK;
/// Mid-route unwrap: the next hop spends the whole native balance.
pub const MID_ROUTE_UNWRAP_FLAG: Flag = Flag::INSERT_CHECK_NATIVE;
pub const TRANSFER_FLAG: Flag = Flag::INSERT_DONT_CHECK;
pub const SEND_NATIVE_FLAG: Flag = Flag::DONT_INSERT_DONT_CHECK;
/// Root branch of a mega-swap whose native source was wrapped beforehand.
pub const ROOT_WRAP_BRANCH_FLAG: Flag = Flag::DONT_INSERT_DONT_CHECK;
/// Root branch of a mega-swap whose wrapped output is unwrapped afterwards.
pub const ROOT_UNWRAP_BRANCH_FLAG: Flag = Flag::DONT_INSERT_CHECK_DEST_TOKEN;

/// One row of a flag decision table. Rows are evaluated in order and the first match wins.
pub struct FlagRule<C> {
    pub name: &'static str,
    pub matches: fn(&C) -> bool,
    pub flag: Flag,
}

fn first_match<C>(rules: &[FlagRule<C>], context: &C, default: Flag) -> Flag {
    rules
        .iter()
        .find(|rule| (rule.matches)(context))
        .map(|rule| rule.flag)
        .unwrap_or(default)
}

/// Context of an exchange call in a trade with one route and one hop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimpleSwapFlagContext {
    pub is_eth_src: bool,
    pub is_eth_dest: bool,
    pub need_wrap: bool,
    pub need_unwrap: bool,
    pub dex_func_has_recipient: bool,
}

pub static SIMPLE_SWAP_RULES: [FlagRule<SimpleSwapFlagContext>; 3] = [
    FlagRule {
        name: "native source, no wrap",
        matches: |c| c.is_eth_src && !c.need_wrap,
        flag: Flag::SEND_NATIVE_CHECK_DEST_TOKEN,
    },
    FlagRule {
        name: "native destination, no unwrap",
        matches: |c| c.is_eth_dest && !c.need_unwrap,
        flag: Flag::DONT_INSERT_CHECK_NATIVE,
    },
    FlagRule {
        name: "no recipient routing or unwrap",
        matches: |c| !c.dex_func_has_recipient || (c.is_eth_dest && c.need_unwrap),
        flag: Flag::DONT_INSERT_CHECK_DEST_TOKEN,
    },
];

pub fn simple_swap_flag(context: &SimpleSwapFlagContext) -> Flag {
    first_match(&SIMPLE_SWAP_RULES, context, Flag::DONT_INSERT_DONT_CHECK)
}

/// Context of an exchange call inside a sequential route or a mega-swap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HopFlagContext {
    pub is_first_hop: bool,
    pub is_last_hop: bool,
    pub is_eth_src: bool,
    pub is_eth_dest: bool,
    pub need_wrap: bool,
    pub need_unwrap: bool,
    /// The route has more than one hop.
    pub is_horizontal: bool,
    pub is_special_dex: bool,
    pub apply_vertical_branching: bool,
    pub dex_func_has_recipient: bool,
}

/// A first-hop guard, then ten rows keyed on hop position and native handling. A later hop
/// with a native source follows a mid-route unwrap whose native balance check measured the
/// amount.
pub static HOP_RULES: [FlagRule<HopFlagContext>; 11] = [
    FlagRule {
        // the branch frame (or the special exchange) resolves the amount
        name: "first hop branched or special",
        matches: |c| c.is_first_hop && (c.apply_vertical_branching || c.is_special_dex),
        flag: Flag::DONT_INSERT_DONT_CHECK,
    },
    FlagRule {
        name: "first hop, native source, no wrap, horizontal sequence",
        matches: |c| c.is_first_hop && c.is_eth_src && !c.need_wrap && c.is_horizontal,
        flag: Flag::SEND_NATIVE_INSERT_CHECK_DEST_TOKEN,
    },
    FlagRule {
        name: "first hop, native source, no wrap",
        matches: |c| c.is_first_hop && c.is_eth_src && !c.need_wrap,
        flag: Flag::SEND_NATIVE_CHECK_DEST_TOKEN,
    },
    FlagRule {
        name: "later last hop, native source, no wrap, with recipient",
        matches: |c| {
            !c.is_first_hop &&
                c.is_last_hop &&
                c.is_eth_src &&
                !c.need_wrap &&
                c.dex_func_has_recipient
        },
        flag: Flag::SEND_NATIVE_INSERT_DONT_CHECK,
    },
    FlagRule {
        name: "later hop, native source, no wrap",
        matches: |c| !c.is_first_hop && c.is_eth_src && !c.need_wrap,
        flag: Flag::SEND_NATIVE_INSERT_CHECK_DEST_TOKEN,
    },
    FlagRule {
        name: "native source, wrap",
        matches: |c| c.is_eth_src && c.need_wrap,
        flag: Flag::INSERT_CHECK_DEST_TOKEN,
    },
    FlagRule {
        name: "native destination, unwrap",
        matches: |c| c.is_eth_dest && c.need_unwrap,
        flag: Flag::INSERT_CHECK_DEST_TOKEN,
    },
    FlagRule {
        name: "native destination, no unwrap",
        matches: |c| c.is_eth_dest && !c.need_unwrap,
        flag: Flag::INSERT_CHECK_NATIVE,
    },
    FlagRule {
        name: "intermediate hop",
        matches: |c| !c.is_last_hop,
        flag: Flag::INSERT_CHECK_DEST_TOKEN,
    },
    FlagRule {
        name: "no recipient routing",
        matches: |c| !c.dex_func_has_recipient,
        flag: Flag::INSERT_CHECK_DEST_TOKEN,
    },
    FlagRule { name: "last hop with recipient", matches: |_| true, flag: Flag::INSERT_DONT_CHECK },
];

pub fn hop_flag(context: &HopFlagContext) -> Flag {
    first_match(&HOP_RULES, context, Flag::INSERT_DONT_CHECK)
}

/// Context of a branch frame fanning out the exchanges of one hop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VerticalBranchFlagContext {
    pub is_last_hop: bool,
    pub is_eth_dest: bool,
    pub any_child_needs_wrap: bool,
    pub any_child_doesnt_need_wrap: bool,
}

pub fn vertical_branch_flag(context: &VerticalBranchFlagContext) -> Flag {
    if context.is_last_hop {
        if !context.is_eth_dest || !context.any_child_needs_wrap {
            return Flag::INSERT_DONT_CHECK;
        }
    } else if context.is_eth_dest && context.any_child_doesnt_need_wrap {
        return Flag::INSERT_CHECK_NATIVE;
    }
    Flag::INSERT_CHECK_DEST_TOKEN
}
