use std::{fmt, str::FromStr};

use alloy_primitives::{Address, Bytes};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::encoding::{errors::EncodingError, serde_primitives::biguint_string};

/// Networks the compiler has static configuration for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Chain {
    Ethereum,
    Optimism,
    Bsc,
    Polygon,
    Base,
    Arbitrum,
    Avalanche,
}

impl Chain {
    pub fn id(&self) -> u64 {
        match self {
            Chain::Ethereum => 1,
            Chain::Optimism => 10,
            Chain::Bsc => 56,
            Chain::Polygon => 137,
            Chain::Base => 8453,
            Chain::Arbitrum => 42161,
            Chain::Avalanche => 43114,
        }
    }

    /// Key used for this chain in the configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Optimism => "optimism",
            Chain::Bsc => "bsc",
            Chain::Polygon => "polygon",
            Chain::Base => "base",
            Chain::Arbitrum => "arbitrum",
            Chain::Avalanche => "avalanche",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Chain {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ethereum" | "mainnet" => Ok(Chain::Ethereum),
            "optimism" => Ok(Chain::Optimism),
            "bsc" => Ok(Chain::Bsc),
            "polygon" => Ok(Chain::Polygon),
            "base" => Ok(Chain::Base),
            "arbitrum" => Ok(Chain::Arbitrum),
            "avalanche" => Ok(Chain::Avalanche),
            _ => Err(EncodingError::InvalidInput(format!("Unknown chain: {}", s))),
        }
    }
}

/// The priced route tree produced by the routing engine.
///
/// The tree is read-only for the compiler: routes run in parallel, each carrying a share of the
/// whole trade, and each route is a sequence of hops.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct PriceRoute {
    /// Token sold by the whole trade.
    pub src_token: Address,
    /// Token bought by the whole trade.
    pub dest_token: Address,
    /// Amount of `src_token` sold.
    #[serde(with = "biguint_string")]
    pub src_amount: BigUint,
    /// Quoted amount of `dest_token` bought.
    #[serde(with = "biguint_string")]
    pub dest_amount: BigUint,
    /// Parallel routes. Their percentages sum to 100.
    pub best_route: Vec<Route>,
}

/// One parallel path of the trade.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Route {
    /// Share of the whole trade routed through this path (for example, 50.0 means 50%).
    pub percent: f64,
    /// Sequential hops of this path.
    pub swaps: Vec<Swap>,
}

/// One hop of a route, converting `src_token` into `dest_token`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Swap {
    pub src_token: Address,
    pub dest_token: Address,
    /// Exchanges filling this hop. Their percentages sum to 100.
    pub swap_exchanges: Vec<SwapExchange>,
}

impl Swap {
    pub fn new(src_token: Address, dest_token: Address, swap_exchanges: Vec<SwapExchange>) -> Self {
        Self { src_token, dest_token, swap_exchanges }
    }
}

/// One exchange's fractional fill of a hop.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct SwapExchange {
    /// Name of the exchange, only used for diagnostics.
    pub exchange: String,
    /// Share of the hop filled by this exchange.
    pub percent: f64,
    /// Quoted input amount. Appears literally inside the exchange calldata.
    #[serde(with = "biguint_string")]
    pub src_amount: BigUint,
    /// Quoted output amount.
    #[serde(with = "biguint_string")]
    pub dest_amount: BigUint,
}

impl SwapExchange {
    pub fn new(exchange: &str, percent: f64, src_amount: BigUint, dest_amount: BigUint) -> Self {
        Self { exchange: exchange.to_string(), percent, src_amount, dest_amount }
    }
}

/// Opcode telling the interpreter that a frame needs custom handling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialDex {
    #[default]
    Default,
    SwapOnBalancerV2,
    SendNative,
    SwapOnMakerPsm,
    SwapOnSwaapV2Single,
    ExecuteVerticalBranching,
    SwapOnAugustusRfq,
}

impl SpecialDex {
    pub fn opcode(&self) -> u8 {
        match self {
            SpecialDex::Default => 0,
            SpecialDex::SwapOnBalancerV2 => 1,
            SpecialDex::SendNative => 2,
            SpecialDex::SwapOnMakerPsm => 3,
            SpecialDex::SwapOnSwaapV2Single => 4,
            SpecialDex::ExecuteVerticalBranching => 5,
            SpecialDex::SwapOnAugustusRfq => 6,
        }
    }
}

/// Everything an exchange adapter contributes for one `SwapExchange`.
///
/// The list of parameters handed to the compiler is index-aligned with the swap exchanges of the
/// price route, flattened in route, swap, swap exchange order.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ExchangeParam {
    /// Contract the interpreter calls.
    pub target_exchange: Address,
    /// Pre-encoded call. Contains the quoted source amount (and possibly the destination token)
    /// as literal ABI words.
    pub exchange_data: Bytes,
    /// The exchange only deals with the wrapped native token.
    #[serde(default)]
    pub need_wrap_native: bool,
    /// The exchange sends its output straight to the final recipient.
    #[serde(default)]
    pub dex_func_has_recipient: bool,
    /// The exchange calldata already contains the destination token as an ABI word.
    #[serde(default)]
    pub dex_func_has_dest_token: bool,
    #[serde(default)]
    pub special_dex_flag: Option<SpecialDex>,
    /// Allowance target, when it differs from `target_exchange`.
    #[serde(default)]
    pub spender: Option<Address>,
    #[serde(default)]
    pub return_amount_pos: Option<u8>,
}

impl ExchangeParam {
    pub fn new(target_exchange: Address, exchange_data: Bytes) -> Self {
        Self { target_exchange, exchange_data, ..Default::default() }
    }

    /// A special flag set to `Default` is the same as no special flag at all.
    pub fn is_special_dex(&self) -> bool {
        self.special_dex_flag
            .is_some_and(|flag| flag != SpecialDex::Default)
    }

    pub fn special_dex(&self) -> SpecialDex {
        self.special_dex_flag
            .unwrap_or_default()
    }

    pub fn spender(&self) -> Address {
        self.spender
            .unwrap_or(self.target_exchange)
    }
}

/// Calldata for the wrapped native token contract, supplied when wrapping or unwrapping takes
/// part in the trade.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct WethCallData {
    #[serde(default)]
    pub deposit: Option<Bytes>,
    /// `withdraw(uint256)` calldata. The amount word starts right after the selector.
    #[serde(default)]
    pub withdraw: Option<Bytes>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    // Address of the contract to call with the calldata
    pub to: Address,
    // Native value to be sent with the transaction.
    pub value: BigUint,
    // Executor bytecode.
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_from_str() {
        assert_eq!(Chain::from_str("Ethereum").unwrap(), Chain::Ethereum);
        assert_eq!(Chain::from_str("mainnet").unwrap(), Chain::Ethereum);
        assert_eq!(Chain::Arbitrum.id(), 42161);
        assert!(matches!(Chain::from_str("solana"), Err(EncodingError::InvalidInput(_))));
    }

    #[test]
    fn test_exchange_param_defaults() {
        let json = r#"{
            "target_exchange": "0x7a250d5630b4cf539739df2c5dacb4c659f2488d",
            "exchange_data": "0x1234"
        }"#;
        let param: ExchangeParam = serde_json::from_str(json).unwrap();
        assert!(!param.need_wrap_native);
        assert!(!param.is_special_dex());
        assert_eq!(param.special_dex(), SpecialDex::Default);
        assert_eq!(param.spender(), param.target_exchange);
        assert_eq!(param.exchange_data, Bytes::from(vec![0x12, 0x34]));
    }

    #[test]
    fn test_special_dex_default_is_not_special() {
        let param = ExchangeParam {
            special_dex_flag: Some(SpecialDex::Default),
            ..Default::default()
        };
        assert!(!param.is_special_dex());
        let param =
            ExchangeParam { special_dex_flag: Some(SpecialDex::SwapOnMakerPsm), ..param };
        assert!(param.is_special_dex());
        assert_eq!(param.special_dex().opcode(), 3);
    }

    #[test]
    fn test_price_route_deserialize() {
        let json = r#"{
            "src_token": "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee",
            "dest_token": "0x6b175474e89094c44da98b954eedeac495271d0f",
            "src_amount": "1000000000000000000",
            "dest_amount": "0xde0b6b3a7640000",
            "best_route": [{
                "percent": 100.0,
                "swaps": [{
                    "src_token": "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee",
                    "dest_token": "0x6b175474e89094c44da98b954eedeac495271d0f",
                    "swap_exchanges": [{
                        "exchange": "UniswapV2",
                        "percent": 100.0,
                        "src_amount": "1000000000000000000",
                        "dest_amount": "1000000000000000000"
                    }]
                }]
            }]
        }"#;
        let route: PriceRoute = serde_json::from_str(json).unwrap();
        assert_eq!(route.src_amount, route.dest_amount);
        assert_eq!(route.best_route[0].swaps[0].swap_exchanges[0].exchange, "UniswapV2");
    }
}
