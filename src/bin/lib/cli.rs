pub use clap::Parser;
use executor_bytecode::encoding::models::Chain;

#[derive(Parser)]
/// Compile a price route into executor bytecode
///
/// Reads a JSON object from stdin with the following structure:
/// ```json
/// {
///     "price_route": {
///         "src_token": "0x...",
///         "dest_token": "0x...",
///         "src_amount": "123...",
///         "dest_amount": "123...",
///         "best_route": [{
///             "percent": 100.0,
///             "swaps": [{
///                 "src_token": "0x...",
///                 "dest_token": "0x...",
///                 "swap_exchanges": [{
///                     "exchange": "...",
///                     "percent": 100.0,
///                     "src_amount": "123...",
///                     "dest_amount": "123..."
///                 }]
///             }]
///         }]
///     },
///     "exchange_params": [{
///         "target_exchange": "0x...",
///         "exchange_data": "0x...",
///         "need_wrap_native": false,
///         "dex_func_has_recipient": false,
///         "dex_func_has_dest_token": false,
///         "special_dex_flag": null
///     }],
///     "weth_call_data": {"deposit": "0x...", "withdraw": "0x..."}
/// }
/// ```
pub struct Cli {
    /// Chain whose executor configuration is used
    #[arg(short, long, default_value = "ethereum")]
    pub chain: Chain,

    /// Path to a JSON file with the executor configuration of every chain
    #[arg(long)]
    pub config_path: Option<String>,
}
