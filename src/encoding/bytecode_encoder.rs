use alloy_primitives::Address;

use crate::encoding::{
    errors::EncodingError,
    models::{ExchangeParam, PriceRoute, Transaction, WethCallData},
};

/// An encoder must implement this trait in order to compile a price route into bytecode for an
/// executor contract.
pub trait BytecodeEncoder: Send + Sync {
    /// Compiles the route tree and the index-aligned exchange parameters into one buffer.
    fn build_bytecode(
        &self,
        price_route: &PriceRoute,
        exchange_params: &[ExchangeParam],
        weth_call_data: Option<&WethCallData>,
    ) -> Result<Vec<u8>, EncodingError>;

    /// Address of the executor contract this bytecode targets.
    fn address(&self) -> Address;

    /// Raises an `EncodingError` if the route tree is not considered valid.
    fn validate_price_route(
        &self,
        price_route: &PriceRoute,
        exchange_params: &[ExchangeParam],
    ) -> Result<(), EncodingError>;

    /// Wraps the bytecode in a transaction to the executor.
    fn encode_transaction(
        &self,
        price_route: &PriceRoute,
        exchange_params: &[ExchangeParam],
        weth_call_data: Option<&WethCallData>,
    ) -> Result<Transaction, EncodingError>;
}
