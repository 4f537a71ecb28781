use alloy_primitives::Address;
use num_bigint::BigUint;
use tracing::debug;

use crate::encoding::{
    bytecode_encoder::BytecodeEncoder,
    errors::EncodingError,
    evm::{
        branching::{add_multi_swap_metadata, pack_vertical_branch, wrap_envelope, SrcTokenPos},
        composer::RouteComposer,
        config::ExecutorConfig,
        constants::SWAP_EXCHANGE_100_PERCENTAGE,
        flags::{ROOT_UNWRAP_BRANCH_FLAG, ROOT_WRAP_BRANCH_FLAG, UNWRAP_FLAG},
        frames::{send_native_frame, unwrap_frame, wrap_frame},
        route_index::{RouteIndex, Topology},
        route_validator::PriceRouteValidator,
    },
    models::{ExchangeParam, PriceRoute, Transaction, WethCallData},
};

/// Compiles price routes into bytecode for the executor contract.
///
/// # Fields
/// * `config`: Network addresses of the targeted chain
/// * `validator`: Checks the route tree before compiling it
#[derive(Clone, Debug)]
pub struct ExecutorBytecodeEncoder {
    config: ExecutorConfig,
    validator: PriceRouteValidator,
}

impl ExecutorBytecodeEncoder {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config, validator: PriceRouteValidator }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }
}

impl BytecodeEncoder for ExecutorBytecodeEncoder {
    fn build_bytecode(
        &self,
        price_route: &PriceRoute,
        exchange_params: &[ExchangeParam],
        weth_call_data: Option<&WethCallData>,
    ) -> Result<Vec<u8>, EncodingError> {
        self.validate_price_route(price_route, exchange_params)?;

        let index = RouteIndex::new(price_route);
        let composer =
            RouteComposer::new(&self.config, price_route, &index, exchange_params, weth_call_data)?;
        let topology = composer.topology();
        let wrapped_root = composer.root_wrap() || composer.root_unwrap();

        let mut body = composer.compose_routes()?;

        if topology == Topology::Parallel && wrapped_root {
            // the unwrap that follows needs the wrapped balance measured by the branch
            let flag = if composer.root_unwrap() {
                ROOT_UNWRAP_BRANCH_FLAG
            } else {
                ROOT_WRAP_BRANCH_FLAG
            };
            body = pack_vertical_branch(
                self.config.executor_address,
                &body,
                flag,
                Some(self.config.wrapped_native_token),
            )?
            .encode()?;
        }

        if composer.root_wrap() {
            let mut wrapped =
                wrap_frame(self.config.wrapped_native_token, composer.deposit_calldata()?)
                    .encode()?;
            wrapped.extend(body);
            body = wrapped;
        }

        if composer.root_unwrap() {
            body.extend(
                unwrap_frame(
                    self.config.wrapped_native_token,
                    composer.withdraw_calldata()?,
                    UNWRAP_FLAG,
                )?
                .encode()?,
            );
            body.extend(send_native_frame().encode()?);
        }

        if topology == Topology::Sequential || (topology == Topology::Parallel && wrapped_root) {
            body = add_multi_swap_metadata(body, SWAP_EXCHANGE_100_PERCENTAGE, SrcTokenPos::Full)?;
        }

        debug!(
            topology = ?topology,
            routes = price_route.best_route.len(),
            exchanges = index.exchange_count(),
            bytes = body.len(),
            "built executor bytecode"
        );
        Ok(wrap_envelope(body))
    }

    fn address(&self) -> Address {
        self.config.executor_address
    }

    /// Raises an `EncodingError` if the price route is not considered valid.
    ///
    /// A price route is considered valid if all the following conditions are met:
    /// * No level of the tree is empty and the percentages of every level sum to 100
    /// * Every route chains its hops from the trade source to the trade destination
    /// * No amount sold is zero
    /// * There is exactly one exchange param per swap exchange
    fn validate_price_route(
        &self,
        price_route: &PriceRoute,
        exchange_params: &[ExchangeParam],
    ) -> Result<(), EncodingError> {
        self.validator
            .validate_percentages(price_route)?;
        self.validator
            .validate_token_path(price_route)?;
        self.validator
            .validate_amounts(price_route)?;
        RouteIndex::new(price_route).check_params_len(exchange_params.len())
    }

    fn encode_transaction(
        &self,
        price_route: &PriceRoute,
        exchange_params: &[ExchangeParam],
        weth_call_data: Option<&WethCallData>,
    ) -> Result<Transaction, EncodingError> {
        let data = self.build_bytecode(price_route, exchange_params, weth_call_data)?;
        let value = if self
            .config
            .is_native(&price_route.src_token)
        {
            price_route.src_amount.clone()
        } else {
            BigUint::ZERO
        };
        Ok(Transaction { to: self.address(), value, data })
    }
}
