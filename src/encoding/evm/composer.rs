use alloy_primitives::Address;
use tracing::debug;

use crate::encoding::{
    errors::EncodingError,
    evm::{
        branching::{add_multi_swap_metadata, pack_vertical_branch, SrcTokenPos},
        config::ExecutorConfig,
        flags::{
            hop_flag, simple_swap_flag, vertical_branch_flag, BalanceCheck, Flag, HopFlagContext,
            SimpleSwapFlagContext, VerticalBranchFlagContext, MID_ROUTE_UNWRAP_FLAG, UNWRAP_FLAG,
        },
        frames::{
            approve_frame, pack_call_frame, send_native_frame, transfer_frame, unwrap_frame,
            wrap_frame, CallFrameParams,
        },
        route_index::{IndexedRoute, IndexedSwap, IndexedSwapExchange, RouteIndex, Topology},
    },
    models::{ExchangeParam, PriceRoute, WethCallData},
};

/// Form in which the native asset is held between two hops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NativeForm {
    Raw,
    Wrapped,
}

/// Native-asset facts of one hop, shared by all of its exchanges.
#[derive(Clone, Copy, Debug)]
struct HopContext {
    is_eth_src: bool,
    is_eth_dest: bool,
    /// The hop sells native asset that is already wrapped.
    wrapped_src: bool,
    apply_vertical_branching: bool,
    /// An enclosing branch reads the destination token from the children.
    force_dest_token: bool,
}

/// Composes the frames of every route of a price route.
///
/// Decides where the native asset gets wrapped and unwrapped, emits the approve, transfer and
/// terminal frames around each exchange call, and groups exchanges of a hop into metadata
/// children or vertical branches.
pub struct RouteComposer<'a> {
    config: &'a ExecutorConfig,
    price_route: &'a PriceRoute,
    index: &'a RouteIndex<'a>,
    exchange_params: &'a [ExchangeParam],
    weth_call_data: Option<&'a WethCallData>,
    topology: Topology,
    root_wrap: bool,
    root_unwrap: bool,
    forward_native_balance: bool,
}

impl<'a> RouteComposer<'a> {
    pub fn new(
        config: &'a ExecutorConfig,
        price_route: &'a PriceRoute,
        index: &'a RouteIndex<'a>,
        exchange_params: &'a [ExchangeParam],
        weth_call_data: Option<&'a WethCallData>,
    ) -> Result<Self, EncodingError> {
        index.check_params_len(exchange_params.len())?;
        let mut composer = Self {
            config,
            price_route,
            index,
            exchange_params,
            weth_call_data,
            topology: Topology::of(price_route),
            root_wrap: false,
            root_unwrap: false,
            forward_native_balance: false,
        };
        composer.root_wrap = composer.needs_root_wrap()?;
        composer.root_unwrap = composer.needs_root_unwrap()?;
        composer.forward_native_balance = composer.needs_native_forwarding()?;
        debug!(
            topology = ?composer.topology,
            root_wrap = composer.root_wrap,
            root_unwrap = composer.root_unwrap,
            forward_native_balance = composer.forward_native_balance,
            "planned native asset handling"
        );
        Ok(composer)
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// The whole native source amount is wrapped once, before any route.
    pub fn root_wrap(&self) -> bool {
        self.root_wrap
    }

    /// The wrapped output of the last hops is unwrapped once, after every route.
    pub fn root_unwrap(&self) -> bool {
        self.root_unwrap
    }

    pub fn deposit_calldata(&self) -> Result<&'a [u8], EncodingError> {
        self.weth_call_data
            .and_then(|weth| weth.deposit.as_ref())
            .map(|deposit| &deposit[..])
            .ok_or_else(|| {
                EncodingError::StructuralViolation(
                    "Wrapping the native asset requires deposit calldata".to_string(),
                )
            })
    }

    pub fn withdraw_calldata(&self) -> Result<&'a [u8], EncodingError> {
        self.weth_call_data
            .and_then(|weth| weth.withdraw.as_ref())
            .map(|withdraw| &withdraw[..])
            .ok_or_else(|| {
                EncodingError::StructuralViolation(
                    "Unwrapping the native asset requires withdraw calldata".to_string(),
                )
            })
    }

    fn param(&self, exchange: &IndexedSwapExchange) -> Result<&'a ExchangeParam, EncodingError> {
        self.exchange_params
            .get(exchange.param_index)
            .ok_or_else(|| {
                EncodingError::StructuralViolation(format!(
                    "No exchange param at index {}",
                    exchange.param_index
                ))
            })
    }

    fn hop_params(&self, swap: &IndexedSwap) -> Result<Vec<&'a ExchangeParam>, EncodingError> {
        swap.swap_exchanges
            .iter()
            .map(|exchange| self.param(exchange))
            .collect()
    }

    fn needs_root_wrap(&self) -> Result<bool, EncodingError> {
        let has_deposit = self
            .weth_call_data
            .is_some_and(|weth| weth.deposit.is_some());
        if self.topology == Topology::Single ||
            !self
                .config
                .is_native(&self.price_route.src_token) ||
            !has_deposit
        {
            return Ok(false);
        }
        for hop in self.index.first_hops() {
            if self
                .hop_params(hop)?
                .iter()
                .any(|param| !param.need_wrap_native)
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn needs_root_unwrap(&self) -> Result<bool, EncodingError> {
        if self.topology == Topology::Single ||
            !self
                .config
                .is_native(&self.price_route.dest_token)
        {
            return Ok(false);
        }
        let mut any_wrapped_output = false;
        for hop in self.index.last_hops() {
            if self
                .hop_params(hop)?
                .iter()
                .any(|param| param.need_wrap_native)
            {
                any_wrapped_output = true;
            }
        }
        if any_wrapped_output {
            // the wrapped output must be unwrapped before it reaches the recipient
            self.withdraw_calldata()?;
        }
        Ok(any_wrapped_output)
    }

    /// The executor ends up holding native asset that must be sent on with a terminal frame.
    fn needs_native_forwarding(&self) -> Result<bool, EncodingError> {
        if self.root_unwrap ||
            !self
                .config
                .is_native(&self.price_route.dest_token)
        {
            return Ok(false);
        }
        for hop in self.index.last_hops() {
            for param in self.hop_params(hop)? {
                let unwraps_here = self.topology == Topology::Single && param.need_wrap_native;
                if !param.dex_func_has_recipient || unwraps_here {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Vertical branching applies to multi-exchange hops of a multi-hop or multi-route trade
    /// (any topology but a single swap), unless the hop trades exactly the pair of the whole
    /// trade.
    pub fn applies_vertical_branching(&self, swap: &IndexedSwap) -> bool {
        let same_pair_as_trade = swap.swap.src_token == self.price_route.src_token &&
            swap.swap.dest_token == self.price_route.dest_token;
        swap.swap_exchanges.len() > 1 && self.topology != Topology::Single && !same_pair_as_trade
    }

    /// Composes every route. Routes of a mega-swap are wrapped in metadata with their percent.
    pub fn compose_routes(&self) -> Result<Vec<u8>, EncodingError> {
        let mut body = Vec::new();
        for route in &self.index.routes {
            let route_bytes = self.compose_route(route)?;
            if self.topology == Topology::Parallel {
                body.extend(add_multi_swap_metadata(
                    route_bytes,
                    route.route.percent,
                    self.route_src_token_pos(),
                )?);
            } else {
                body.extend(route_bytes);
            }
        }
        Ok(body)
    }

    fn route_src_token_pos(&self) -> SrcTokenPos {
        if self.root_wrap {
            SrcTokenPos::Token(self.config.wrapped_native_token)
        } else if self
            .config
            .is_native(&self.price_route.src_token)
        {
            SrcTokenPos::Native
        } else {
            SrcTokenPos::Token(self.price_route.src_token)
        }
    }

    /// Composes the hops of one route in sequence.
    pub fn compose_route(&self, route: &IndexedRoute) -> Result<Vec<u8>, EncodingError> {
        let mut native_form = if self.root_wrap { NativeForm::Wrapped } else { NativeForm::Raw };
        let mut out = Vec::new();
        for swap in &route.swaps {
            let (hop_bytes, next_form) = self.compose_hop(route, swap, native_form)?;
            out.extend(hop_bytes);
            native_form = next_form;
        }
        if self.forward_native_balance && route.route_index + 1 == self.index.routes.len() {
            out.extend(send_native_frame().encode()?);
        }
        Ok(out)
    }

    /// Composes one hop. Returns its bytes and the form the native asset is held in afterwards.
    fn compose_hop(
        &self,
        route: &IndexedRoute,
        swap: &IndexedSwap,
        incoming: NativeForm,
    ) -> Result<(Vec<u8>, NativeForm), EncodingError> {
        let params = self.hop_params(swap)?;
        let is_eth_src = self
            .config
            .is_native(&swap.swap.src_token);
        let is_eth_dest = self
            .config
            .is_native(&swap.swap.dest_token);
        let any_needs_wrap = params
            .iter()
            .any(|param| param.need_wrap_native);
        let any_doesnt_need_wrap = params
            .iter()
            .any(|param| !param.need_wrap_native);
        let wrapped_src = is_eth_src && incoming == NativeForm::Wrapped;
        let apply_vertical_branching = self.applies_vertical_branching(swap);

        if wrapped_src && any_doesnt_need_wrap {
            return Err(EncodingError::UnsupportedTopology(format!(
                "Swap {} of route {} sells wrapped native asset to an exchange needing raw native \
                 asset",
                swap.swap_index, route.route_index
            )));
        }
        if self.topology == Topology::Single && is_eth_src && any_needs_wrap && any_doesnt_need_wrap
        {
            return Err(EncodingError::UnsupportedTopology(
                "A single swap cannot mix exchanges with and without native wrapping".to_string(),
            ));
        }
        if apply_vertical_branching &&
            (is_eth_src || is_eth_dest) &&
            params
                .iter()
                .any(|param| param.is_special_dex() && param.need_wrap_native)
        {
            return Err(EncodingError::UnsupportedTopology(format!(
                "Special exchange needing native wrapping inside the branch of swap {} of route {}",
                swap.swap_index, route.route_index
            )));
        }

        let branch_flag = apply_vertical_branching.then(|| {
            vertical_branch_flag(&VerticalBranchFlagContext {
                is_last_hop: swap.is_last,
                is_eth_dest,
                any_child_needs_wrap: any_needs_wrap,
                any_child_doesnt_need_wrap: any_doesnt_need_wrap,
            })
        });
        let hop = HopContext {
            is_eth_src,
            is_eth_dest,
            wrapped_src,
            apply_vertical_branching,
            force_dest_token: branch_flag
                .is_some_and(|flag| flag.balance_check == BalanceCheck::DestTokenBalance),
        };
        let group_each = self.topology != Topology::Single && swap.swap_exchanges.len() > 1;

        let mut body = Vec::new();
        let mut wrap_emitted = false;
        for (exchange, param) in swap.swap_exchanges.iter().zip(params.iter().copied()) {
            let mut group = Vec::new();
            if is_eth_src && param.need_wrap_native && !wrapped_src && (group_each || !wrap_emitted)
            {
                group.extend(
                    wrap_frame(self.config.wrapped_native_token, self.deposit_calldata()?)
                        .encode()?,
                );
                wrap_emitted = true;
            }
            group.extend(self.compose_exchange(route, swap, exchange, param, &hop)?);
            if group_each {
                let src_token_pos = if is_eth_src && !wrapped_src {
                    SrcTokenPos::Native
                } else {
                    SrcTokenPos::Token(self.leg_src_token(swap, param, &hop))
                };
                group = add_multi_swap_metadata(
                    group,
                    exchange.swap_exchange.percent,
                    src_token_pos,
                )?;
            }
            body.extend(group);
        }

        let mut out = match branch_flag {
            Some(flag) => self.pack_branch(swap, body, flag, is_eth_dest)?,
            None => body,
        };

        if is_eth_dest && !swap.is_last && any_needs_wrap && any_doesnt_need_wrap {
            out.extend(
                unwrap_frame(
                    self.config.wrapped_native_token,
                    self.withdraw_calldata()?,
                    MID_ROUTE_UNWRAP_FLAG,
                )?
                .encode()?,
            );
        }

        let next_form = if is_eth_dest && any_needs_wrap && !any_doesnt_need_wrap {
            NativeForm::Wrapped
        } else {
            NativeForm::Raw
        };

        debug!(
            route = route.route_index,
            swap = swap.swap_index,
            exchanges = swap.swap_exchanges.len(),
            vertical_branching = apply_vertical_branching,
            bytes = out.len(),
            "composed hop"
        );
        Ok((out, next_form))
    }

    fn pack_branch(
        &self,
        swap: &IndexedSwap,
        children: Vec<u8>,
        flag: Flag,
        is_eth_dest: bool,
    ) -> Result<Vec<u8>, EncodingError> {
        let dest_token = if is_eth_dest {
            self.config.wrapped_native_token
        } else {
            swap.swap.dest_token
        };
        pack_vertical_branch(self.config.executor_address, &children, flag, Some(dest_token))?
            .encode()
    }

    /// Token actually sold by an exchange: the wrapped native token when it needs wrapping.
    fn leg_src_token(&self, swap: &IndexedSwap, param: &ExchangeParam, hop: &HopContext) -> Address {
        if hop.is_eth_src && param.need_wrap_native {
            self.config.wrapped_native_token
        } else {
            swap.swap.src_token
        }
    }

    /// Token actually received by an exchange: the wrapped native token when it needs wrapping.
    fn leg_dest_token(
        &self,
        swap: &IndexedSwap,
        param: &ExchangeParam,
        hop: &HopContext,
    ) -> Address {
        if hop.is_eth_dest && param.need_wrap_native {
            self.config.wrapped_native_token
        } else {
            swap.swap.dest_token
        }
    }

    fn exchange_flag(
        &self,
        route: &IndexedRoute,
        swap: &IndexedSwap,
        param: &ExchangeParam,
        hop: &HopContext,
    ) -> Flag {
        let need_wrap = hop.is_eth_src && param.need_wrap_native;
        let need_unwrap = hop.is_eth_dest && param.need_wrap_native;
        match self.topology {
            Topology::Single => simple_swap_flag(&SimpleSwapFlagContext {
                is_eth_src: hop.is_eth_src,
                is_eth_dest: hop.is_eth_dest,
                need_wrap,
                need_unwrap,
                dex_func_has_recipient: param.dex_func_has_recipient,
            }),
            Topology::Sequential | Topology::Parallel => hop_flag(&HopFlagContext {
                is_first_hop: swap.is_first,
                is_last_hop: swap.is_last,
                is_eth_src: hop.is_eth_src,
                is_eth_dest: hop.is_eth_dest,
                need_wrap,
                need_unwrap,
                is_horizontal: route.is_horizontal(),
                is_special_dex: param.is_special_dex(),
                apply_vertical_branching: hop.apply_vertical_branching,
                dex_func_has_recipient: param.dex_func_has_recipient,
            }),
        }
    }

    /// Frames of one exchange: `[approve] swap [unwrap] [transfer]`.
    fn compose_exchange(
        &self,
        route: &IndexedRoute,
        swap: &IndexedSwap,
        exchange: &IndexedSwapExchange,
        param: &ExchangeParam,
        hop: &HopContext,
    ) -> Result<Vec<u8>, EncodingError> {
        let leg_src = self.leg_src_token(swap, param, hop);
        let leg_dest = self.leg_dest_token(swap, param, hop);
        let src_amount = &exchange.swap_exchange.src_amount;
        let flag = self.exchange_flag(route, swap, param, hop);

        let mut out = Vec::new();
        if !self.config.is_native(&leg_src) {
            out.extend(approve_frame(leg_src, param.spender(), src_amount)?.encode()?);
        }

        let frame = pack_call_frame(CallFrameParams {
            target: param.target_exchange,
            calldata: &param.exchange_data[..],
            src_amount,
            dest_token: leg_dest,
            flag,
            special_dex: param.special_dex(),
            dex_func_has_dest_token: param.dex_func_has_dest_token,
            force_dest_token: hop.force_dest_token && !self.config.is_native(&leg_dest),
            return_amount_pos: param.return_amount_pos.unwrap_or(0),
        })
        .map_err(|e| match e {
            EncodingError::PatternNotFound(msg) => EncodingError::PatternNotFound(format!(
                "{} (exchange {} in swap {} of route {})",
                msg, exchange.swap_exchange.exchange, swap.swap_index, route.route_index
            )),
            other => other,
        })?;
        out.extend(frame.encode()?);

        if self.topology == Topology::Single && hop.is_eth_dest && param.need_wrap_native {
            out.extend(
                unwrap_frame(self.config.wrapped_native_token, self.withdraw_calldata()?, UNWRAP_FLAG)?
                    .encode()?,
            );
        }

        if swap.is_last && !param.dex_func_has_recipient && !hop.is_eth_dest {
            out.extend(
                transfer_frame(
                    swap.swap.dest_token,
                    self.config.router_address,
                    &exchange.swap_exchange.dest_amount,
                )?
                .encode()?,
            );
        }
        Ok(out)
    }
}
