use crate::encoding::{
    errors::EncodingError,
    models::{PriceRoute, Route, Swap, SwapExchange},
};

/// Shape of a price route, deciding how the whole tree is packed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    /// One route with one hop.
    Single,
    /// One route with several hops.
    Sequential,
    /// Several routes (a mega-swap).
    Parallel,
}

impl Topology {
    pub fn of(price_route: &PriceRoute) -> Self {
        match price_route.best_route.as_slice() {
            [route] if route.swaps.len() == 1 => Topology::Single,
            [_] => Topology::Sequential,
            _ => Topology::Parallel,
        }
    }
}

/// A swap exchange together with the position of its `ExchangeParam`.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedSwapExchange<'a> {
    pub param_index: usize,
    pub swap_exchange: &'a SwapExchange,
}

/// One hop with its position in the route.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedSwap<'a> {
    pub swap_index: usize,
    pub is_first: bool,
    pub is_last: bool,
    pub swap: &'a Swap,
    pub swap_exchanges: Vec<IndexedSwapExchange<'a>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IndexedRoute<'a> {
    pub route_index: usize,
    pub route: &'a Route,
    pub swaps: Vec<IndexedSwap<'a>>,
}

impl IndexedRoute<'_> {
    /// The route has more than one hop.
    pub fn is_horizontal(&self) -> bool {
        self.swaps.len() > 1
    }
}

/// The price route with every swap exchange assigned its parameter index, in route, swap, swap
/// exchange order.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteIndex<'a> {
    pub routes: Vec<IndexedRoute<'a>>,
    exchange_count: usize,
}

impl<'a> RouteIndex<'a> {
    pub fn new(price_route: &'a PriceRoute) -> Self {
        let mut param_index = 0;
        let mut routes = Vec::with_capacity(price_route.best_route.len());
        for (route_index, route) in price_route.best_route.iter().enumerate() {
            let swap_count = route.swaps.len();
            let mut swaps = Vec::with_capacity(swap_count);
            for (swap_index, swap) in route.swaps.iter().enumerate() {
                let mut swap_exchanges = Vec::with_capacity(swap.swap_exchanges.len());
                for swap_exchange in &swap.swap_exchanges {
                    swap_exchanges.push(IndexedSwapExchange { param_index, swap_exchange });
                    param_index += 1;
                }
                swaps.push(IndexedSwap {
                    swap_index,
                    is_first: swap_index == 0,
                    is_last: swap_index + 1 == swap_count,
                    swap,
                    swap_exchanges,
                });
            }
            routes.push(IndexedRoute { route_index, route, swaps });
        }
        Self { routes, exchange_count: param_index }
    }

    /// Total number of swap exchanges in the tree.
    pub fn exchange_count(&self) -> usize {
        self.exchange_count
    }

    /// Fails if the parameter list is not aligned with the swap exchanges.
    pub fn check_params_len(&self, params_len: usize) -> Result<(), EncodingError> {
        if params_len != self.exchange_count {
            return Err(EncodingError::StructuralViolation(format!(
                "Expected {} exchange params, got {}",
                self.exchange_count, params_len
            )));
        }
        Ok(())
    }

    /// Iterates over the first hop of every route.
    pub fn first_hops(&self) -> impl Iterator<Item = &IndexedSwap<'a>> {
        self.routes
            .iter()
            .filter_map(|route| route.swaps.first())
    }

    /// Iterates over the last hop of every route.
    pub fn last_hops(&self) -> impl Iterator<Item = &IndexedSwap<'a>> {
        self.routes
            .iter()
            .filter_map(|route| route.swaps.last())
    }
}
