use num_traits::Zero;

use crate::encoding::{
    errors::EncodingError,
    evm::constants::{PERCENT_SUM_TOLERANCE, SWAP_EXCHANGE_100_PERCENTAGE},
    models::PriceRoute,
};

/// Validates that a price route forms a tree the compiler can pack.
#[derive(Clone, Debug, Default)]
pub struct PriceRouteValidator;

impl PriceRouteValidator {
    /// Raises an error if a level of the tree is empty or its percentages are invalid.
    ///
    /// Percentages are considered valid if all the following conditions are met:
    /// * Each percentage is in `(0, 100]`
    /// * Route percentages sum to 100
    /// * The swap exchange percentages of every swap sum to 100
    pub fn validate_percentages(&self, price_route: &PriceRoute) -> Result<(), EncodingError> {
        if price_route.best_route.is_empty() {
            return Err(EncodingError::StructuralViolation(
                "Price route has no routes".to_string(),
            ));
        }
        Self::check_sum(
            price_route
                .best_route
                .iter()
                .map(|route| route.percent),
            "Route",
        )?;

        for (route_index, route) in price_route.best_route.iter().enumerate() {
            if route.swaps.is_empty() {
                return Err(EncodingError::StructuralViolation(format!(
                    "Route {} has no swaps",
                    route_index
                )));
            }
            for (swap_index, swap) in route.swaps.iter().enumerate() {
                if swap.swap_exchanges.is_empty() {
                    return Err(EncodingError::StructuralViolation(format!(
                        "Swap {} of route {} has no swap exchanges",
                        swap_index, route_index
                    )));
                }
                Self::check_sum(
                    swap.swap_exchanges
                        .iter()
                        .map(|swap_exchange| swap_exchange.percent),
                    &format!("Swap exchange of swap {} in route {}", swap_index, route_index),
                )?;
            }
        }
        Ok(())
    }

    /// Raises an error if the hops of a route do not chain from the trade source to the trade
    /// destination.
    pub fn validate_token_path(&self, price_route: &PriceRoute) -> Result<(), EncodingError> {
        for (route_index, route) in price_route.best_route.iter().enumerate() {
            let (Some(first), Some(last)) = (route.swaps.first(), route.swaps.last()) else {
                continue;
            };
            if first.src_token != price_route.src_token {
                return Err(EncodingError::StructuralViolation(format!(
                    "Route {} starts with {} instead of the trade source {}",
                    route_index, first.src_token, price_route.src_token
                )));
            }
            if last.dest_token != price_route.dest_token {
                return Err(EncodingError::StructuralViolation(format!(
                    "Route {} ends with {} instead of the trade destination {}",
                    route_index, last.dest_token, price_route.dest_token
                )));
            }
            for (swap_index, pair) in route.swaps.windows(2).enumerate() {
                if pair[0].dest_token != pair[1].src_token {
                    return Err(EncodingError::StructuralViolation(format!(
                        "Swap {} of route {} outputs {} but the next swap sells {}",
                        swap_index, route_index, pair[0].dest_token, pair[1].src_token
                    )));
                }
            }
        }
        Ok(())
    }

    /// Raises an error if an amount sold anywhere in the tree is zero.
    pub fn validate_amounts(&self, price_route: &PriceRoute) -> Result<(), EncodingError> {
        if price_route.src_amount.is_zero() {
            return Err(EncodingError::StructuralViolation(
                "Trade source amount is zero".to_string(),
            ));
        }
        let zero_exchange = price_route
            .best_route
            .iter()
            .flat_map(|route| route.swaps.iter())
            .flat_map(|swap| swap.swap_exchanges.iter())
            .find(|swap_exchange| swap_exchange.src_amount.is_zero());
        if let Some(swap_exchange) = zero_exchange {
            return Err(EncodingError::StructuralViolation(format!(
                "Swap exchange {} sells a zero amount",
                swap_exchange.exchange
            )));
        }
        Ok(())
    }

    fn check_sum(
        percents: impl Iterator<Item = f64>,
        what: &str,
    ) -> Result<(), EncodingError> {
        let mut total = 0.0;
        for percent in percents {
            if percent <= 0.0 || percent > SWAP_EXCHANGE_100_PERCENTAGE + PERCENT_SUM_TOLERANCE {
                return Err(EncodingError::StructuralViolation(format!(
                    "{} percentage must be in (0, 100], got {}",
                    what, percent
                )));
            }
            total += percent;
        }
        if (total - SWAP_EXCHANGE_100_PERCENTAGE).abs() > PERCENT_SUM_TOLERANCE {
            return Err(EncodingError::StructuralViolation(format!(
                "{} percentages must sum to 100, got {}",
                what, total
            )));
        }
        Ok(())
    }
}
