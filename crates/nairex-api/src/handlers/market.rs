//! Static market tickers derived from the rate table.

use axum::extract::{Path, State};
use axum::Json;

use nairex_types::{ApiResponse, Currency, Error};

use crate::error::ApiResult;
use crate::extractors::CurrentUser;
use crate::state::AppState;

/// `GET /api/v1/markets/tickers/{market}`
///
/// Markets are the concatenation of two currency codes (`usdtngn`). The
/// buy side quotes `rate[from][to]`, the sell side the inverse market.
pub async fn ticker(
    State(state): State<AppState>,
    CurrentUser(_caller): CurrentUser,
    Path(market): Path<String>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    for from in Currency::ALL {
        for to in Currency::ALL {
            if format!("{}{}", from.code(), to.code()) == market {
                let rate = state.rates.rate(from, to);
                return Ok(Json(ApiResponse::new(serde_json::json!({
                    "market": market,
                    "ticker": {
                        "open": rate,
                        "buy": rate,
                        "sell": state.rates.rate(to, from),
                    },
                }))));
            }
        }
    }
    Err(Error::not_found("market not found").into())
}
