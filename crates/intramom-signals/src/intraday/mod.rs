//! Intraday momentum: the five-leg return decomposition and its loadings.

mod momentum;
mod returns;

pub use momentum::{
    IntradayMomentum, IntradayMomentumConfig, LOADING_COLUMNS, LOADING_DECIMALS, MomentumLoading,
    loadings_to_table,
};
pub use returns::{ANCHOR_SCHEDULE, AnchorPrices, IntradayReturnSet, log_ratio};
