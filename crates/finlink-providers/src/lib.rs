//! Upstream provider adapters: one module per data source, each
//! implementing `finlink_core::Provider`, plus the
//! registry that builds the default ordered provider list from credential
//! enablement.

mod alphavantage;
mod finnhub;
mod fmp;
mod polygon;
mod quartr;
mod quiver;
mod ratelimit;
mod registry;
mod sec_edgar;
mod support;
mod yahoo;

pub use alphavantage::AlphaVantageProvider;
pub use finnhub::FinnhubProvider;
pub use fmp::FmpProvider;
pub use polygon::PolygonProvider;
pub use quartr::QuartrProvider;
pub use quiver::QuiverProvider;
pub use ratelimit::RateLimiter;
pub use registry::ProviderRegistry;
pub use sec_edgar::SecEdgarProvider;
pub use yahoo::YahooProvider;
