pub mod trend;

pub use trend::{forecast_covenant, forecast_trend, ForecastInput, TrendDirection, TrendForecast};
