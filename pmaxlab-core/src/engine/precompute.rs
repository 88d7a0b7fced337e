//! Indicator precomputation.
//!
//! ATR, the trend average, the band arena and every filter indicator are
//! computed once before the bar loop. The loop only reads them by index.

use crate::components::filter::FilterChain;
use crate::components::indicator::{Indicator, IndicatorSeries, IndicatorValues};
use crate::config::StrategyConfig;
use crate::domain::Bar;
use crate::indicators::{
    average_true_range, band_states, moving_average, trend_series, BandReference, BandState,
    IndicatorError, SeriesSource,
};

/// Key of the PMax trend line in [`Precomputed::values`].
pub const TREND_KEY: &str = "pmax_trend";

/// Everything the bar loop reads.
#[derive(Debug, Clone)]
pub struct Precomputed {
    pub atr: IndicatorSeries,
    pub ma: IndicatorSeries,
    pub bands: Vec<Option<BandState>>,
    pub trend: IndicatorSeries,
    /// Series crossed against the trend line.
    pub signal_reference: IndicatorSeries,
    /// Name-keyed view for filters: ATR, MA, trend and filter oscillators.
    pub values: IndicatorValues,
}

/// Run the indicator pipeline over `bars`.
pub fn precompute(
    bars: &[Bar],
    config: &StrategyConfig,
    filters: &FilterChain,
) -> Result<Precomputed, IndicatorError> {
    let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let low: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let close: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let atr = average_true_range(&high, &low, &close, config.atr_period)?;
    let ma = moving_average(&close, config.ma_period, config.ma_method)?;
    let close_series = IndicatorSeries::from_values(close);

    let reference = match config.band_reference {
        BandReference::Ma => ma.clone(),
        BandReference::Hl2 => IndicatorSeries::from_values(bars.iter().map(Bar::hl2).collect()),
        BandReference::Close => close_series.clone(),
    };
    let pick = |source: SeriesSource| match source {
        SeriesSource::Ma => ma.clone(),
        SeriesSource::Close => close_series.clone(),
    };
    let base = pick(config.base_series);
    let signal_reference = pick(config.signal_reference);

    let bands = band_states(&reference, &atr, &base, &config.band_params()?)?;
    let trend = trend_series(&bands);

    let mut values = precompute_indicators(bars, &filters.indicators());
    values.insert(format!("atr_{}", config.atr_period), atr.clone());
    values.insert(format!("{}_{}", config.ma_method, config.ma_period), ma.clone());
    values.insert(TREND_KEY, trend.clone());

    Ok(Precomputed {
        atr,
        ma,
        bands,
        trend,
        signal_reference,
        values,
    })
}

/// Compute a set of bar indicators into a name-keyed container.
pub fn precompute_indicators(bars: &[Bar], indicators: &[&dyn Indicator]) -> IndicatorValues {
    let mut iv = IndicatorValues::new();
    for indicator in indicators {
        let series = indicator.compute(bars);
        debug_assert_eq!(
            series.len(),
            bars.len(),
            "indicator '{}' produced {} values for {} bars",
            indicator.name(),
            series.len(),
            bars.len(),
        );
        iv.insert(indicator.name(), series);
    }
    iv
}
