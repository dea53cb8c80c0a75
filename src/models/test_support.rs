//! Series builders shared by model tests.

use chrono::{TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::core::{TimeSeries, YearMonth};

/// Monthly series starting January 2000.
pub(crate) fn series_from(values: Vec<f64>) -> TimeSeries {
    let start = YearMonth::new(2000, 1).unwrap().index();
    let timestamps = (0..values.len() as i64)
        .map(|i| {
            let month = YearMonth::from_index(start + i);
            Utc.with_ymd_and_hms(month.year(), month.month(), 1, 0, 0, 0)
                .unwrap()
        })
        .collect();
    TimeSeries::univariate(timestamps, values).unwrap()
}

/// Positive monthly series with trend, multiplicative seasonality and
/// log-normal noise.
pub(crate) fn monthly_series(n: usize, seed: u64) -> TimeSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::<f64>::new(0.0, 0.03).unwrap();
    let values = (0..n)
        .map(|i| {
            let t = i as f64;
            let season = 1.0 + 0.2 * (2.0 * std::f64::consts::PI * t / 12.0).sin();
            (100.0 + 0.5 * t) * season * noise.sample(&mut rng).exp()
        })
        .collect();
    series_from(values)
}
