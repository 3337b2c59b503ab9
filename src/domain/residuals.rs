//! Raw pricing residuals and their volatility-standardized z-scores.

use super::error::PairtraderError;
use super::garch::{GarchError, GarchFitter, GarchParams};
use super::rolling::rolling_mean;
use super::series::DatedSeries;

/// Minimum residual sample for the conditional-volatility fit.
pub const MIN_RESIDUAL_OBSERVATIONS: usize = 10;

#[derive(Debug, Clone)]
pub struct StandardizedResiduals {
    pub raw: DatedSeries,
    pub volatility: DatedSeries,
    pub rolling_mean: DatedSeries,
    pub z: DatedSeries,
    pub garch: GarchParams,
}

/// e[t] = stock[t] - beta[t] * etf[t] wherever all three are defined.
pub fn raw_residuals(
    etf_returns: &DatedSeries,
    stock_returns: &DatedSeries,
    betas: &DatedSeries,
) -> DatedSeries {
    betas
        .iter()
        .filter_map(|(date, beta)| {
            let x = etf_returns.get(date)?;
            let y = stock_returns.get(date)?;
            Some((date, y - beta * x))
        })
        .collect()
}

/// z[t] = (e[t] - mean(e over window ending t)) / vol[t].
///
/// Fails with `InsufficientData` below [`MIN_RESIDUAL_OBSERVATIONS`] and with
/// `ModelFit` when the volatility model does not converge.
pub fn standardize(
    raw: &DatedSeries,
    window: usize,
    fitter: &GarchFitter,
) -> Result<StandardizedResiduals, PairtraderError> {
    if raw.len() < MIN_RESIDUAL_OBSERVATIONS {
        return Err(PairtraderError::InsufficientData {
            what: "residuals".into(),
            observations: raw.len(),
            minimum: MIN_RESIDUAL_OBSERVATIONS,
            span: raw.span(),
        });
    }

    let values: Vec<f64> = raw.values().collect();
    let fit = fitter.fit(&values).map_err(|e| model_fit_error(e, raw))?;
    tracing::debug!(
        mu = fit.params.mu,
        omega = fit.params.omega,
        alpha = fit.params.alpha,
        beta = fit.params.beta,
        iterations = fit.iterations,
        "garch(1,1) fitted"
    );

    let volatility: DatedSeries = raw
        .dates()
        .zip(fit.conditional_volatility.iter().copied())
        .collect();
    let means = rolling_mean(raw, window);

    let mut z = DatedSeries::with_capacity(means.len());
    for (date, mean) in means.iter() {
        let (Some(e), Some(vol)) = (raw.get(date), volatility.get(date)) else {
            continue;
        };
        if vol > 0.0 && vol.is_finite() {
            z.push(date, (e - mean) / vol);
        }
    }

    Ok(StandardizedResiduals {
        raw: raw.clone(),
        volatility,
        rolling_mean: means,
        z,
        garch: fit.params,
    })
}

fn model_fit_error(err: GarchError, raw: &DatedSeries) -> PairtraderError {
    PairtraderError::ModelFit {
        reason: err.to_string(),
        observations: raw.len(),
        span: raw.span(),
    }
}
