//! Utility evaluation.
//!
//! Maps a device's aggregated (macro) data rate to a bounded, monotonically
//! increasing utility, with `scale`/`unscale` mapping between the natural
//! range and `[-1, 1]` for downstream reward use. The numeric form is a
//! replaceable parameter; the engine only relies on boundedness and
//! monotonicity.

use mecsim_common::UtilityParams;

/// Closed set of utility models.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UtilityModel {
    /// Log-shaped utility clamped to `[lower, upper]`:
    /// `w1 * log10(w2 + rate_mbps) + w3`.
    BoundedLog {
        /// Lower utility bound
        lower: f64,
        /// Upper utility bound
        upper: f64,
        /// Shape coefficients (w1, w2, w3)
        coeffs: (f64, f64, f64),
    },
}

impl UtilityModel {
    /// Builds the model from configuration.
    pub fn from_params(params: &UtilityParams) -> Self {
        UtilityModel::BoundedLog {
            lower: params.lower,
            upper: params.upper,
            coeffs: params.coeffs,
        }
    }

    /// Lower utility bound.
    pub fn lower(&self) -> f64 {
        match self {
            UtilityModel::BoundedLog { lower, .. } => *lower,
        }
    }

    /// Upper utility bound.
    pub fn upper(&self) -> f64 {
        match self {
            UtilityModel::BoundedLog { upper, .. } => *upper,
        }
    }

    /// Utility of an aggregated data rate in bit/s.
    pub fn utility(&self, rate: f64) -> f64 {
        match self {
            UtilityModel::BoundedLog {
                lower,
                upper,
                coeffs: (w1, w2, w3),
            } => {
                if rate <= 0.0 {
                    return *lower;
                }
                let rate_mbps = rate / 1e6;
                (w1 * (w2 + rate_mbps).log10() + w3).clamp(*lower, *upper)
            }
        }
    }

    /// Maps a utility from `[lower, upper]` to `[-1, 1]`.
    pub fn scale(&self, utility: f64) -> f64 {
        2.0 * (utility - self.lower()) / (self.upper() - self.lower()) - 1.0
    }

    /// Maps a scaled utility from `[-1, 1]` back to `[lower, upper]`.
    pub fn unscale(&self, scaled: f64) -> f64 {
        (scaled + 1.0) / 2.0 * (self.upper() - self.lower()) + self.lower()
    }
}
