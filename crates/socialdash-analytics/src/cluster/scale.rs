//! Column-wise z-score standardization.

use crate::error::AnalyticsError;

/// Per-column mean and population standard deviation learned from a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler<const D: usize> {
    pub means: [f64; D],
    pub std_devs: [f64; D],
}

impl<const D: usize> StandardScaler<D> {
    /// Learn column means and population (ddof = 0) standard deviations.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::EmptyTable`] for an empty sample and
    /// [`AnalyticsError::ZeroVariance`] naming the first constant column.
    pub fn fit(rows: &[[f64; D]], columns: &[&str; D]) -> Result<Self, AnalyticsError> {
        if rows.is_empty() {
            return Err(AnalyticsError::EmptyTable {
                metric: "standardization",
            });
        }

        #[allow(clippy::cast_precision_loss)]
        let n = rows.len() as f64;

        let mut means = [0.0; D];
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        for mean in &mut means {
            *mean /= n;
        }

        let mut std_devs = [0.0; D];
        for row in rows {
            for d in 0..D {
                let delta = row[d] - means[d];
                std_devs[d] += delta * delta;
            }
        }
        for (d, sd) in std_devs.iter_mut().enumerate() {
            *sd = (*sd / n).sqrt();
            if *sd == 0.0 {
                return Err(AnalyticsError::ZeroVariance {
                    column: columns[d].to_string(),
                });
            }
        }

        Ok(Self { means, std_devs })
    }

    #[must_use]
    pub fn transform(&self, rows: &[[f64; D]]) -> Vec<[f64; D]> {
        rows.iter()
            .map(|row| {
                let mut scaled = [0.0; D];
                for d in 0..D {
                    scaled[d] = (row[d] - self.means[d]) / self.std_devs[d];
                }
                scaled
            })
            .collect()
    }
}

/// Fit a scaler on `rows` and return the standardized rows.
///
/// # Errors
///
/// See [`StandardScaler::fit`].
pub fn standardize<const D: usize>(
    rows: &[[f64; D]],
    columns: &[&str; D],
) -> Result<Vec<[f64; D]>, AnalyticsError> {
    let scaler = StandardScaler::fit(rows, columns)?;
    Ok(scaler.transform(rows))
}
