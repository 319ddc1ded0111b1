use serde::Serialize;

/// Row-major matrix of simulated values: rows are time steps, columns are
/// independent scenarios.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl SimulationMatrix {
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    pub(crate) fn from_row_major(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        let start = row * self.cols;
        &mut self.data[start..start + self.cols]
    }

    /// Split borrow of two distinct rows, `prev < next`.
    pub(crate) fn row_pair_mut(&mut self, prev: usize, next: usize) -> (&[f64], &mut [f64]) {
        debug_assert!(prev < next);
        let cols = self.cols;
        let (head, tail) = self.data.split_at_mut(next * cols);
        (&head[prev * cols..(prev + 1) * cols], &mut tail[..cols])
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub(crate) fn truncate_rows(&mut self, rows: usize) {
        if rows < self.rows {
            self.rows = rows;
            self.data.truncate(rows * self.cols);
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayUnit {
    Currency,
    Millions,
}

/// Balances per month (rows) and scenario (columns).
///
/// Depleted cells are stored as NaN and surface as `None` from every
/// accessor, so callers never see the marker as a number.
#[derive(Debug, Clone)]
pub struct BalanceTrajectory {
    balances: SimulationMatrix,
    unit: DisplayUnit,
}

impl BalanceTrajectory {
    pub(crate) fn new(balances: SimulationMatrix, unit: DisplayUnit) -> Self {
        Self { balances, unit }
    }

    pub fn months(&self) -> usize {
        self.balances.rows()
    }

    pub fn scenarios(&self) -> usize {
        self.balances.cols()
    }

    pub fn unit(&self) -> DisplayUnit {
        self.unit
    }

    pub fn matrix(&self) -> &SimulationMatrix {
        &self.balances
    }

    pub fn balance(&self, month: usize, scenario: usize) -> Option<f64> {
        let value = self.balances.get(month, scenario);
        if value.is_nan() { None } else { Some(value) }
    }

    pub fn is_depleted(&self, month: usize, scenario: usize) -> bool {
        self.balance(month, scenario).is_none()
    }

    pub fn column(&self, scenario: usize) -> Vec<Option<f64>> {
        (0..self.months())
            .map(|month| self.balance(month, scenario))
            .collect()
    }

    pub fn nullable_rows(&self) -> Vec<Vec<Option<f64>>> {
        (0..self.months())
            .map(|month| {
                self.balances
                    .row(month)
                    .iter()
                    .map(|v| if v.is_nan() { None } else { Some(*v) })
                    .collect()
            })
            .collect()
    }
}

/// Accumulation-phase inputs. Every rate here is a whole percent.
#[derive(Debug, Clone, Copy)]
pub struct GrowthParams {
    pub start_capital: f64,
    pub return_mean_pct: f64,
    pub return_stdev_pct: f64,
    pub raise_mean_pct: f64,
    pub raise_stdev_pct: f64,
    pub monthly_contribution: f64,
    pub n_years: usize,
    pub n_simulations: usize,
}

/// Drawdown-phase inputs.
///
/// `return_mean` and `inflation_mean` accept either a whole percent or a
/// decimal fraction: values above 1 are divided by 100. The two stdevs are
/// always decimal fractions.
#[derive(Debug, Clone, Copy)]
pub struct WithdrawalParams {
    pub start_capital: f64,
    pub return_mean: f64,
    pub return_stdev: f64,
    pub inflation_mean: f64,
    pub inflation_stdev: f64,
    pub monthly_withdrawal: f64,
    pub n_years: usize,
    pub n_simulations: usize,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SolvencyBand {
    Above,
    Near,
    Below,
}
