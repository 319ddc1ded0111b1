use tracing::debug;

use super::error::{SimResult, require_finite, require_positive, require_stdev};
use super::growth::MONTHS_PER_YEAR;
use super::sampler::MatrixSampler;
use super::types::{BalanceTrajectory, DisplayUnit, SimulationMatrix, WithdrawalParams};

/// Spread of the monthly withdrawal around its nominal amount. Fixed, in
/// currency units, whatever the size of the withdrawal.
pub const WITHDRAWAL_NOISE_STDEV: f64 = 0.05;

const DISPLAY_SCALE: f64 = 1_000_000.0;

/// Drawdown phase: a fixed-ish monthly withdrawal taken from a balance that
/// grows by the simulated return net of simulated inflation.
///
/// A scenario whose balance goes negative is depleted from that month on.
/// Balances are reported in millions.
pub fn run_withdrawal_simulation(
    params: &WithdrawalParams,
    sampler: &mut MatrixSampler,
) -> SimResult<BalanceTrajectory> {
    validate(params)?;

    let n_sims = params.n_simulations;
    let n_months = MONTHS_PER_YEAR * params.n_years;

    let return_mean = percent_or_fraction(params.return_mean);
    let inflation_mean = percent_or_fraction(params.inflation_mean);

    let months = MONTHS_PER_YEAR as f64;
    let monthly_return_mean = return_mean / months;
    let monthly_return_stdev = params.return_stdev / months.sqrt();
    let monthly_inflation_mean = inflation_mean / months;
    let monthly_inflation_stdev = params.inflation_stdev / months.sqrt();
    debug!(
        n_years = params.n_years,
        n_sims,
        monthly_return_mean,
        monthly_return_stdev,
        monthly_inflation_mean,
        monthly_inflation_stdev,
        "withdrawal simulation"
    );

    let returns = sampler.sample(n_months, n_sims, monthly_return_mean, monthly_return_stdev)?;
    let inflation = sampler.sample(
        n_months,
        n_sims,
        monthly_inflation_mean,
        monthly_inflation_stdev,
    )?;
    let withdrawals = sampler.sample(
        n_months,
        n_sims,
        params.monthly_withdrawal,
        WITHDRAWAL_NOISE_STDEV,
    )?;

    let start = if params.start_capital < 0.0 {
        f64::NAN
    } else {
        params.start_capital
    };
    let mut balances = SimulationMatrix::filled(n_months + 1, n_sims, start);
    for month in 0..n_months {
        let (current, next) = balances.row_pair_mut(month, month + 1);
        let steps = returns
            .row(month)
            .iter()
            .zip(inflation.row(month))
            .zip(withdrawals.row(month));
        for ((slot, balance), ((ret, infl), withdrawal)) in next.iter_mut().zip(current).zip(steps)
        {
            *slot = drawdown_step(*balance, *ret, *infl, *withdrawal);
        }
    }

    for value in balances.values_mut() {
        *value /= DISPLAY_SCALE;
    }

    Ok(BalanceTrajectory::new(balances, DisplayUnit::Millions))
}

/// Inflation is subtracted straight from the nominal return. A depleted
/// balance stays depleted.
fn drawdown_step(balance: f64, ret: f64, inflation: f64, withdrawal: f64) -> f64 {
    if balance.is_nan() {
        return f64::NAN;
    }
    let next = balance * (1.0 + ret - inflation) - withdrawal;
    if next < 0.0 { f64::NAN } else { next }
}

/// Values above 1 are whole percents; anything else is already a fraction.
fn percent_or_fraction(value: f64) -> f64 {
    if value > 1.0 { value / 100.0 } else { value }
}

fn validate(params: &WithdrawalParams) -> SimResult<()> {
    require_positive("n_years", params.n_years)?;
    require_positive("n_simulations", params.n_simulations)?;
    require_finite("start_capital", params.start_capital)?;
    require_finite("return_mean", params.return_mean)?;
    require_stdev("return_stdev", params.return_stdev)?;
    require_finite("inflation_mean", params.inflation_mean)?;
    require_stdev("inflation_stdev", params.inflation_stdev)?;
    require_finite("monthly_withdrawal", params.monthly_withdrawal)?;
    Ok(())
}
