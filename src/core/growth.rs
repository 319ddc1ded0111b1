use tracing::debug;

use super::compounding::compound_step_into;
use super::error::{SimResult, require_finite, require_positive, require_stdev};
use super::sampler::MatrixSampler;
use super::types::{BalanceTrajectory, DisplayUnit, GrowthParams, SimulationMatrix};

pub(crate) const MONTHS_PER_YEAR: usize = 12;

/// Accumulation phase: monthly contributions that step up once a year by a
/// simulated raise, compounded at simulated monthly returns.
///
/// Returns `12 * n_years + 1` rows (the starting balance, then one row per
/// month) and one column per scenario.
pub fn run_growth_simulation(
    params: &GrowthParams,
    sampler: &mut MatrixSampler,
) -> SimResult<BalanceTrajectory> {
    validate(params)?;

    let n_years = params.n_years;
    let n_sims = params.n_simulations;
    let n_months = MONTHS_PER_YEAR * n_years;

    let return_mean = params.return_mean_pct / 100.0;
    let return_stdev = params.return_stdev_pct / 100.0;
    let raise_mean = params.raise_mean_pct / 100.0;
    let raise_stdev = params.raise_stdev_pct / 100.0;

    let monthly_return_mean = return_mean / MONTHS_PER_YEAR as f64;
    let monthly_return_stdev = return_stdev / (MONTHS_PER_YEAR as f64).sqrt();
    debug!(
        n_years,
        n_sims, monthly_return_mean, monthly_return_stdev, raise_mean, "growth simulation"
    );

    // One extra year of returns covers the partial trailing year the walk
    // runs into before truncation.
    let buffered_months = n_months + MONTHS_PER_YEAR;
    let monthly_returns =
        sampler.sample(buffered_months, n_sims, monthly_return_mean, monthly_return_stdev)?;
    let raises = sampler.sample(n_years, n_sims, raise_mean + 1.0, raise_stdev)?;
    let contributions = contribution_schedule(params.monthly_contribution, &raises);

    let mut balances = SimulationMatrix::filled(buffered_months, n_sims, params.start_capital);
    for month in 0..buffered_months - 1 {
        let (current, next) = balances.row_pair_mut(month, month + 1);
        compound_step_into(
            current,
            monthly_returns.row(month),
            1,
            contributions.row(month + 1),
            next,
        )?;
    }
    balances.truncate_rows(n_months + 1);

    Ok(BalanceTrajectory::new(balances, DisplayUnit::Currency))
}

/// Monthly contribution per scenario. Row 0 is zero; rows `12y+1..=12y+12`
/// hold year `y`'s amount, which is year `y-1`'s amount times raise `y-1`.
fn contribution_schedule(base: f64, raises: &SimulationMatrix) -> SimulationMatrix {
    let years = raises.rows();
    let cols = raises.cols();

    let mut annual = SimulationMatrix::filled(years + 1, cols, base);
    for year in 0..years {
        let (current, next) = annual.row_pair_mut(year, year + 1);
        for ((slot, amount), raise) in next.iter_mut().zip(current).zip(raises.row(year)) {
            *slot = amount * raise;
        }
    }

    let mut monthly = SimulationMatrix::filled(1 + MONTHS_PER_YEAR * (years + 1), cols, 0.0);
    for month in 1..monthly.rows() {
        monthly
            .row_mut(month)
            .copy_from_slice(annual.row((month - 1) / MONTHS_PER_YEAR));
    }
    monthly
}

fn validate(params: &GrowthParams) -> SimResult<()> {
    require_positive("n_years", params.n_years)?;
    require_positive("n_simulations", params.n_simulations)?;
    require_finite("start_capital", params.start_capital)?;
    require_finite("return_mean_pct", params.return_mean_pct)?;
    require_stdev("return_stdev_pct", params.return_stdev_pct)?;
    require_finite("raise_mean_pct", params.raise_mean_pct)?;
    require_stdev("raise_stdev_pct", params.raise_stdev_pct)?;
    require_finite("monthly_contribution", params.monthly_contribution)?;
    Ok(())
}
