//! Per-row series derived from a finished trajectory, for charting.
//!
//! Depleted cells are skipped by every aggregate here, so a drawdown row with
//! half its scenarios depleted averages over the surviving half.

use super::types::{BalanceTrajectory, SolvencyBand};

/// Width either side of the target percentage that still counts as `Near`.
pub const SOLVENCY_BAND_WIDTH: f64 = 2.5;

pub fn mean_path(trajectory: &BalanceTrajectory) -> Vec<Option<f64>> {
    (0..trajectory.months())
        .map(|month| {
            let (sum, count) = live_values(trajectory, month)
                .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
            (count > 0).then(|| sum / count as f64)
        })
        .collect()
}

/// Per-row percentile of the non-depleted balances. `p` is clamped to 0..=100.
pub fn percentile_path(trajectory: &BalanceTrajectory, p: f64) -> Vec<Option<f64>> {
    (0..trajectory.months())
        .map(|month| {
            let mut values: Vec<f64> = live_values(trajectory, month).collect();
            percentile(&mut values, p)
        })
        .collect()
}

/// Share of scenarios still holding a balance, as a percentage per row.
pub fn solvent_percent(trajectory: &BalanceTrajectory) -> Vec<f64> {
    let scenarios = trajectory.scenarios() as f64;
    (0..trajectory.months())
        .map(|month| live_values(trajectory, month).count() as f64 / scenarios * 100.0)
        .collect()
}

pub fn solvency_bands(solvent: &[f64], target_pct: f64) -> Vec<SolvencyBand> {
    solvent
        .iter()
        .map(|pct| {
            if *pct > target_pct + SOLVENCY_BAND_WIDTH {
                SolvencyBand::Above
            } else if *pct < target_pct - SOLVENCY_BAND_WIDTH {
                SolvencyBand::Below
            } else {
                SolvencyBand::Near
            }
        })
        .collect()
}

/// `start + month / 12` for every row; `start` is a calendar year or an age.
pub fn time_axis(trajectory: &BalanceTrajectory, start: f64) -> Vec<f64> {
    (0..trajectory.months())
        .map(|month| start + month as f64 / 12.0)
        .collect()
}

/// Last valid balance of each scenario, or 0.0 if it never had one.
pub fn final_balances(trajectory: &BalanceTrajectory) -> Vec<f64> {
    (0..trajectory.scenarios())
        .map(|scenario| {
            (0..trajectory.months())
                .rev()
                .find_map(|month| trajectory.balance(month, scenario))
                .unwrap_or(0.0)
        })
        .collect()
}

fn live_values(trajectory: &BalanceTrajectory, month: usize) -> impl Iterator<Item = f64> + '_ {
    trajectory
        .matrix()
        .row(month)
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
}

fn percentile(values: &mut [f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len();
    if n == 1 {
        return Some(values[0]);
    }

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        Some(values[lower])
    } else {
        let w = rank - lower as f64;
        Some(values[lower] * (1.0 - w) + values[upper] * w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DisplayUnit, SimulationMatrix};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    // Three months, four scenarios; scenario 3 depletes at month 1 and
    // scenario 2 at month 2.
    fn mixed_trajectory() -> BalanceTrajectory {
        let nan = f64::NAN;
        let data = vec![
            1.0, 2.0, 3.0, 4.0, //
            2.0, 3.0, 4.0, nan, //
            3.0, 5.0, nan, nan, //
        ];
        BalanceTrajectory::new(
            SimulationMatrix::from_row_major(3, 4, data),
            DisplayUnit::Millions,
        )
    }

    #[test]
    fn mean_path_skips_depleted_cells() {
        let means = mean_path(&mixed_trajectory());
        assert_approx(means[0].unwrap(), 2.5);
        assert_approx(means[1].unwrap(), 3.0);
        assert_approx(means[2].unwrap(), 4.0);
    }

    #[test]
    fn mean_path_is_none_when_every_scenario_is_depleted() {
        let trajectory = BalanceTrajectory::new(
            SimulationMatrix::from_row_major(2, 2, vec![1.0, 1.0, f64::NAN, f64::NAN]),
            DisplayUnit::Millions,
        );
        assert_eq!(mean_path(&trajectory), vec![Some(1.0), None]);
    }

    #[test]
    fn solvent_percent_counts_live_scenarios() {
        assert_eq!(solvent_percent(&mixed_trajectory()), vec![100.0, 75.0, 50.0]);
    }

    #[test]
    fn solvency_bands_use_a_band_around_the_target() {
        let bands = solvency_bands(&[100.0, 92.0, 89.0, 80.0], 90.0);
        assert_eq!(
            bands,
            vec![
                SolvencyBand::Above,
                SolvencyBand::Near,
                SolvencyBand::Near,
                SolvencyBand::Below
            ]
        );
    }

    #[test]
    fn time_axis_advances_a_twelfth_per_month() {
        let axis = time_axis(&mixed_trajectory(), 65.0);
        assert_eq!(axis.len(), 3);
        assert_approx(axis[0], 65.0);
        assert_approx(axis[2], 65.0 + 2.0 / 12.0);
    }

    #[test]
    fn final_balances_carry_the_last_valid_value() {
        assert_eq!(final_balances(&mixed_trajectory()), vec![3.0, 5.0, 4.0, 4.0]);

        let never_valid = BalanceTrajectory::new(
            SimulationMatrix::from_row_major(2, 1, vec![f64::NAN, f64::NAN]),
            DisplayUnit::Millions,
        );
        assert_eq!(final_balances(&never_valid), vec![0.0]);
    }

    #[test]
    fn percentile_path_interpolates_between_ranks() {
        let medians = percentile_path(&mixed_trajectory(), 50.0);
        assert_approx(medians[0].unwrap(), 2.5);
        assert_approx(medians[1].unwrap(), 3.0);
        assert_approx(medians[2].unwrap(), 4.0);

        let p10 = percentile_path(&mixed_trajectory(), 10.0);
        assert_approx(p10[0].unwrap(), 1.3);
    }

    #[test]
    fn percentile_path_clamps_out_of_range_percentiles() {
        let trajectory = mixed_trajectory();
        assert_eq!(
            percentile_path(&trajectory, 150.0),
            percentile_path(&trajectory, 100.0)
        );
        assert_eq!(percentile_path(&trajectory, 150.0)[0], Some(4.0));
        assert_eq!(percentile_path(&trajectory, -50.0)[0], Some(1.0));
        assert_eq!(percentile_path(&trajectory, -50.0)[2], Some(3.0));
    }
}
