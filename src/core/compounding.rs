use super::error::{SimError, SimResult};

/// Balance after one year of `n` compounding periods at `periodic_rate`,
/// with `contribution` paid in at the end of every period.
///
/// With `n == 1` this is a single period: `principal * (1 + r) + contribution`.
/// The result is rounded to the cent once, after both terms are summed.
pub fn compound_step(principal: f64, periodic_rate: f64, n: u32, contribution: f64) -> f64 {
    let periods = f64::from(n);
    let balance = if periodic_rate == 0.0 {
        principal + contribution * periods
    } else {
        let per_period = periodic_rate / periods;
        let factor = (1.0 + per_period).powf(periods);
        principal * factor + contribution * ((factor - 1.0) / per_period)
    };
    round_cents(balance)
}

/// Element-wise [`compound_step`] over per-scenario slices.
pub fn compound_step_all(
    principals: &[f64],
    rates: &[f64],
    n: u32,
    contributions: &[f64],
) -> SimResult<Vec<f64>> {
    let mut out = vec![0.0; principals.len()];
    compound_step_into(principals, rates, n, contributions, &mut out)?;
    Ok(out)
}

pub(crate) fn compound_step_into(
    principals: &[f64],
    rates: &[f64],
    n: u32,
    contributions: &[f64],
    out: &mut [f64],
) -> SimResult<()> {
    if n == 0 {
        return Err(SimError::InvalidParameter {
            name: "n_compounds_per_year",
            reason: "must be at least 1".to_string(),
        });
    }
    for len in [rates.len(), contributions.len(), out.len()] {
        if len != principals.len() {
            return Err(SimError::InvalidDimension {
                what: "matching scenario count",
                value: len,
            });
        }
    }

    for (((slot, principal), rate), contribution) in out
        .iter_mut()
        .zip(principals)
        .zip(rates)
        .zip(contributions)
    {
        *slot = compound_step(*principal, *rate, n, *contribution);
    }
    Ok(())
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    #[test]
    fn single_period_five_percent() {
        assert_approx_tol(compound_step(1000.0, 0.05, 1, 0.0), 1050.0, 0.01);
    }

    #[test]
    fn zero_rate_degenerates_to_level_contributions() {
        assert_eq!(compound_step(500.0, 0.0, 12, 100.0), 1700.0);
        assert_eq!(compound_step(500.0, 0.0, 1, 100.0), 600.0);
    }

    #[test]
    fn monthly_compounding_matches_annuity_formula() {
        // 10_000 at 6% compounded monthly plus 100 per month.
        // 10_000 * 1.005^12 = 10_616.78; 100 * (1.005^12 - 1) / 0.005 = 1_233.56
        assert_approx_tol(compound_step(10_000.0, 0.06, 12, 100.0), 11_850.33, 0.01);
    }

    #[test]
    fn negative_rate_shrinks_principal() {
        assert_approx_tol(compound_step(1000.0, -0.1, 1, 0.0), 900.0, 1e-9);
    }

    #[test]
    fn result_is_rounded_to_cents() {
        let balance = compound_step(100.0, 0.0123456, 1, 0.0);
        assert_eq!(balance, 101.23);
    }

    #[test]
    fn vector_form_applies_per_scenario() {
        let out = compound_step_all(&[100.0, 200.0], &[0.0, 0.1], 1, &[10.0, 0.0]).unwrap();
        assert_eq!(out, vec![110.0, 220.0]);
    }

    #[test]
    fn vector_form_rejects_mismatched_lengths() {
        let err = compound_step_all(&[100.0, 200.0], &[0.0], 1, &[0.0, 0.0]).unwrap_err();
        assert!(matches!(err, SimError::InvalidDimension { value: 1, .. }));
    }

    #[test]
    fn vector_form_rejects_zero_periods() {
        let err = compound_step_all(&[100.0], &[0.1], 0, &[0.0]).unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { .. }));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_zero_rate_is_principal_plus_contributions(
            principal in -1_000_000i64..1_000_000,
            contribution in 0i64..100_000,
            n in 1u32..=12,
        ) {
            let p = principal as f64 / 100.0;
            let c = contribution as f64 / 100.0;
            let expected = p + c * f64::from(n);
            prop_assert!((compound_step(p, 0.0, n, c) - expected).abs() <= 0.005);
        }

        #[test]
        fn prop_single_period_is_growth_plus_contribution(
            principal in 0.0f64..1_000_000.0,
            rate in 0.001f64..0.5,
            contribution in 0.0f64..10_000.0,
        ) {
            let expected = principal * (1.0 + rate) + contribution;
            prop_assert!((compound_step(principal, rate, 1, contribution) - expected).abs() <= 0.006);
        }
    }
}
