//! Reverse (goal-driven) projection tests.

use funnel_core::{
    config::{FunnelConfig, ProjectionSettings},
    funnel::{reverse_chain, FunnelTemplate, Requirement, MAX_WHOLE_UNITS},
    inputs::Inputs,
    projection::{project, project_with},
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

fn goal_inputs(target: f64) -> Inputs {
    Inputs {
        avg_lifetime_value:      4500.0,
        monthly_marketing_budget: 2000.0,
        cost_per_click:          4.0,
        management_fee:          0.0,
        landing_page_conversion: 5.0,
        discovery_call_rate:     50.0,
        sales_call_rate:         50.0,
        proposal_rate:           50.0,
        client_won_rate:         50.0,
        target_new_clients:      target,
        client_spend:            1500.0,
    }
}

#[test]
fn goal_of_two_clients_doubles_upstream() {
    let m = project(&goal_inputs(2.0), &FunnelConfig::default()).unwrap();

    assert_eq!(m.est_proposals, Some(Requirement::Count(4)));
    assert_eq!(m.est_sales_calls, Some(Requirement::Count(8)));
    assert_eq!(m.est_discovery_calls, Some(Requirement::Count(16)));
    assert_eq!(m.est_leads, Requirement::Count(32));
    assert_eq!(m.est_clicks, Requirement::Count(640));
    assert_eq!(m.required_budget, Some(2560.0));
    assert_eq!(m.est_revenue, 9000.0);
}

#[test]
fn zero_rate_makes_goal_unreachable_upstream() {
    let inputs = Inputs {
        sales_call_rate: 0.0,
        ..goal_inputs(2.0)
    };
    let m = project(&inputs, &FunnelConfig::default()).unwrap();

    assert_eq!(m.est_proposals, Some(Requirement::Count(4)));
    assert_eq!(m.est_sales_calls, Some(Requirement::Count(8)));
    assert_eq!(m.est_discovery_calls, Some(Requirement::Unreachable));
    assert_eq!(m.est_leads, Requirement::Unreachable);
    assert_eq!(m.est_clicks, Requirement::Unreachable);
    assert_eq!(m.required_budget, None);
    assert_eq!(m.est_leads.count(), 0);
}

#[test]
fn zero_won_rate_makes_every_stage_unreachable() {
    let inputs = Inputs {
        client_won_rate: 0.0,
        ..goal_inputs(3.0)
    };
    let m = project(&inputs, &FunnelConfig::default()).unwrap();

    assert_eq!(m.est_proposals, Some(Requirement::Unreachable));
    assert!(!m.est_leads.is_reachable());
    // Revenue from the goal does not depend on the rates.
    assert_eq!(m.est_revenue, 13_500.0);
}

#[test]
fn exact_quotients_are_not_rounded_past() {
    let inputs = Inputs {
        client_won_rate: 60.0,
        ..goal_inputs(3.0)
    };
    let m = project(&inputs, &FunnelConfig::default()).unwrap();
    assert_eq!(m.est_proposals, Some(Requirement::Count(5)));
}

#[test]
fn direct_template_skips_missing_stages() {
    let m = project_with(
        &goal_inputs(2.0),
        &FunnelTemplate::direct(),
        &ProjectionSettings::default(),
    )
    .unwrap();

    assert_eq!(m.est_proposals, None);
    assert_eq!(m.est_discovery_calls, None);
    assert_eq!(m.est_sales_calls, Some(Requirement::Count(4)));
    assert_eq!(m.est_leads, Requirement::Count(8));
}

#[test]
fn large_goal_is_never_underestimated() {
    // 100_010_001 × 99.99 % is 99_999_999.9999, one client short.
    let chain = reverse_chain(100_000_000.0, &[100.0, 99.99]);
    assert_eq!(chain[1], Requirement::Count(100_010_002));
    assert_eq!(chain[0], Requirement::Count(100_010_002));
}

#[test]
fn fractional_goal_needs_the_next_whole_client() {
    let chain = reverse_chain(2.000_000_001, &[100.0, 100.0, 100.0]);
    assert_eq!(chain, vec![Requirement::Count(3); 3]);
}

fn random_target(rng: &mut Pcg64Mcg) -> f64 {
    match rng.gen_range(0..3) {
        0 => f64::from(rng.gen_range(1u32..=50)),
        1 => rng.gen_range(0.0..50.0),
        _ => rng.gen_range(1.0..10.0) * 10f64.powi(rng.gen_range(3..=12)),
    }
}

/// Each requirement is the smallest whole number that, pushed forward
/// through its rate, still covers the next stage's requirement.
#[test]
fn every_requirement_is_the_smallest_sufficient_integer() {
    let mut rng = Pcg64Mcg::seed_from_u64(0xCE11_1165);
    let mut unreachable_seen = 0;

    for _ in 0..5_000 {
        let n = rng.gen_range(3..=5);
        let rates: Vec<f64> = (0..n).map(|_| rng.gen_range(0.5..=100.0)).collect();
        let target = random_target(&mut rng);

        let chain = reverse_chain(target, &rates);

        for i in (0..n).rev() {
            let downstream = if i + 1 < n {
                match chain[i + 1] {
                    Requirement::Count(c) => c as f64,
                    Requirement::Unreachable => {
                        assert_eq!(chain[i], Requirement::Unreachable);
                        continue;
                    }
                }
            } else {
                target
            };
            let fraction = rates[i] / 100.0;

            let required = match chain[i] {
                Requirement::Count(c) => c as f64,
                Requirement::Unreachable => {
                    // Only counts past the exact-integer range give up.
                    unreachable_seen += 1;
                    assert!(
                        (MAX_WHOLE_UNITS - 1.0) * fraction < downstream,
                        "{downstream} at {}% reported unreachable",
                        rates[i]
                    );
                    continue;
                }
            };

            assert!(
                required * fraction >= downstream,
                "{required} at {}% does not cover {downstream}",
                rates[i]
            );
            assert!(
                (required - 1.0) * fraction < downstream,
                "{required} at {}% is not minimal for {downstream}",
                rates[i]
            );
        }
    }
    assert!(unreachable_seen > 0);
}
