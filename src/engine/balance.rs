//! # engine::balance
//!
//! **Balance Engine**: reduces the expense history to a short list of
//! "who pays whom".
//!
//! ```text
//!  expenses ──▶ net positions ──▶ creditors (net > ε, largest first)
//!                              └─▶ debtors   (net < −ε, largest debt first)
//!                                        │
//!                                        ▼
//!                       two-pointer greedy sweep ──▶ Vec<SettlementTransaction>
//! ```
//!
//! Pure: no I/O, no memory between calls.  Ties in the sort keep the order in
//! which each person first appears in the history (payer before
//! participants), so output is deterministic for a given input.
//!
//! The greedy sweep is a heuristic for few transactions, not a proven
//! minimum: it is optimal when debts pair off one-to-one, and never emits
//! more than `people − 1` transactions.

use std::collections::HashMap;

use tracing::debug;

use crate::models::{Amount, ExpenseRecord, NetPosition, SettlementTransaction, EPSILON};

// ─── Net Positions ────────────────────────────────────────────────────────────

/// Everyone's aggregate balance, in first-appearance order.
///
/// Payer is credited the full total and each participant is debited their
/// share, using the stored numbers as-is even when a record's splits do not
/// add up to its total.
pub fn net_positions(expenses: &[ExpenseRecord]) -> Vec<NetPosition> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut positions: Vec<NetPosition> = Vec::new();

    for expense in expenses {
        adjust(&mut index, &mut positions, &expense.payer, expense.total_amount);
        for split in &expense.splits {
            adjust(&mut index, &mut positions, &split.name, -split.amount);
        }
    }

    positions
}

fn adjust<'a>(
    index: &mut HashMap<&'a str, usize>,
    positions: &mut Vec<NetPosition>,
    person: &'a str,
    delta: Amount,
) {
    let slot = *index.entry(person).or_insert_with(|| {
        positions.push(NetPosition { person: person.to_string(), net: Amount::ZERO });
        positions.len() - 1
    });
    positions[slot].net += delta;
}

// ─── Settlement ───────────────────────────────────────────────────────────────

/// Compute the settlement transactions for an expense history.
pub fn compute_settlements(expenses: &[ExpenseRecord]) -> Vec<SettlementTransaction> {
    settle_positions(&net_positions(expenses))
}

/// Greedy two-pointer reduction over precomputed net positions.
pub fn settle_positions(positions: &[NetPosition]) -> Vec<SettlementTransaction> {
    // ── 1. Partition; anyone within ±ε is already settled ─────────────────────
    let mut creditors: Vec<(&str, Amount)> = positions
        .iter()
        .filter(|p| p.net > EPSILON)
        .map(|p| (p.person.as_str(), p.net))
        .collect();
    let mut debtors: Vec<(&str, Amount)> = positions
        .iter()
        .filter(|p| p.net < -EPSILON)
        .map(|p| (p.person.as_str(), p.net))
        .collect();

    // ── 2. Largest first (stable, so ties keep first-appearance order) ────────
    creditors.sort_by(|a, b| b.1.cmp(&a.1));
    debtors.sort_by(|a, b| a.1.cmp(&b.1));

    // ── 3. Sweep ──────────────────────────────────────────────────────────────
    let mut result = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < debtors.len() && j < creditors.len() {
        let (debtor, owed) = debtors[i];
        let (creditor, due) = creditors[j];
        let amount = (-owed).min(due);

        if amount > EPSILON {
            result.push(SettlementTransaction::new(debtor, creditor, amount));
        }

        debtors[i].1 = owed + amount;
        creditors[j].1 = due - amount;

        // A residual of one minor unit is settled, same as in the partition.
        if debtors[i].1.is_negligible() {
            i += 1;
        }
        if creditors[j].1.is_negligible() {
            j += 1;
        }
    }

    debug!(
        people       = positions.len(),
        transactions = result.len(),
        "Settlements computed"
    );
    result
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Split;
    use chrono::Utc;

    fn amt(major: i64) -> Amount {
        Amount::from_minor(major * 100)
    }

    fn expense(payer: &str, total: Amount, splits: &[(&str, Amount)]) -> ExpenseRecord {
        ExpenseRecord {
            id:           uuid::Uuid::new_v4().to_string(),
            description:  "test".into(),
            total_amount: total,
            payer:        payer.into(),
            date:         Utc::now(),
            splits:       splits.iter().map(|(n, a)| Split::new(*n, *a)).collect(),
            category:     None,
        }
    }

    fn tx(from: &str, to: &str, amount: Amount) -> SettlementTransaction {
        SettlementTransaction::new(from, to, amount)
    }

    fn net_of(positions: &[NetPosition], who: &str) -> Amount {
        positions.iter().find(|p| p.person == who).map(|p| p.net).unwrap_or_default()
    }

    #[test]
    fn no_expenses_means_no_settlements() {
        assert!(compute_settlements(&[]).is_empty());
    }

    #[test]
    fn one_payer_three_way_split() {
        let expenses = [expense("A", amt(300), &[("A", amt(100)), ("B", amt(100)), ("C", amt(100))])];

        let positions = net_positions(&expenses);
        assert_eq!(net_of(&positions, "A"), amt(200));
        assert_eq!(net_of(&positions, "B"), amt(-100));
        assert_eq!(net_of(&positions, "C"), amt(-100));

        assert_eq!(
            compute_settlements(&expenses),
            vec![tx("B", "A", amt(100)), tx("C", "A", amt(100))]
        );
    }

    #[test]
    fn mutually_cancelling_expenses_settle_to_nothing() {
        let expenses = [
            expense("A", amt(100), &[("A", amt(50)), ("B", amt(50))]),
            expense("B", amt(100), &[("A", amt(50)), ("B", amt(50))]),
        ];
        assert!(compute_settlements(&expenses).is_empty());
    }

    #[test]
    fn largest_debtor_pays_largest_creditor_first() {
        // A +70, B +30, C −80, D −20
        let expenses = [
            expense("A", amt(100), &[("C", amt(80)), ("D", amt(20))]),
            expense("B", amt(30), &[("A", amt(30))]),
        ];

        let positions = net_positions(&expenses);
        assert_eq!(net_of(&positions, "A"), amt(70));
        assert_eq!(net_of(&positions, "B"), amt(30));
        assert_eq!(net_of(&positions, "C"), amt(-80));
        assert_eq!(net_of(&positions, "D"), amt(-20));

        assert_eq!(
            compute_settlements(&expenses),
            vec![tx("C", "A", amt(70)), tx("C", "B", amt(10)), tx("D", "B", amt(20))]
        );
    }

    #[test]
    fn sub_epsilon_residue_is_treated_as_settled() {
        // 100 split three ways leaves a one-paisa gap on the payer.
        let third = Amount::from_minor(3333);
        let expenses = [expense("A", amt(100), &[("A", third), ("B", third), ("C", third)])];

        let settlements = compute_settlements(&expenses);
        assert_eq!(settlements, vec![tx("B", "A", third), tx("C", "A", third)]);
    }

    #[test]
    fn participant_with_zero_share_is_excluded() {
        let expenses = [expense("A", amt(50), &[("B", amt(50)), ("C", Amount::ZERO)])];
        let settlements = compute_settlements(&expenses);
        assert_eq!(settlements, vec![tx("B", "A", amt(50))]);
        assert!(settlements.iter().all(|t| t.from != "C" && t.to != "C"));
    }

    #[test]
    fn ties_follow_first_appearance() {
        let expenses = [expense("A", amt(100), &[("Z", amt(50)), ("Y", amt(50))])];
        assert_eq!(
            compute_settlements(&expenses),
            vec![tx("Z", "A", amt(50)), tx("Y", "A", amt(50))]
        );
    }

    #[test]
    fn output_is_deterministic_and_conserves_positions() {
        let expenses = [
            expense("Amit", amt(5000), &[("Amit", amt(1700)), ("Rahul", amt(1700)), ("Sneha", amt(1600))]),
            expense("Rahul", amt(1200), &[("Amit", amt(400)), ("Sneha", amt(400)), ("Vikram", amt(400))]),
            expense("Sneha", Amount::from_minor(99_99), &[
                ("Vikram", Amount::from_minor(33_33)),
                ("Amit", Amount::from_minor(33_33)),
                ("Rahul", Amount::from_minor(33_33)),
            ]),
            expense("Vikram", amt(800), &[("Vikram", amt(200)), ("Amit", amt(600))]),
        ];

        let first = compute_settlements(&expenses);
        let second = compute_settlements(&expenses);
        assert_eq!(first, second);

        let positions = net_positions(&expenses);
        let nonzero = positions.iter().filter(|p| !p.net.is_negligible()).count();
        assert!(first.len() <= nonzero.saturating_sub(1));

        for t in &first {
            assert_ne!(t.from, t.to);
            assert!(t.amount > EPSILON);
        }

        for p in &positions {
            let received: Amount = first.iter().filter(|t| t.to == p.person).map(|t| t.amount).sum();
            let paid: Amount = first.iter().filter(|t| t.from == p.person).map(|t| t.amount).sum();
            assert!(
                (received - paid - p.net).is_negligible(),
                "{} nets {} but settles {}",
                p.person,
                p.net,
                received - paid
            );
        }
    }

    #[test]
    fn leftover_minor_unit_does_not_leak_into_the_next_pair() {
        // A +1.01 and B +1.00 against C −1.00, D −1.00, E −0.01 (E excluded).
        // After C pays A, A's 0.01 residual must not be silently taken off D.
        let expenses = [
            expense("A", Amount::from_minor(101), &[("C", amt(1)), ("E", Amount::from_minor(1))]),
            expense("B", amt(1), &[("D", amt(1))]),
        ];
        assert_eq!(
            compute_settlements(&expenses),
            vec![tx("C", "A", amt(1)), tx("D", "B", amt(1))]
        );
    }

    #[test]
    fn amounts_far_beyond_the_maximum_saturate_instead_of_panicking() {
        let huge = Amount::from_f64(5e28).unwrap();
        let expenses = [
            expense("A", huge, &[("B", huge)]),
            expense("A", huge, &[("B", huge)]),
        ];

        let positions = net_positions(&expenses);
        assert_eq!(net_of(&positions, "A"), huge + huge);
        assert_eq!(net_of(&positions, "B"), -(huge + huge));
        assert_eq!(compute_settlements(&expenses), vec![tx("B", "A", huge + huge)]);
    }

    #[test]
    fn unbalanced_record_is_used_as_stored() {
        // Splits short of the total by 10: payer is credited the full total anyway.
        let expenses = [expense("A", amt(100), &[("B", amt(90))])];
        let positions = net_positions(&expenses);
        assert_eq!(net_of(&positions, "A"), amt(100));
        assert_eq!(net_of(&positions, "B"), amt(-90));
        assert_eq!(compute_settlements(&expenses), vec![tx("B", "A", amt(90))]);
    }

    // ─── Properties ───────────────────────────────────────────────────────────

    mod properties {
        use proptest::prelude::*;

        use super::expense;
        use crate::engine::balance::{compute_settlements, net_positions};
        use crate::models::{Amount, ExpenseRecord, EPSILON};

        const PEOPLE: [&str; 5] = ["Amit", "Rahul", "Sneha", "Vikram", "Priya"];

        fn config() -> ProptestConfig {
            ProptestConfig {
                cases: std::env::var("PROPTEST_CASES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(256),
                failure_persistence: None,
                ..ProptestConfig::default()
            }
        }

        /// Shares in minor units, often 0-2 paise so positions land inside ±ε.
        fn arb_share() -> impl Strategy<Value = i64> {
            prop_oneof![0i64..=2, 0i64..=50_000]
        }

        /// The payer may also owe a share, and the total may run one paisa
        /// over its splits.
        fn arb_expense() -> impl Strategy<Value = ExpenseRecord> {
            (
                0..PEOPLE.len(),
                proptest::collection::vec((0..PEOPLE.len(), arb_share()), 1..=5),
                0i64..=1,
            )
                .prop_map(|(payer, shares, residue)| {
                    let splits: Vec<(&str, Amount)> = shares
                        .iter()
                        .map(|&(who, minor)| (PEOPLE[who], Amount::from_minor(minor)))
                        .collect();
                    let total = splits.iter().map(|(_, a)| *a).sum::<Amount>()
                        + Amount::from_minor(residue);
                    expense(PEOPLE[payer], total, &splits)
                })
        }

        proptest! {
            #![proptest_config(config())]

            #[test]
            fn settlements_are_deterministic_and_well_formed(
                expenses in proptest::collection::vec(arb_expense(), 0..=12),
            ) {
                let positions = net_positions(&expenses);
                let settlements = compute_settlements(&expenses);

                prop_assert_eq!(&settlements, &compute_settlements(&expenses));

                let active = positions.iter().filter(|p| !p.net.is_negligible()).count();
                prop_assert!(
                    settlements.len() <= active.saturating_sub(1),
                    "{} transactions for {} unsettled people",
                    settlements.len(),
                    active
                );

                for t in &settlements {
                    prop_assert_ne!(&t.from, &t.to);
                    prop_assert!(t.amount > EPSILON, "{} -> {} for {}", t.from, t.to, t.amount);
                }
            }

            #[test]
            fn settlements_conserve_each_position(
                expenses in proptest::collection::vec(arb_expense(), 0..=12),
            ) {
                let positions = net_positions(&expenses);
                let settlements = compute_settlements(&expenses);

                // Everyone is settled to within ε, except that paise dropped
                // as residue (plus any over-total paise) end up on whoever is
                // still open when the sweep stops, all on one side.
                let mut residue = Amount::ZERO;
                let mut open = Amount::ZERO;
                let mut open_side: Option<bool> = None;

                for p in &positions {
                    let received: Amount =
                        settlements.iter().filter(|t| t.to == p.person).map(|t| t.amount).sum();
                    let paid: Amount =
                        settlements.iter().filter(|t| t.from == p.person).map(|t| t.amount).sum();
                    let gap = p.net - (received - paid);

                    if gap.is_negligible() {
                        residue += gap.abs();
                    } else {
                        let owes = gap.is_negative();
                        prop_assert_eq!(*open_side.get_or_insert(owes), owes, "open gaps on both sides");
                        open += gap.abs();
                    }
                }

                let imbalance: Amount = positions.iter().map(|p| p.net).sum();
                prop_assert!(
                    open <= residue + imbalance.abs(),
                    "unsettled {} exceeds residue {} plus imbalance {}",
                    open,
                    residue,
                    imbalance
                );
            }
        }
    }
}
