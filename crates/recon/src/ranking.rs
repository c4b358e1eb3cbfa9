use crate::model::{DriverSettlement, TopEarner};
use crate::money::format_display;

/// Top `n` drivers by final gross, highest first.
///
/// Ties keep settlement order (drivers sorted by name), so the result is
/// the same whether computed at upload time or from a reloaded summary.
pub fn top_earners(settlements: &[DriverSettlement], n: usize, currency: &str) -> Vec<TopEarner> {
    let mut ranked: Vec<&DriverSettlement> = settlements.iter().collect();
    ranked.sort_by(|a, b| b.amounts.final_gross_cents.cmp(&a.amounts.final_gross_cents));

    ranked
        .into_iter()
        .take(n)
        .map(|s| TopEarner {
            driver: s.driver.to_string(),
            to_be_paid_cents: s.amounts.to_be_paid_cents,
            total_cash_cents: s.amounts.total_cash_cents,
            final_gross_cents: s.amounts.final_gross_cents,
            final_gross_display: format_display(s.amounts.final_gross_cents, currency),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::CanonicalName;
    use crate::model::SettlementAmounts;

    fn settlement(driver: &str, final_gross: i64) -> DriverSettlement {
        DriverSettlement {
            driver: CanonicalName::new(driver),
            amounts: SettlementAmounts {
                to_be_paid_cents: final_gross - 1_000,
                total_cash_cents: 1_000,
                final_gross_cents: final_gross,
                ..SettlementAmounts::default()
            },
        }
    }

    #[test]
    fn highest_first_and_truncated() {
        let rows = vec![
            settlement("Ana Pop", 50_000),
            settlement("Dan Ene", 133_500),
            settlement("Ion Radu", 90_000),
            settlement("Vlad Sava", 10_000),
        ];
        let top = top_earners(&rows, 3, "RON");
        let names: Vec<_> = top.iter().map(|t| t.driver.as_str()).collect();
        assert_eq!(names, vec!["Dan Ene", "Ion Radu", "Ana Pop"]);
        assert_eq!(top[0].final_gross_display, "1,335.00 RON");
        assert_eq!(top[0].to_be_paid_cents, 132_500);
        assert_eq!(top[0].total_cash_cents, 1_000);
    }

    #[test]
    fn ties_keep_input_order() {
        let rows = vec![
            settlement("Ana Pop", 10_000),
            settlement("Dan Ene", 10_000),
            settlement("Ion Radu", 10_000),
        ];
        let top = top_earners(&rows, 2, "RON");
        assert_eq!(top[0].driver, "Ana Pop");
        assert_eq!(top[1].driver, "Dan Ene");
    }

    #[test]
    fn fewer_drivers_than_n() {
        let rows = vec![settlement("Ana Pop", 10_000)];
        assert_eq!(top_earners(&rows, 3, "RON").len(), 1);
        assert!(top_earners(&[], 3, "RON").is_empty());
        assert!(top_earners(&rows, 0, "RON").is_empty());
    }
}
