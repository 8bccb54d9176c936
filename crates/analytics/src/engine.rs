use crate::error::AnalyticsError;
use crate::source::CycleSource;
use core_types::{CycleWithProfiles, RankingEntry, Scope, SummaryRow, User, Window};
use rust_decimal::Decimal;

/// Running totals of the three monetary counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub deposits: Decimal,
    pub withdrawals: Decimal,
    pub redemptions: Decimal,
}

impl Totals {
    /// Folds every profile of every cycle into one set of totals.
    pub fn of(cycles: &[CycleWithProfiles]) -> Self {
        cycles
            .iter()
            .flat_map(|c| c.profiles())
            .fold(Self::default(), |mut acc, profile| {
                acc.deposits += profile.deposits;
                acc.withdrawals += profile.withdrawals;
                acc.redemptions += profile.daily_redemption;
                acc
            })
    }

    /// Integer-rounded totals for display, e.g. `Dep: 100 | Wd: 150 | Red: 20`.
    pub fn breakdown(&self) -> String {
        format!(
            "Dep: {} | Wd: {} | Red: {}",
            self.deposits.round(),
            self.withdrawals.round(),
            self.redemptions.round()
        )
    }
}

/// A stateless calculator that reduces the user → cycle → profile graph to
/// one summary row per user.
#[derive(Debug, Default)]
pub struct AggregationEngine {}

impl AggregationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produces the summary rows for `scope` over `window`.
    ///
    /// Rows come out in the order the source lists users. With `Scope::All`,
    /// users without in-window cycles are skipped; with `Scope::Single` the
    /// requested user always gets a row. Any source error aborts the whole run.
    pub async fn aggregate(
        &self,
        source: &mut dyn CycleSource,
        scope: Scope,
        window: Window,
    ) -> Result<Vec<SummaryRow>, AnalyticsError> {
        let users = match scope {
            Scope::Single(user_id) => {
                let user = source
                    .user(user_id)
                    .await?
                    .ok_or(AnalyticsError::UserNotFound(user_id))?;
                vec![user]
            }
            Scope::All => source.users().await?,
        };

        let mut rows = Vec::with_capacity(users.len());
        for user in &users {
            let cycles = source.cycles_in_window(user.id, &window).await?;
            if cycles.is_empty() && scope == Scope::All {
                tracing::debug!(user = %user.username, "No cycles in window, skipping user.");
                continue;
            }
            rows.push(summarize(user, &cycles));
        }

        tracing::debug!(
            users = users.len(),
            rows = rows.len(),
            window_start = %window.start,
            "Aggregation complete."
        );
        Ok(rows)
    }

    /// Orders rows by profit, highest first, keeping the input order for ties.
    pub fn rank(&self, rows: Vec<SummaryRow>, limit: Option<usize>) -> Vec<RankingEntry> {
        let mut rows = rows;
        // `sort_by` is stable, so equal profits keep their relative order.
        rows.sort_by(|a, b| b.profit.cmp(&a.profit));
        rows.into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|row| RankingEntry {
                name: row.display_name,
                profit: row.profit,
            })
            .collect()
    }
}

/// Builds the summary row for one user from their in-window cycles.
pub fn summarize(user: &User, cycles: &[CycleWithProfiles]) -> SummaryRow {
    SummaryRow {
        display_name: user.username.to_uppercase(),
        cycles: cycles.len(),
        profit: cycles.iter().map(CycleWithProfiles::profit).sum(),
        breakdown: Totals::of(cycles).breakdown(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::source::SessionProvider;
    use chrono::{Duration, Utc};
    use core_types::Role;
    use rust_decimal_macros::dec;

    const NONE: [Decimal; 3] = [Decimal::ZERO; 3];

    async fn run(store: &MemoryStore, scope: Scope, window: Window) -> Result<Vec<SummaryRow>, AnalyticsError> {
        let mut session = store.open_session().await.unwrap();
        AggregationEngine::new()
            .aggregate(session.as_mut(), scope, window)
            .await
    }

    #[tokio::test]
    async fn single_cycle_profit_combines_parent_and_child() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let ana = store.add_user("ana", Role::User);
        store.add_cycle(
            &ana,
            now - Duration::hours(2),
            [dec!(100), dec!(150), dec!(0)],
            [dec!(0), dec!(0), dec!(20)],
        );

        let rows = run(&store, Scope::All, Window::last_week(now)).await.unwrap();

        assert_eq!(
            rows,
            vec![SummaryRow {
                display_name: "ANA".to_string(),
                cycles: 1,
                profit: dec!(70),
                breakdown: "Dep: 100 | Wd: 150 | Red: 20".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn all_users_scope_skips_users_without_cycles() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let ana = store.add_user("ana", Role::User);
        let bia = store.add_user("bia", Role::User);
        store.add_cycle(&ana, now - Duration::days(1), [dec!(10), dec!(30), dec!(0)], NONE);

        let rows = run(&store, Scope::All, Window::last_week(now)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].display_name, "ANA");

        let single = run(&store, Scope::Single(bia.id), Window::last_week(now)).await.unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].display_name, "BIA");
        assert_eq!(single[0].cycles, 0);
        assert_eq!(single[0].profit, Decimal::ZERO);
        assert_eq!(single[0].breakdown, "Dep: 0 | Wd: 0 | Red: 0");
    }

    #[tokio::test]
    async fn window_includes_exact_lower_bound_and_excludes_one_second_earlier() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let ana = store.add_user("ana", Role::User);
        store.add_cycle(&ana, now - Duration::days(7), [dec!(0), dec!(5), dec!(0)], NONE);
        store.add_cycle(
            &ana,
            now - Duration::days(7) - Duration::seconds(1),
            [dec!(0), dec!(1000), dec!(0)],
            NONE,
        );

        let rows = run(&store, Scope::Single(ana.id), Window::last_week(now)).await.unwrap();
        assert_eq!(rows[0].cycles, 1);
        assert_eq!(rows[0].profit, dec!(5));
    }

    #[tokio::test]
    async fn rows_follow_source_order_without_sorting() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for (name, withdrawals) in [("zoe", dec!(1)), ("ana", dec!(50)), ("mia", dec!(9))] {
            let user = store.add_user(name, Role::User);
            store.add_cycle(&user, now - Duration::hours(1), [dec!(0), withdrawals, dec!(0)], NONE);
        }

        let rows = run(&store, Scope::All, Window::last_week(now)).await.unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, ["ZOE", "ANA", "MIA"]);
    }

    #[tokio::test]
    async fn unknown_single_user_is_an_error() {
        let store = MemoryStore::new();
        let missing = uuid::Uuid::new_v4();
        let result = run(&store, Scope::Single(missing), Window::last_week(Utc::now())).await;
        assert!(matches!(result, Err(AnalyticsError::UserNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn data_access_fault_aborts_the_whole_run() {
        let store = MemoryStore::new();
        let ana = store.add_user("ana", Role::User);
        store.add_cycle(&ana, Utc::now(), [dec!(1), dec!(2), dec!(3)], NONE);
        store.set_unavailable(true);

        let result = run(&store, Scope::All, Window::last_week(Utc::now())).await;
        assert!(matches!(result, Err(AnalyticsError::DataAccess(_))));
        assert_eq!(store.open_sessions(), 0);
    }

    #[test]
    fn breakdown_rounds_half_to_even() {
        let totals = Totals {
            deposits: dec!(10.5),
            withdrawals: dec!(11.5),
            redemptions: dec!(0.49),
        };
        assert_eq!(totals.breakdown(), "Dep: 10 | Wd: 12 | Red: 0");
    }

    #[test]
    fn summary_profit_is_the_sum_of_cycle_profits() {
        let store = MemoryStore::new();
        let ana = store.add_user("ana", Role::User);
        let cycles = vec![
            store.add_cycle(&ana, Utc::now(), [dec!(100), dec!(150), dec!(0)], [dec!(0), dec!(0), dec!(20)]),
            store.add_cycle(&ana, Utc::now(), [dec!(40.25), dec!(0), dec!(0)], [dec!(5), dec!(12.5), dec!(0.75)]),
        ];

        let row = summarize(&ana, &cycles);

        let expected: Decimal = cycles.iter().map(|c| c.profit()).sum();
        assert_eq!(row.profit, expected);
        assert_eq!(row.profit, dec!(38));
        assert_eq!(row.cycles, 2);
    }

    #[test]
    fn rank_orders_by_profit_descending() {
        let row = |name: &str, profit: Decimal| SummaryRow {
            display_name: name.to_string(),
            cycles: 1,
            profit,
            breakdown: String::new(),
        };
        let ranked = AggregationEngine::new().rank(
            vec![row("A", dec!(70)), row("B", dec!(-10)), row("C", dec!(40))],
            None,
        );
        let profits: Vec<_> = ranked.iter().map(|e| e.profit).collect();
        assert_eq!(profits, vec![dec!(70), dec!(40), dec!(-10)]);

        let top = AggregationEngine::new().rank(vec![row("A", dec!(1)), row("B", dec!(2))], Some(1));
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "B");
    }
}
