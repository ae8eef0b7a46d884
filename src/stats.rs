use crate::calendar::month_dates;
use crate::models::{AppData, MonthSummary, PlanId};
use crate::plans::plan_stats;
use crate::status::{Status, CYCLE};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Per-status counts for a month, seen through an optional plan filter.
/// Days marked `none` carry no plan and are left out of the completion rate.
pub fn build_summary(
    year: i32,
    month: u32,
    plan: Option<PlanId>,
    data: &AppData,
) -> Option<MonthSummary> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;

    let mut counts: BTreeMap<Status, u32> = CYCLE.iter().map(|status| (*status, 0)).collect();
    for date in month_dates(first) {
        *counts.entry(data.status_on(date, plan)).or_default() += 1;
    }

    let none = counts.get(&Status::None).copied().unwrap_or_default();
    let done = counts.get(&Status::Done).copied().unwrap_or_default();
    let total: u32 = counts.values().sum();
    let planned_days = total - none;
    let completion_rate = if planned_days == 0 {
        0.0
    } else {
        f64::from(done) / f64::from(planned_days)
    };

    Some(MonthSummary {
        year,
        month,
        plan_id: plan,
        counts,
        planned_days,
        completion_rate,
        plans: plan_stats(data, plan),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{date_key, DailyPlanInput, DayEntry};
    use crate::plans::{create_plan, replace_tasks};

    fn entry(status: Status) -> DayEntry {
        DayEntry {
            status,
            updated_at: String::new(),
        }
    }

    #[test]
    fn summary_counts_every_day_of_month() {
        let mut data = AppData::default();
        for (day, status) in [(3, Status::Done), (4, Status::Done), (5, Status::Partial)] {
            let date = NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
            data.days.insert(date_key(date), entry(status));
        }

        let summary = build_summary(2025, 3, None, &data).unwrap();
        assert_eq!(summary.counts.values().sum::<u32>(), 31);
        assert_eq!(summary.counts[&Status::Done], 2);
        assert_eq!(summary.counts[&Status::Partial], 1);
        assert_eq!(summary.counts[&Status::None], 28);
        assert_eq!(summary.counts[&Status::Planned], 0);
        assert_eq!(summary.planned_days, 3);
        assert!((summary.completion_rate - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_follows_plan_filter() {
        let mut data = AppData::default();
        let first = create_plan(&mut data, "Algebra", "math", String::new()).unwrap();
        let second = create_plan(&mut data, "Poems", "lit", String::new()).unwrap();
        let day = |date: &str| DailyPlanInput {
            date: date.to_string(),
            description: "read".to_string(),
            order: None,
            status: None,
        };
        replace_tasks(&mut data, first, &[day("2025-03-09"), day("2025-03-10")]).unwrap();
        replace_tasks(&mut data, second, &[day("2025-03-20")]).unwrap();

        let all = build_summary(2025, 3, None, &data).unwrap();
        assert_eq!(all.counts[&Status::Planned], 3);
        assert_eq!(all.plans.total_plans, 2);

        let only_second = build_summary(2025, 3, Some(second), &data).unwrap();
        assert_eq!(only_second.counts[&Status::Planned], 1);
        assert_eq!(only_second.plan_id, Some(second));
        assert_eq!(only_second.plans.total_assigned, 1);
    }

    #[test]
    fn summary_of_empty_month_has_zero_rate() {
        let summary = build_summary(2024, 2, None, &AppData::default()).unwrap();
        assert_eq!(summary.counts[&Status::None], 29);
        assert_eq!(summary.planned_days, 0);
        assert_eq!(summary.completion_rate, 0.0);
    }

    #[test]
    fn summary_rejects_invalid_month() {
        assert!(build_summary(2025, 0, None, &AppData::default()).is_none());
    }
}
