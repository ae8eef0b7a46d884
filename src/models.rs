use crate::status::Status;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of one calendar day, as carried by `data-day-id`.
///
/// The server hands out ids of the form `YYYYMMDD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayId(pub i64);

impl DayId {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(i64::from(date.year()) * 10_000 + i64::from(date.month()) * 100 + i64::from(date.day()))
    }

    pub fn to_date(self) -> Option<NaiveDate> {
        if self.0 <= 0 {
            return None;
        }
        let year = i32::try_from(self.0 / 10_000).ok()?;
        let month = u32::try_from(self.0 / 100 % 100).ok()?;
        let day = u32::try_from(self.0 % 100).ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

impl fmt::Display for DayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type PlanId = u64;
pub type TaskId = u64;

/// Plan colours, handed out in creation order.
pub const PLAN_COLORS: [&str; 7] = [
    "#FFB3BA", "#FFDFBA", "#FFFFBA", "#BAFFC9", "#BAE1FF", "#D4BEEE", "#FFDFD3",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayEntry {
    pub status: Status,
    pub updated_at: String,
}

/// One scheduled piece of a study plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub task_id: TaskId,
    /// ISO date (`YYYY-MM-DD`).
    pub date: String,
    pub title: String,
    pub order: u32,
    pub status: Status,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plan {
    pub plan_id: PlanId,
    pub title: String,
    pub subject: String,
    pub created_at: String,
    /// Sorted by date, then order.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Plan {
    pub fn color(&self) -> &'static str {
        let slot = self.plan_id.saturating_sub(1) % PLAN_COLORS.len() as u64;
        PLAN_COLORS[slot as usize]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    /// Statuses set by clicking a day, keyed by ISO date (`YYYY-MM-DD`).
    #[serde(default)]
    pub days: BTreeMap<String, DayEntry>,
    #[serde(default)]
    pub plans: BTreeMap<PlanId, Plan>,
}

impl AppData {
    /// The task that speaks for `date`: among plans passing the filter, the
    /// oldest plan with work that day wins, and its last task in order.
    pub fn lead_task(&self, date: NaiveDate, plan: Option<PlanId>) -> Option<(&Plan, &Task)> {
        let key = date_key(date);
        self.plans
            .values()
            .filter(|candidate| plan.is_none_or(|id| candidate.plan_id == id))
            .find_map(|candidate| {
                candidate
                    .tasks
                    .iter()
                    .filter(|task| task.date == key)
                    .max_by_key(|task| task.order)
                    .map(|task| (candidate, task))
            })
    }

    /// A day with plan work shows that work's status. Otherwise the status
    /// clicked onto the day, and `none` when nothing was ever recorded.
    pub fn status_on(&self, date: NaiveDate, plan: Option<PlanId>) -> Status {
        if let Some((_, task)) = self.lead_task(date, plan) {
            return task.status;
        }
        self.days
            .get(&date_key(date))
            .map_or(Status::None, |entry| entry.status)
    }

    /// Records a clicked status on the day and on every task scheduled that day.
    pub fn set_day_status(&mut self, date: NaiveDate, status: Status, updated_at: String) {
        let key = date_key(date);
        for task in self.plans.values_mut().flat_map(|plan| plan.tasks.iter_mut()) {
            if task.date == key {
                task.status = status;
            }
        }
        self.days.insert(key, DayEntry { status, updated_at });
    }

    pub fn tasks_on(&self, date: NaiveDate) -> impl Iterator<Item = (&Plan, &Task)> {
        let key = date_key(date);
        self.plans.values().flat_map(move |plan| {
            let key = key.clone();
            plan.tasks
                .iter()
                .filter(move |task| task.date == key)
                .map(move |task| (plan, task))
        })
    }
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub day_id: DayId,
    pub status: Status,
}

/// Update request as received by the server, before the status is checked.
#[derive(Debug, Deserialize)]
pub struct StatusUpdatePayload {
    pub day_id: i64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UpdateResponse {
    pub fn ok() -> Self {
        Self { ok: true, error: None }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DayDetail {
    pub ok: bool,
    pub day_id: DayId,
    pub date: String,
    pub status: Status,
    pub tasks: Vec<DayTask>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayTask {
    pub task_id: TaskId,
    pub plan_id: PlanId,
    pub plan_title: String,
    pub subject: String,
    pub task_title: String,
    pub status: Status,
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub plan_id: Option<PlanId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlanFilter {
    pub plan_id: Option<PlanId>,
}

#[derive(Debug, Serialize)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<PlanId>,
    pub counts: BTreeMap<Status, u32>,
    pub planned_days: u32,
    pub completion_rate: f64,
    pub plans: PlanStats,
}

/// Task totals over every plan, or over the filtered one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanStats {
    pub total_plans: u32,
    pub total_assigned: u32,
    pub completed: u32,
    /// Whole percent, rounded down.
    pub completion_rate: u32,
}

#[derive(Debug, Deserialize)]
pub struct CreatePlanRequest {
    pub title: String,
    #[serde(default)]
    pub subject: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlanRequest {
    pub title: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlanCreated {
    pub ok: bool,
    pub plan_id: PlanId,
}

/// One day of a plan as submitted by the planner form.
#[derive(Debug, Clone, Deserialize)]
pub struct DailyPlanInput {
    pub date: String,
    #[serde(default)]
    pub description: String,
    pub order: Option<u32>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveDailyPlansRequest {
    #[serde(default)]
    pub daily_plans: Vec<DailyPlanInput>,
}

#[derive(Debug, Serialize)]
pub struct DailyPlansSaved {
    pub ok: bool,
    pub plan_id: PlanId,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyPlanView {
    pub task_id: TaskId,
    pub date: String,
    pub description: String,
    pub order: u32,
    pub status: Status,
}

impl From<&Task> for DailyPlanView {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.task_id,
            date: task.date.clone(),
            description: task.title.clone(),
            order: task.order,
            status: task.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DailyPlansResponse {
    pub ok: bool,
    pub plan_id: PlanId,
    pub daily_plans: Vec<DailyPlanView>,
}

#[derive(Debug, Serialize)]
pub struct PlanView {
    pub plan_id: PlanId,
    pub title: String,
    pub subject: String,
    pub created_at: String,
    pub color: &'static str,
    pub daily_plans: Vec<DailyPlanView>,
}

impl From<&Plan> for PlanView {
    fn from(plan: &Plan) -> Self {
        Self {
            plan_id: plan.plan_id,
            title: plan.title.clone(),
            subject: plan.subject.clone(),
            created_at: plan.created_at.clone(),
            color: plan.color(),
            daily_plans: plan.tasks.iter().map(DailyPlanView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlansResponse {
    pub ok: bool,
    pub plans: Vec<PlanView>,
}

/// Checkbox toggle on a single task: `done` when checked, `planned` otherwise.
#[derive(Debug, Deserialize)]
pub struct TaskCompleteRequest {
    pub task_id: TaskId,
    #[serde(default)]
    pub completed: bool,
}
