use crate::models::{date_key, AppData, DailyPlanInput, Plan, PlanId, PlanStats, Task, TaskId};
use crate::status::{Status, UnknownStatus};
use chrono::NaiveDate;

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("plan {0} not found")]
    PlanNotFound(PlanId),

    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    #[error("plan title is required")]
    MissingTitle,

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error(transparent)]
    Status(#[from] UnknownStatus),
}

pub fn create_plan(
    data: &mut AppData,
    title: &str,
    subject: &str,
    created_at: String,
) -> Result<PlanId, PlanError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(PlanError::MissingTitle);
    }
    let plan_id = data.plans.keys().next_back().map_or(1, |last| last + 1);
    data.plans.insert(
        plan_id,
        Plan {
            plan_id,
            title: title.to_string(),
            subject: subject.trim().to_string(),
            created_at,
            tasks: Vec::new(),
        },
    );
    Ok(plan_id)
}

pub fn update_plan(
    data: &mut AppData,
    plan_id: PlanId,
    title: Option<&str>,
    subject: Option<&str>,
) -> Result<(), PlanError> {
    let plan = data.plans.get_mut(&plan_id).ok_or(PlanError::PlanNotFound(plan_id))?;
    if let Some(title) = title {
        let title = title.trim();
        if title.is_empty() {
            return Err(PlanError::MissingTitle);
        }
        plan.title = title.to_string();
    }
    if let Some(subject) = subject {
        plan.subject = subject.trim().to_string();
    }
    Ok(())
}

pub fn delete_plan(data: &mut AppData, plan_id: PlanId) -> Result<Plan, PlanError> {
    data.plans.remove(&plan_id).ok_or(PlanError::PlanNotFound(plan_id))
}

/// Replaces a plan's schedule. Entries without a description are skipped;
/// the whole batch is checked before anything changes.
pub fn replace_tasks(
    data: &mut AppData,
    plan_id: PlanId,
    entries: &[DailyPlanInput],
) -> Result<usize, PlanError> {
    if !data.plans.contains_key(&plan_id) {
        return Err(PlanError::PlanNotFound(plan_id));
    }

    let mut next_id = next_task_id(data);
    let mut tasks = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let title = entry.description.trim();
        if title.is_empty() {
            continue;
        }
        let date = NaiveDate::parse_from_str(entry.date.trim(), "%Y-%m-%d")
            .map_err(|_| PlanError::InvalidDate(entry.date.clone()))?;
        let status = match entry.status.as_deref() {
            Some(raw) => raw.parse::<Status>()?,
            None => Status::Planned,
        };
        tasks.push(Task {
            task_id: next_id,
            date: date_key(date),
            title: title.to_string(),
            order: entry.order.unwrap_or(index as u32 + 1),
            status,
        });
        next_id += 1;
    }
    tasks.sort_by(|a, b| a.date.cmp(&b.date).then(a.order.cmp(&b.order)));

    let count = tasks.len();
    if let Some(plan) = data.plans.get_mut(&plan_id) {
        plan.tasks = tasks;
    }
    Ok(count)
}

pub fn complete_task(
    data: &mut AppData,
    task_id: TaskId,
    completed: bool,
) -> Result<Status, PlanError> {
    let task = data
        .plans
        .values_mut()
        .flat_map(|plan| plan.tasks.iter_mut())
        .find(|task| task.task_id == task_id)
        .ok_or(PlanError::TaskNotFound(task_id))?;
    task.status = if completed { Status::Done } else { Status::Planned };
    Ok(task.status)
}

/// Totals over every plan, or just `plan` when it exists. An unknown plan
/// falls back to every plan.
pub fn plan_stats(data: &AppData, plan: Option<PlanId>) -> PlanStats {
    let selected: Vec<&Plan> = match plan.and_then(|id| data.plans.get(&id)) {
        Some(plan) => vec![plan],
        None => data.plans.values().collect(),
    };

    let total_assigned: usize = selected.iter().map(|plan| plan.tasks.len()).sum();
    let completed = selected
        .iter()
        .flat_map(|plan| plan.tasks.iter())
        .filter(|task| task.status == Status::Done)
        .count();
    let completion_rate = if total_assigned == 0 {
        0
    } else {
        completed * 100 / total_assigned
    };

    PlanStats {
        total_plans: selected.len() as u32,
        total_assigned: total_assigned as u32,
        completed: completed as u32,
        completion_rate: completion_rate as u32,
    }
}

fn next_task_id(data: &AppData) -> TaskId {
    data.plans
        .values()
        .flat_map(|plan| plan.tasks.iter())
        .map(|task| task.task_id)
        .max()
        .map_or(1, |last| last + 1)
}
