use crate::errors::AppError;
use crate::models::{
    date_key, DailyPlanView, DailyPlansResponse, DailyPlansSaved, DayDetail, DayId, DayTask,
    CreatePlanRequest, MonthQuery, MonthSummary, PlanCreated, PlanFilter, PlanId, PlanView,
    PlansResponse, SaveDailyPlansRequest, StatusUpdatePayload, TaskCompleteRequest,
    UpdatePlanRequest, UpdateResponse,
};
use crate::plans;
use crate::state::AppState;
use crate::stats::build_summary;
use crate::status::{Status, UnknownStatus};
use crate::ui::render_month;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::Html,
    Json,
};
use chrono::{Datelike, Local, NaiveDate};
use tracing::{info, warn};

pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<PlanFilter>,
) -> Result<Html<String>, AppError> {
    let today = today();
    month_page(&state, today.year(), today.month(), filter.plan_id).await
}

pub async fn calendar_month(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
    Query(filter): Query<PlanFilter>,
) -> Result<Html<String>, AppError> {
    month_page(&state, year, month, filter.plan_id).await
}

pub async fn update_status(
    State(state): State<AppState>,
    payload: Result<Json<StatusUpdatePayload>, JsonRejection>,
) -> Result<Json<UpdateResponse>, AppError> {
    let payload = read_json(payload)?;

    let status: Status = payload
        .status
        .parse()
        .map_err(|err: UnknownStatus| AppError::bad_request(err.to_string()))?;
    let day_id = DayId(payload.day_id);
    let date = day_id
        .to_date()
        .ok_or_else(|| AppError::bad_request(format!("invalid day id {day_id}")))?;

    apply_status(&state, date, status).await?;
    info!(%day_id, %status, "day status stored");
    Ok(Json(UpdateResponse::ok()))
}

pub async fn day_detail(
    State(state): State<AppState>,
    Path(day_id): Path<i64>,
    Query(filter): Query<PlanFilter>,
) -> Result<Json<DayDetail>, AppError> {
    let day_id = DayId(day_id);
    let date = day_id
        .to_date()
        .ok_or_else(|| AppError::not_found("day not found"))?;
    let data = state.data.lock().await;

    let tasks = data
        .tasks_on(date)
        .filter(|(plan, _)| filter.plan_id.is_none_or(|id| plan.plan_id == id))
        .map(|(plan, task)| DayTask {
            task_id: task.task_id,
            plan_id: plan.plan_id,
            plan_title: plan.title.clone(),
            subject: plan.subject.clone(),
            task_title: task.title.clone(),
            status: task.status,
        })
        .collect();

    Ok(Json(DayDetail {
        ok: true,
        day_id,
        date: date_key(date),
        status: data.status_on(date, filter.plan_id),
        tasks,
    }))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthSummary>, AppError> {
    let today = today();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or_else(|| today.month());
    let data = state.data.lock().await;

    build_summary(year, month, query.plan_id, &data)
        .map(Json)
        .ok_or_else(|| AppError::bad_request(format!("invalid month {year}-{month}")))
}

pub async fn list_plans(State(state): State<AppState>) -> Json<PlansResponse> {
    let data = state.data.lock().await;
    Json(PlansResponse {
        ok: true,
        plans: data.plans.values().map(PlanView::from).collect(),
    })
}

pub async fn create_plan(
    State(state): State<AppState>,
    payload: Result<Json<CreatePlanRequest>, JsonRejection>,
) -> Result<Json<PlanCreated>, AppError> {
    let request = read_json(payload)?;
    let created_at = Local::now().to_rfc3339();

    let plan_id = state
        .update(|data| Ok(plans::create_plan(data, &request.title, &request.subject, created_at)?))
        .await?;
    info!(plan_id, title = %request.title, "plan created");
    Ok(Json(PlanCreated { ok: true, plan_id }))
}

pub async fn update_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<PlanId>,
    payload: Result<Json<UpdatePlanRequest>, JsonRejection>,
) -> Result<Json<UpdateResponse>, AppError> {
    let request = read_json(payload)?;
    state
        .update(|data| {
            Ok(plans::update_plan(
                data,
                plan_id,
                request.title.as_deref(),
                request.subject.as_deref(),
            )?)
        })
        .await?;
    info!(plan_id, "plan updated");
    Ok(Json(UpdateResponse::ok()))
}

pub async fn delete_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<PlanId>,
) -> Result<Json<UpdateResponse>, AppError> {
    let removed = state
        .update(|data| Ok(plans::delete_plan(data, plan_id)?))
        .await?;
    info!(plan_id, tasks = removed.tasks.len(), "plan deleted");
    Ok(Json(UpdateResponse::ok()))
}

pub async fn save_daily_plans(
    State(state): State<AppState>,
    Path(plan_id): Path<PlanId>,
    payload: Result<Json<SaveDailyPlansRequest>, JsonRejection>,
) -> Result<Json<DailyPlansSaved>, AppError> {
    let request = read_json(payload)?;
    let count = state
        .update(|data| Ok(plans::replace_tasks(data, plan_id, &request.daily_plans)?))
        .await?;
    info!(plan_id, count, "daily plans saved");
    Ok(Json(DailyPlansSaved {
        ok: true,
        plan_id,
        count,
    }))
}

pub async fn get_daily_plans(
    State(state): State<AppState>,
    Path(plan_id): Path<PlanId>,
) -> Result<Json<DailyPlansResponse>, AppError> {
    let data = state.data.lock().await;
    let plan = data
        .plans
        .get(&plan_id)
        .ok_or_else(|| AppError::from(plans::PlanError::PlanNotFound(plan_id)))?;
    Ok(Json(DailyPlansResponse {
        ok: true,
        plan_id,
        daily_plans: plan.tasks.iter().map(DailyPlanView::from).collect(),
    }))
}

pub async fn complete_task(
    State(state): State<AppState>,
    payload: Result<Json<TaskCompleteRequest>, JsonRejection>,
) -> Result<Json<UpdateResponse>, AppError> {
    let request = read_json(payload)?;
    let status = state
        .update(|data| Ok(plans::complete_task(data, request.task_id, request.completed)?))
        .await?;
    info!(task_id = request.task_id, %status, "task status stored");
    Ok(Json(UpdateResponse::ok()))
}

async fn month_page(
    state: &AppState,
    year: i32,
    month: u32,
    plan: Option<PlanId>,
) -> Result<Html<String>, AppError> {
    let data = state.data.lock().await;
    render_month(year, month, today(), plan, &data)
        .map(Html)
        .ok_or_else(|| AppError::bad_request(format!("invalid month {year}-{month}")))
}

async fn apply_status(state: &AppState, date: NaiveDate, status: Status) -> Result<(), AppError> {
    let updated_at = Local::now().to_rfc3339();
    state
        .update(|data| {
            data.set_day_status(date, status, updated_at);
            Ok(())
        })
        .await
}

fn read_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    let Json(value) = payload.map_err(|rejection| {
        warn!("malformed request body: {}", rejection.body_text());
        AppError::bad_request("malformed request")
    })?;
    Ok(value)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
