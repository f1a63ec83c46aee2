//! xplocal-server/src/routes.rs
//!
//! The HTTP surface of the Loyalty Ledger. Handlers are thin: decode the
//! request, call through to the services with explicit caller identity,
//! map typed failures to status codes. Business-rule rejections keep their
//! precise messages all the way to the client.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use xplocal_common::error::{Error, PurchaseError, RedeemError, TaskError};
use xplocal_common::models::{TaskKind, User};
use xplocal_core::services::venue_service::{RewardSpec, TaskSpec};

use crate::context::ServerContext;

pub fn router(ctx: ServerContext) -> Router {
    Router::new()
        .route("/users", post(create_user))
        .route("/venues", post(create_venue))
        .route("/venues/{venue_id}", get(get_venue).patch(rename_venue))
        .route("/venues/{venue_id}/tasks", get(list_tasks))
        .route("/tasks/{task_id}", patch(update_task).delete(delete_task))
        .route(
            "/venues/{venue_id}/rewards",
            get(list_rewards).post(create_reward),
        )
        .route("/rewards/{reward_id}", put(update_reward).delete(delete_reward))
        .route("/venues/{venue_id}/claims/scan", post(claim_scan))
        .route(
            "/venues/{venue_id}/tasks/{task_type}/complete",
            post(complete_task),
        )
        .route("/venues/{venue_id}/purchases", post(purchase_reward))
        .route("/redemptions/verify", post(verify_code))
        .route("/venues/{venue_id}/balance", get(get_balance))
        .route("/venues/{venue_id}/redemptions", get(list_redemptions))
        .route("/venues/{venue_id}/completions", get(list_completions))
        .route("/owners/{owner_id}/feed", get(owner_feed))
        .route("/owners/{owner_id}/stats", get(owner_stats))
        .with_state(ctx)
}

// ----- error mapping -------------------------------------------------------

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        tracing::error!("internal error: {}", e);
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
    }
}

impl From<TaskError> for ApiError {
    fn from(e: TaskError) -> Self {
        match e {
            TaskError::VenueNotFound | TaskError::TaskNotFound => {
                ApiError::new(StatusCode::NOT_FOUND, e.to_string())
            }
            TaskError::TaskInactive | TaskError::RecurringLocked => {
                ApiError::new(StatusCode::CONFLICT, e.to_string())
            }
            TaskError::NotOneTime => ApiError::new(StatusCode::BAD_REQUEST, e.to_string()),
            TaskError::Internal(err) => err.into(),
        }
    }
}

impl From<PurchaseError> for ApiError {
    fn from(e: PurchaseError) -> Self {
        match e {
            PurchaseError::RewardNotFound => ApiError::new(StatusCode::NOT_FOUND, e.to_string()),
            PurchaseError::InsufficientBalance => {
                ApiError::new(StatusCode::CONFLICT, e.to_string())
            }
            PurchaseError::Internal(err) => err.into(),
        }
    }
}

impl From<RedeemError> for ApiError {
    fn from(e: RedeemError) -> Self {
        match e {
            // Cross-venue codes must not be discoverable: same body as a
            // miss.
            RedeemError::NotFound | RedeemError::NotOwnedByStaffVenue => {
                ApiError::new(StatusCode::NOT_FOUND, RedeemError::NotFound.to_string())
            }
            RedeemError::AlreadyUsed => ApiError::new(StatusCode::CONFLICT, e.to_string()),
            RedeemError::Expired => ApiError::new(StatusCode::GONE, e.to_string()),
            RedeemError::Internal(err) => err.into(),
        }
    }
}

// ----- request/response bodies ---------------------------------------------

#[derive(Deserialize)]
struct CreateUserBody {
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct TaskSpecBody {
    kind: TaskKind,
    target_url: Option<String>,
}

#[derive(Deserialize)]
struct RewardSpecBody {
    label: String,
    cost: i64,
}

#[derive(Deserialize)]
struct CreateVenueBody {
    owner_id: Uuid,
    name: String,
    #[serde(default)]
    tasks: Vec<TaskSpecBody>,
    #[serde(default)]
    rewards: Vec<RewardSpecBody>,
}

#[derive(Deserialize)]
struct RenameVenueBody {
    name: String,
}

#[derive(Deserialize)]
struct UpdateTaskBody {
    is_active: Option<bool>,
    /// `Some(None)` clears the URL, absent leaves it untouched.
    #[serde(default, with = "double_option")]
    target_url: Option<Option<String>>,
}

#[derive(Deserialize)]
struct CreateRewardBody {
    label: String,
    cost: i64,
}

#[derive(Deserialize)]
struct UpdateRewardBody {
    label: String,
    cost: i64,
    is_active: bool,
}

#[derive(Deserialize)]
struct CallerBody {
    user_id: Uuid,
}

#[derive(Deserialize)]
struct PurchaseBody {
    user_id: Uuid,
    reward_id: Uuid,
}

#[derive(Deserialize)]
struct VerifyBody {
    owner_id: Uuid,
    code: String,
}

#[derive(Deserialize)]
struct UserQuery {
    user_id: Uuid,
}

#[derive(Deserialize)]
struct FeedQuery {
    #[serde(default = "default_feed_limit")]
    limit: i64,
}

fn default_feed_limit() -> i64 {
    50
}

#[derive(Serialize)]
struct BalanceResponse {
    user_id: Uuid,
    venue_id: Uuid,
    xp_amount: i64,
}

/// Distinguishes "field absent" from "field explicitly null".
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Deserialize::deserialize(de).map(Some)
    }
}

// ----- account + venue management ------------------------------------------

async fn create_user(
    State(ctx): State<ServerContext>,
    Json(body): Json<CreateUserBody>,
) -> Result<impl IntoResponse, ApiError> {
    use xplocal_common::traits::repository_traits::UserRepository;

    let user = User::new(body.display_name.as_deref());
    ctx.user_repo.create(&user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn create_venue(
    State(ctx): State<ServerContext>,
    Json(body): Json<CreateVenueBody>,
) -> Result<impl IntoResponse, ApiError> {
    let tasks: Vec<TaskSpec> = body
        .tasks
        .iter()
        .map(|t| TaskSpec {
            kind: t.kind,
            target_url: t.target_url.clone(),
        })
        .collect();
    let rewards: Vec<RewardSpec> = body
        .rewards
        .iter()
        .map(|r| RewardSpec {
            label: r.label.clone(),
            cost: r.cost,
        })
        .collect();

    let venue = ctx
        .venues
        .create_venue(body.owner_id, &body.name, &tasks, &rewards)
        .await?;
    Ok((StatusCode::CREATED, Json(venue)))
}

async fn get_venue(
    State(ctx): State<ServerContext>,
    Path(venue_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let venue = ctx
        .venues
        .get_venue(venue_id)
        .await?
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Venue does not exist."))?;
    Ok(Json(venue))
}

async fn rename_venue(
    State(ctx): State<ServerContext>,
    Path(venue_id): Path<Uuid>,
    Json(body): Json<RenameVenueBody>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.venues.rename_venue(venue_id, &body.name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_tasks(
    State(ctx): State<ServerContext>,
    Path(venue_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(ctx.venues.tasks_for_venue(venue_id).await?))
}

async fn update_task(
    State(ctx): State<ServerContext>,
    Path(task_id): Path<Uuid>,
    Json(body): Json<UpdateTaskBody>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(is_active) = body.is_active {
        ctx.venues.set_task_active(task_id, is_active).await?;
    }
    if let Some(url) = body.target_url {
        ctx.venues
            .set_task_target_url(task_id, url.as_deref())
            .await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_task(
    State(ctx): State<ServerContext>,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.venues.delete_task(task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_reward(
    State(ctx): State<ServerContext>,
    Path(venue_id): Path<Uuid>,
    Json(body): Json<CreateRewardBody>,
) -> Result<impl IntoResponse, ApiError> {
    let reward = ctx
        .venues
        .create_reward(venue_id, &body.label, body.cost)
        .await?;
    Ok((StatusCode::CREATED, Json(reward)))
}

async fn update_reward(
    State(ctx): State<ServerContext>,
    Path(reward_id): Path<Uuid>,
    Json(body): Json<UpdateRewardBody>,
) -> Result<impl IntoResponse, ApiError> {
    // Full replace of the editable fields.
    let existing = ctx
        .venues
        .get_reward(reward_id)
        .await?
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Reward does not exist."))?;
    let updated = xplocal_common::models::Reward {
        label: body.label,
        cost: body.cost,
        is_active: body.is_active,
        ..existing
    };
    ctx.venues.update_reward(&updated).await?;
    Ok(Json(updated))
}

async fn delete_reward(
    State(ctx): State<ServerContext>,
    Path(reward_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.venues.delete_reward(reward_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ----- ledger operations ----------------------------------------------------

async fn claim_scan(
    State(ctx): State<ServerContext>,
    Path(venue_id): Path<Uuid>,
    Json(body): Json<CallerBody>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = ctx.ledger.claim_recurring_xp(body.user_id, venue_id).await?;
    Ok(Json(outcome))
}

async fn complete_task(
    State(ctx): State<ServerContext>,
    Path((venue_id, task_type)): Path<(Uuid, String)>,
    Json(body): Json<CallerBody>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = TaskKind::from_str(&task_type)
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Unknown task type."))?;
    let outcome = ctx.ledger.complete_task(body.user_id, venue_id, kind).await?;
    Ok(Json(outcome))
}

async fn purchase_reward(
    State(ctx): State<ServerContext>,
    Path(venue_id): Path<Uuid>,
    Json(body): Json<PurchaseBody>,
) -> Result<impl IntoResponse, ApiError> {
    let redemption = ctx
        .ledger
        .purchase_reward(body.user_id, venue_id, body.reward_id)
        .await?;
    Ok((StatusCode::CREATED, Json(redemption)))
}

async fn verify_code(
    State(ctx): State<ServerContext>,
    Json(body): Json<VerifyBody>,
) -> Result<impl IntoResponse, ApiError> {
    let redemption = ctx
        .ledger
        .verify_and_redeem(body.owner_id, &body.code)
        .await?;
    Ok(Json(redemption))
}

// ----- query surface ---------------------------------------------------------

async fn get_balance(
    State(ctx): State<ServerContext>,
    Path(venue_id): Path<Uuid>,
    Query(q): Query<UserQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let xp_amount = ctx.ledger.balance(q.user_id, venue_id).await?;
    Ok(Json(BalanceResponse {
        user_id: q.user_id,
        venue_id,
        xp_amount,
    }))
}

async fn list_rewards(
    State(ctx): State<ServerContext>,
    Path(venue_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(ctx.ledger.active_rewards(venue_id).await?))
}

async fn list_redemptions(
    State(ctx): State<ServerContext>,
    Path(venue_id): Path<Uuid>,
    Query(q): Query<UserQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        ctx.ledger.redemptions_for_user(q.user_id, venue_id).await?,
    ))
}

async fn list_completions(
    State(ctx): State<ServerContext>,
    Path(venue_id): Path<Uuid>,
    Query(q): Query<UserQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        ctx.ledger.completions_for_user(q.user_id, venue_id).await?,
    ))
}

async fn owner_feed(
    State(ctx): State<ServerContext>,
    Path(owner_id): Path<Uuid>,
    Query(q): Query<FeedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(ctx.ledger.owner_feed(owner_id, q.limit).await?))
}

async fn owner_stats(
    State(ctx): State<ServerContext>,
    Path(owner_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(ctx.ledger.owner_stats(owner_id).await?))
}
