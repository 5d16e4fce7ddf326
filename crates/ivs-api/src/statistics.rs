//! Progress statistics across answers, mock interviews and collections.

use std::collections::{BTreeSet, HashMap};

use axum::{Router, extract::State, routing::get};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use ivs_db::{models::DailyScores, repositories::statistics as stats_repo};
use ivs_scoring::stats;

use crate::{
    ApiState, auth::AuthUser, error::ApiError, extract::AppQuery, response::ApiResponse,
};

pub const DEFAULT_WINDOW_DAYS: i64 = 30;
pub const MAX_WINDOW_DAYS: i64 = 365;

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/statistics/overview", get(overview))
        .route("/statistics/category", get(category_stats))
        .route("/statistics/progress", get(progress))
        .route("/statistics/activity", get(activity))
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct WindowQuery {
    pub days: Option<i64>,
}

impl WindowQuery {
    pub fn resolve(&self) -> Result<u32, ApiError> {
        let days = self.days.unwrap_or(DEFAULT_WINDOW_DAYS);
        if !(1..=MAX_WINDOW_DAYS).contains(&days) {
            return Err(ApiError::Validation(format!(
                "days must be between 1 and {MAX_WINDOW_DAYS}"
            )));
        }
        u32::try_from(days).map_err(|_| ApiError::Validation("Invalid days".to_string()))
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_answered: i64,
    pub scored_answers: i64,
    pub average_score: Option<f64>,
    /// Seconds
    pub total_time_spent: i64,
    pub mock_interviews_completed: i64,
    pub favorites_count: i64,
    pub mistakes_count: i64,
    pub practice_sets_count: i64,
    pub current_streak: u32,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStatistics {
    pub category: String,
    pub total_answered: i64,
    pub average_score: Option<f64>,
    /// Share of scored answers with a passing score, 0.0 to 1.0
    pub correct_rate: f64,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
    pub date: NaiveDate,
    pub answers_count: i64,
    pub average_score: Option<f64>,
    pub cumulative_answered: i64,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDay {
    pub date: NaiveDate,
    pub answers_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub days: Vec<ActivityDay>,
    pub active_days: usize,
    pub current_streak: u32,
    pub longest_streak: u32,
}

fn start_of(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// One point per day of `window`, days without answers included.
fn progress_points(
    window: &[NaiveDate],
    daily: Vec<DailyScores>,
    before: i64,
) -> Vec<ProgressPoint> {
    let mut by_day: HashMap<NaiveDate, DailyScores> =
        daily.into_iter().map(|d| (d.day, d)).collect();
    let mut cumulative = before;

    window
        .iter()
        .map(|&date| {
            let (answers_count, average_score) = by_day
                .remove(&date)
                .map(|d| (d.answers_count, stats::mean(&d.scores).map(stats::round1)))
                .unwrap_or((0, None));
            cumulative += answers_count;
            ProgressPoint {
                date,
                answers_count,
                average_score,
                cumulative_answered: cumulative,
            }
        })
        .collect()
}

fn activity_days(window: &[NaiveDate], daily: &[DailyScores]) -> Vec<ActivityDay> {
    let counts: HashMap<NaiveDate, i64> = daily.iter().map(|d| (d.day, d.answers_count)).collect();
    window
        .iter()
        .map(|&date| ActivityDay {
            date,
            answers_count: counts.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

#[utoipa::path(
    get,
    path = "/api/v1/statistics/overview",
    tag = "statistics",
    security(("bearer" = [])),
    responses((status = 200, description = "Totals and current streak", body = Overview))
)]
pub async fn overview(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<ApiResponse<Overview>, ApiError> {
    let totals = stats_repo::user_totals(&state.pool, auth_user.user_id).await?;
    let active: BTreeSet<NaiveDate> = stats_repo::active_days(&state.pool, auth_user.user_id)
        .await?
        .into_iter()
        .collect();
    let now = Utc::now();

    Ok(ApiResponse::ok(Overview {
        total_answered: totals.total_answered,
        scored_answers: totals.scored_answers,
        average_score: totals.average_score.map(stats::round1),
        total_time_spent: totals.total_time_spent,
        mock_interviews_completed: totals.mock_interviews_completed,
        favorites_count: totals.favorites_count,
        mistakes_count: totals.mistakes_count,
        practice_sets_count: totals.practice_sets_count,
        current_streak: stats::current_streak(&active, now.date_naive()),
        last_updated: now,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/statistics/category",
    tag = "statistics",
    security(("bearer" = [])),
    responses((status = 200, description = "Per-category answer counts and scores", body = [CategoryStatistics]))
)]
pub async fn category_stats(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<ApiResponse<Vec<CategoryStatistics>>, ApiError> {
    let categories = stats_repo::category_scores(&state.pool, auth_user.user_id).await?;

    let rows = categories
        .into_iter()
        .map(|c| CategoryStatistics {
            average_score: stats::mean(&c.scores).map(stats::round1),
            correct_rate: stats::round2(stats::correct_rate(&c.scores)),
            total_answered: c.total_answered,
            category: c.category,
        })
        .collect();

    Ok(ApiResponse::ok(rows))
}

#[utoipa::path(
    get,
    path = "/api/v1/statistics/progress",
    tag = "statistics",
    security(("bearer" = [])),
    params(("days" = Option<i64>, Query, description = "Window length, 1 to 365, default 30")),
    responses(
        (status = 200, description = "One point per day, oldest first", body = [ProgressPoint]),
        (status = 400, description = "Invalid window"),
    )
)]
pub async fn progress(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppQuery(query): AppQuery<WindowQuery>,
) -> Result<ApiResponse<Vec<ProgressPoint>>, ApiError> {
    let days = query.resolve()?;
    let window = stats::date_window(Utc::now().date_naive(), days);
    let Some(&first) = window.first() else {
        return Ok(ApiResponse::ok(Vec::new()));
    };
    let since = start_of(first);

    let before = stats_repo::count_answers_before(&state.pool, auth_user.user_id, since).await?;
    let daily = stats_repo::daily_scores(&state.pool, auth_user.user_id, since).await?;

    Ok(ApiResponse::ok(progress_points(&window, daily, before)))
}

#[utoipa::path(
    get,
    path = "/api/v1/statistics/activity",
    tag = "statistics",
    security(("bearer" = [])),
    params(("days" = Option<i64>, Query, description = "Window length, 1 to 365, default 30")),
    responses(
        (status = 200, description = "Daily answer counts and streaks", body = Activity),
        (status = 400, description = "Invalid window"),
    )
)]
pub async fn activity(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppQuery(query): AppQuery<WindowQuery>,
) -> Result<ApiResponse<Activity>, ApiError> {
    let days = query.resolve()?;
    let today = Utc::now().date_naive();
    let window = stats::date_window(today, days);
    let since = window.first().map_or_else(|| start_of(today), |&d| start_of(d));

    let daily = stats_repo::daily_scores(&state.pool, auth_user.user_id, since).await?;
    let active: BTreeSet<NaiveDate> = stats_repo::active_days(&state.pool, auth_user.user_id)
        .await?
        .into_iter()
        .collect();

    let days = activity_days(&window, &daily);
    Ok(ApiResponse::ok(Activity {
        active_days: days.iter().filter(|d| d.answers_count > 0).count(),
        days,
        current_streak: stats::current_streak(&active, today),
        longest_streak: stats::longest_streak(&active),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).expect("valid date")
    }

    fn daily(d: u32, answers_count: i64, scores: Vec<i32>) -> DailyScores {
        DailyScores {
            day: date(d),
            answers_count,
            scores,
        }
    }

    #[test]
    fn test_window_query_bounds() {
        assert_eq!(WindowQuery::default().resolve().expect("default"), 30);
        assert_eq!(WindowQuery { days: Some(365) }.resolve().expect("max"), 365);
        assert!(WindowQuery { days: Some(0) }.resolve().is_err());
        assert!(WindowQuery { days: Some(366) }.resolve().is_err());
        assert!(WindowQuery { days: Some(-3) }.resolve().is_err());
    }

    #[test]
    fn test_progress_fills_gaps_and_accumulates() {
        let window = vec![date(1), date(2), date(3)];
        let points = progress_points(
            &window,
            vec![daily(1, 2, vec![70, 81]), daily(3, 1, vec![])],
            5,
        );

        assert_eq!(
            points,
            vec![
                ProgressPoint {
                    date: date(1),
                    answers_count: 2,
                    average_score: Some(75.5),
                    cumulative_answered: 7,
                },
                ProgressPoint {
                    date: date(2),
                    answers_count: 0,
                    average_score: None,
                    cumulative_answered: 7,
                },
                ProgressPoint {
                    date: date(3),
                    answers_count: 1,
                    average_score: None,
                    cumulative_answered: 8,
                },
            ]
        );
    }

    #[test]
    fn test_activity_days() {
        let window = vec![date(4), date(5)];
        let days = activity_days(&window, &[daily(5, 3, vec![90])]);
        assert_eq!(
            days,
            vec![
                ActivityDay {
                    date: date(4),
                    answers_count: 0
                },
                ActivityDay {
                    date: date(5),
                    answers_count: 3
                },
            ]
        );
    }
}
