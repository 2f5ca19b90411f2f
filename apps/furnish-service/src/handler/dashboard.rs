//! ダッシュボードハンドラ（一覧・詳細）

use std::{str::FromStr, sync::Arc};

use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use noticeflow_domain::furnish::FurnishStatus;
use noticeflow_shared::ApiResponse;
use serde::Deserialize;

use crate::{
    error::CoreError,
    usecase::{FurnishDashboardService, dashboard::ListFurnishApplicationsFilter},
};

/// ダッシュボードハンドラの共有状態
pub struct DashboardState {
    pub dashboard: FurnishDashboardService,
}

/// 一覧取得のクエリパラメータ
#[derive(Deserialize)]
pub struct ListQuery {
    /// カンマ区切りのステータスコード（例: `P,R`）
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notice_no: Option<String>,
    #[serde(default)]
    pub vehicle_no: Option<String>,
    #[serde(default)]
    pub furnish_id_no: Option<String>,
    #[serde(default)]
    pub submitted_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub submitted_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

/// 申告申請を一覧取得する
///
/// ## エンドポイント
/// GET /internal/furnish/applications
pub async fn list_furnish_applications(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<ListQuery>,
) -> Result<Response, CoreError> {
    // カンマ区切りのステータスコードをパース（不正なコードは 400）
    let statuses = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.split(',')
                .map(|code| FurnishStatus::from_str(code.trim()))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()
        .map_err(|e| CoreError::BadRequest(e.to_string()))?;

    let filter = ListFurnishApplicationsFilter {
        statuses,
        notice_no: query.notice_no,
        vehicle_no: query.vehicle_no,
        furnish_id_no: query.furnish_id_no,
        submitted_from: query.submitted_from,
        submitted_to: query.submitted_to,
        sort_by: query.sort_by,
        page: query.page.unwrap_or(1),
        page_size: query.page_size.unwrap_or(20),
    };

    let page = state.dashboard.list_furnish_applications(filter).await?;

    Ok(Json(page).into_response())
}

/// 申告申請の詳細を取得する
///
/// ## エンドポイント
/// GET /internal/furnish/applications/{txn_no}
///
/// ## エラー
/// - 404 NOT_FOUND: 申請が存在しない場合
/// - 500 TECHNICAL_ERROR: インフラ障害
pub async fn get_application_detail(
    State(state): State<Arc<DashboardState>>,
    Path(txn_no): Path<String>,
) -> Result<Response, CoreError> {
    let detail = state.dashboard.get_application_detail(&txn_no).await?;

    Ok(Json(ApiResponse::new(detail)).into_response())
}
