//! 申告ハンドラ（受付・却下・承認）
//!
//! タグ付き Result を `success` + `error_type` 判別子付きの
//! JSON レスポンスにシリアライズする。

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDate, Utc};
use noticeflow_domain::furnish::{FurnishApplication, RejectionReasonCode};
use serde::{Deserialize, Serialize};

use crate::usecase::{
    ApprovalInput,
    ApprovalResult,
    FurnishApprovalService,
    FurnishRejectionService,
    FurnishSubmissionService,
    RejectionInput,
    RejectionResult,
    SubmissionInput,
    SubmissionResult,
    furnish::{DocumentRefInput, MailingAddressInput},
};

/// 申告系ハンドラの共有状態
pub struct FurnishState {
    pub submission: FurnishSubmissionService,
    pub rejection:  FurnishRejectionService,
    pub approval:   FurnishApprovalService,
}

// =========================================================================
// リクエスト DTO
// =========================================================================

#[derive(Deserialize)]
pub struct MailingAddressDto {
    pub block_no:      String,
    pub street_name:   String,
    #[serde(default)]
    pub floor_no:      Option<String>,
    #[serde(default)]
    pub unit_no:       Option<String>,
    #[serde(default)]
    pub building_name: Option<String>,
    pub postal_code:   String,
}

#[derive(Deserialize)]
pub struct DocumentRefDto {
    pub reference: String,
    pub file_name: String,
}

#[derive(Deserialize)]
pub struct SubmitFurnishRequest {
    pub notice_no: String,
    pub vehicle_no: String,
    pub furnish_name: String,
    pub furnish_id_type: String,
    pub furnish_id_no: String,
    pub owner_driver_indicator: String,
    #[serde(default)]
    pub hirer_owner_relationship: Option<String>,
    pub mailing_address: MailingAddressDto,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub question_1: String,
    pub question_2: String,
    pub question_3: String,
    #[serde(default)]
    pub rental_start: Option<NaiveDate>,
    #[serde(default)]
    pub rental_end: Option<NaiveDate>,
    #[serde(default)]
    pub document_refs: Vec<DocumentRefDto>,
}

#[derive(Deserialize)]
pub struct RejectFurnishRequest {
    pub officer_id: String,
    pub reason_code: RejectionReasonCode,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub send_email_to_owner: bool,
    #[serde(default)]
    pub email_template_id: Option<String>,
}

#[derive(Deserialize)]
pub struct ApproveFurnishRequest {
    pub officer_id: String,
    #[serde(default)]
    pub remarks:    Option<String>,
}

// =========================================================================
// レスポンス DTO
// =========================================================================

/// 申告申請のレスポンス表現
#[derive(Debug, Serialize)]
pub struct FurnishApplicationDto {
    pub txn_no: String,
    pub notice_no: String,
    pub vehicle_no: String,
    pub owner_driver_indicator: String,
    pub status: String,
    pub submitted_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub remarks: String,
}

impl FurnishApplicationDto {
    fn from_application(application: &FurnishApplication) -> Self {
        Self {
            txn_no: application.txn_no().to_string(),
            notice_no: application.notice_no().to_string(),
            vehicle_no: application.vehicle_no().to_string(),
            owner_driver_indicator: application.owner_driver_indicator().as_code().to_string(),
            status: application.status().as_code().to_string(),
            submitted_at: application.submitted_at(),
            decided_at: application.decided_at(),
            remarks: application.remarks().to_string(),
        }
    }
}

/// 申告受付レスポンス
///
/// `success` + `error_type` がクライアントの分岐点。
/// 不要なフィールドはバリアントごとに省略される。
#[derive(Debug, Serialize)]
pub struct SubmitFurnishResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<FurnishApplicationDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_approved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hirer_driver_record_created: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspension_applied: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_manual_review: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, String>>,
}

impl SubmitFurnishResponse {
    fn base(success: bool, message: String) -> Self {
        Self {
            success,
            error_type: None,
            message,
            application: None,
            auto_approved: None,
            hirer_driver_record_created: None,
            suspension_applied: None,
            check_type: None,
            requires_manual_review: None,
            field: None,
            violations: None,
            operation: None,
            cause: None,
            details: None,
        }
    }
}

/// 却下・承認レスポンス（共通形状）
#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<FurnishApplicationDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_sent_to_owner: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice_resent_to_portal: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hirer_driver_record_created: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspension_revived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, String>>,
}

impl DecisionResponse {
    fn base(success: bool, message: String) -> Self {
        Self {
            success,
            error_type: None,
            message,
            application: None,
            email_sent_to_owner: None,
            notice_resent_to_portal: None,
            hirer_driver_record_created: None,
            suspension_revived: None,
            reason: None,
            field: None,
            operation: None,
            cause: None,
            details: None,
        }
    }
}

// =========================================================================
// ハンドラ
// =========================================================================

/// 申告を受け付ける
///
/// ## エンドポイント
/// POST /internal/furnish/submissions
///
/// ## ステータスマッピング
/// - Success / BusinessError（手動審査行き）→ 200（受付自体は成功している）
/// - ValidationError → 400
/// - TechnicalError → 500
pub async fn submit_furnish(
    State(state): State<Arc<FurnishState>>,
    Json(req): Json<SubmitFurnishRequest>,
) -> Response {
    let input = SubmissionInput {
        notice_no: req.notice_no,
        vehicle_no: req.vehicle_no,
        furnish_name: req.furnish_name,
        furnish_id_type: req.furnish_id_type,
        furnish_id_no: req.furnish_id_no,
        owner_driver_indicator: req.owner_driver_indicator,
        hirer_owner_relationship: req.hirer_owner_relationship,
        mailing_address: MailingAddressInput {
            block_no:      req.mailing_address.block_no,
            street_name:   req.mailing_address.street_name,
            floor_no:      req.mailing_address.floor_no,
            unit_no:       req.mailing_address.unit_no,
            building_name: req.mailing_address.building_name,
            postal_code:   req.mailing_address.postal_code,
        },
        email: req.email,
        phone: req.phone,
        question_1: req.question_1,
        question_2: req.question_2,
        question_3: req.question_3,
        rental_start: req.rental_start,
        rental_end: req.rental_end,
        document_refs: req
            .document_refs
            .into_iter()
            .map(|d| DocumentRefInput {
                reference: d.reference,
                file_name: d.file_name,
            })
            .collect(),
    };

    let result = state.submission.submit_furnish(input).await;

    let (status, body) = match result {
        SubmissionResult::Success {
            application,
            auto_approved,
            hirer_driver_record_created,
            suspension_applied,
            message,
        } => {
            let mut body = SubmitFurnishResponse::base(true, message);
            body.application = Some(FurnishApplicationDto::from_application(&application));
            body.auto_approved = Some(auto_approved);
            body.hirer_driver_record_created = Some(hirer_driver_record_created);
            body.suspension_applied = Some(suspension_applied);
            (StatusCode::OK, body)
        }
        SubmissionResult::BusinessError {
            check_type,
            message,
            requires_manual_review,
            application,
        } => {
            let mut body = SubmitFurnishResponse::base(false, message);
            body.error_type = Some("BUSINESS_ERROR".to_string());
            body.check_type = Some(check_type);
            body.requires_manual_review = Some(requires_manual_review);
            body.application = application
                .as_ref()
                .map(FurnishApplicationDto::from_application);
            (StatusCode::OK, body)
        }
        SubmissionResult::ValidationError {
            field,
            message,
            violations,
        } => {
            let mut body = SubmitFurnishResponse::base(false, message);
            body.error_type = Some("VALIDATION_ERROR".to_string());
            body.field = field;
            body.violations = Some(violations);
            (StatusCode::BAD_REQUEST, body)
        }
        SubmissionResult::TechnicalError {
            operation,
            message,
            cause,
            details,
        } => {
            let mut body = SubmitFurnishResponse::base(false, message);
            body.error_type = Some("TECHNICAL_ERROR".to_string());
            body.operation = Some(operation);
            body.cause = Some(cause);
            body.details = Some(details);
            (StatusCode::INTERNAL_SERVER_ERROR, body)
        }
    };

    (status, Json(body)).into_response()
}

/// 申告を却下する
///
/// ## エンドポイント
/// POST /internal/furnish/applications/{txn_no}/reject
pub async fn reject_furnish(
    State(state): State<Arc<FurnishState>>,
    Path(txn_no): Path<String>,
    Json(req): Json<RejectFurnishRequest>,
) -> Response {
    let input = RejectionInput {
        txn_no,
        officer_id: req.officer_id,
        reason_code: req.reason_code,
        remarks: req.remarks,
        send_email_to_owner: req.send_email_to_owner,
        email_template_id: req.email_template_id,
    };

    let result = state.rejection.reject_furnish(input).await;

    let (status, body) = match result {
        RejectionResult::Success {
            application,
            email_sent_to_owner,
            notice_resent_to_portal,
            message,
        } => {
            let mut body = DecisionResponse::base(true, message);
            body.application = Some(FurnishApplicationDto::from_application(&application));
            body.email_sent_to_owner = Some(email_sent_to_owner);
            body.notice_resent_to_portal = Some(notice_resent_to_portal);
            (StatusCode::OK, body)
        }
        RejectionResult::BusinessError { reason, message } => {
            let mut body = DecisionResponse::base(false, message);
            body.error_type = Some("BUSINESS_ERROR".to_string());
            body.reason = Some(reason);
            (StatusCode::OK, body)
        }
        RejectionResult::ValidationError { field, message } => {
            let mut body = DecisionResponse::base(false, message);
            body.error_type = Some("VALIDATION_ERROR".to_string());
            body.field = field;
            (StatusCode::BAD_REQUEST, body)
        }
        RejectionResult::TechnicalError {
            operation,
            message,
            cause,
            details,
        } => {
            let mut body = DecisionResponse::base(false, message);
            body.error_type = Some("TECHNICAL_ERROR".to_string());
            body.operation = Some(operation);
            body.cause = Some(cause);
            body.details = Some(details);
            (StatusCode::INTERNAL_SERVER_ERROR, body)
        }
    };

    (status, Json(body)).into_response()
}

/// 申告を承認する
///
/// ## エンドポイント
/// POST /internal/furnish/applications/{txn_no}/approve
pub async fn approve_furnish(
    State(state): State<Arc<FurnishState>>,
    Path(txn_no): Path<String>,
    Json(req): Json<ApproveFurnishRequest>,
) -> Response {
    let input = ApprovalInput {
        txn_no,
        officer_id: req.officer_id,
        remarks: req.remarks,
    };

    let result = state.approval.approve_furnish(input).await;

    let (status, body) = match result {
        ApprovalResult::Success {
            application,
            hirer_driver_record_created,
            suspension_revived,
            message,
        } => {
            let mut body = DecisionResponse::base(true, message);
            body.application = Some(FurnishApplicationDto::from_application(&application));
            body.hirer_driver_record_created = Some(hirer_driver_record_created);
            body.suspension_revived = Some(suspension_revived);
            (StatusCode::OK, body)
        }
        ApprovalResult::BusinessError { reason, message } => {
            let mut body = DecisionResponse::base(false, message);
            body.error_type = Some("BUSINESS_ERROR".to_string());
            body.reason = Some(reason);
            (StatusCode::OK, body)
        }
        ApprovalResult::ValidationError { field, message } => {
            let mut body = DecisionResponse::base(false, message);
            body.error_type = Some("VALIDATION_ERROR".to_string());
            body.field = field;
            (StatusCode::BAD_REQUEST, body)
        }
        ApprovalResult::TechnicalError {
            operation,
            message,
            cause,
            details,
        } => {
            let mut body = DecisionResponse::base(false, message);
            body.error_type = Some("TECHNICAL_ERROR".to_string());
            body.operation = Some(operation);
            body.cause = Some(cause);
            body.details = Some(details);
            (StatusCode::INTERNAL_SERVER_ERROR, body)
        }
    };

    (status, Json(body)).into_response()
}
