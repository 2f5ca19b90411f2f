//! # 通知サービス
//!
//! テンプレートレンダリング → メール送信 → ビジネスイベント記録を統合するサービス。
//!
//! ## 設計方針
//!
//! - **fire-and-forget**: 送信失敗してもエラーを返さず、成否の bool を返す
//! - **イベント記録**: 成功・失敗どちらもビジネスイベントとして出力
//! - **依存性注入**: `NotificationSender` は trait で抽象化

use std::sync::Arc;

use noticeflow_domain::notification::{RejectionEmailView, RejectionTemplateType};
use noticeflow_infra::notification::NotificationSender;
use noticeflow_shared::{event_log::event, log_business_event};

use super::TemplateRenderer;

/// 通知サービス
///
/// 却下処分に伴うメール通知の全体フローを統合する。
/// 送信の失敗は却下処理を中断させない（成否は戻り値で報告する）。
pub struct NotificationService {
    sender: Arc<dyn NotificationSender>,
    template_renderer: TemplateRenderer,
}

impl NotificationService {
    pub fn new(sender: Arc<dyn NotificationSender>, template_renderer: TemplateRenderer) -> Self {
        Self {
            sender,
            template_renderer,
        }
    }

    /// 却下メールを送信し、結果をビジネスイベントとして記録する
    ///
    /// レンダリング・送信のどちらで失敗しても false を返すのみで、
    /// エラーは伝播させない。
    pub async fn send_and_record_rejection_email(
        &self,
        view: &RejectionEmailView,
        template: RejectionTemplateType,
        officer_id: &str,
        to: &str,
    ) -> bool {
        let email = match self
            .template_renderer
            .render_rejection(view, template, officer_id, to)
        {
            Ok(email) => email,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    notice_no = %view.notice_no,
                    "却下メールテンプレートのレンダリングに失敗"
                );
                return false;
            }
        };

        match self.sender.send_email(&email).await {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_SENT,
                    event.entity_type = event::entity_type::FURNISH_APPLICATION,
                    event.entity_id = %view.txn_no,
                    event.result = event::result::SUCCESS,
                    "却下メール送信成功"
                );
                true
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FAILED,
                    event.entity_type = event::entity_type::FURNISH_APPLICATION,
                    event.entity_id = %view.txn_no,
                    event.result = event::result::FAILURE,
                    error = %e,
                    "却下メール送信失敗"
                );
                false
            }
        }
    }
}
