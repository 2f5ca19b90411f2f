//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで却下メールを HTML/plaintext 両形式で生成する。
//!
//! ## 設計方針
//!
//! - **`include_str!` によるコンパイル時埋め込み**: テンプレートはバイナリに埋め込まれる
//! - **閉集合のテンプレート種別**: クライアント指定 ID は
//!   `RejectionTemplateType` に解決済みの状態で渡される
//! - **件名は通知書番号から生成**: テンプレート種別に依存しない

use noticeflow_domain::notification::{
    EmailMessage,
    NotificationError,
    RejectionEmailView,
    RejectionTemplateType,
};
use tera::{Context, Tera};

/// テンプレートレンダラー
///
/// tera テンプレートエンジンをラップし、`RejectionEmailView` から
/// `EmailMessage` を生成する。
pub struct TemplateRenderer {
    engine: Tera,
}

impl TemplateRenderer {
    /// 新しいレンダラーインスタンスを作成
    ///
    /// `include_str!` で埋め込んだテンプレートを tera に登録する。
    pub fn new() -> Result<Self, NotificationError> {
        let mut engine = Tera::default();

        engine
            .add_raw_templates(vec![
                (
                    "rejection_standard.html",
                    include_str!("../../../templates/notifications/rejection_standard.html"),
                ),
                (
                    "rejection_standard.txt",
                    include_str!("../../../templates/notifications/rejection_standard.txt"),
                ),
                (
                    "rejection_resubmission.html",
                    include_str!("../../../templates/notifications/rejection_resubmission.html"),
                ),
                (
                    "rejection_resubmission.txt",
                    include_str!("../../../templates/notifications/rejection_resubmission.txt"),
                ),
                (
                    "rejection_generic.html",
                    include_str!("../../../templates/notifications/rejection_generic.html"),
                ),
                (
                    "rejection_generic.txt",
                    include_str!("../../../templates/notifications/rejection_generic.txt"),
                ),
            ])
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(Self { engine })
    }

    /// 却下メールの件名を生成する
    ///
    /// 件名パターン: `[NoticeFlow] Rejection of Furnish Submission - Notice {番号}`
    pub fn generate_rejection_email_subject(notice_no: &str) -> String {
        format!("[NoticeFlow] Rejection of Furnish Submission - Notice {notice_no}")
    }

    /// 却下メール本文（HTML / plaintext）を生成する
    pub fn generate_email_content(
        &self,
        template: RejectionTemplateType,
        view: &RejectionEmailView,
        officer_id: &str,
    ) -> Result<(String, String), NotificationError> {
        let mut context = Context::new();
        context.insert("notice_no", &view.notice_no);
        context.insert("txn_no", &view.txn_no);
        context.insert("vehicle_no", &view.vehicle_no);
        context.insert("reason", &view.reason);
        context.insert(
            "officer_remarks",
            &view.officer_remarks.as_deref().unwrap_or(""),
        );
        context.insert("officer_id", officer_id);
        context.insert(
            "rejected_on",
            &view.rejected_at.format("%Y-%m-%d").to_string(),
        );

        let template_name = template.template_name();
        let html_body = self
            .engine
            .render(&format!("{template_name}.html"), &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;
        let text_body = self
            .engine
            .render(&format!("{template_name}.txt"), &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok((html_body, text_body))
    }

    /// 件名・本文を組み立てて送信可能なメールを生成する
    pub fn render_rejection(
        &self,
        view: &RejectionEmailView,
        template: RejectionTemplateType,
        officer_id: &str,
        to: &str,
    ) -> Result<EmailMessage, NotificationError> {
        let subject = Self::generate_rejection_email_subject(&view.notice_no);
        let (html_body, text_body) = self.generate_email_content(template, view, officer_id)?;

        Ok(EmailMessage {
            to: to.to_string(),
            subject,
            html_body,
            text_body,
        })
    }
}
