//! # 通知ユースケース
//!
//! 却下メールのレンダリングと送信を統合する。

mod service;
mod template_renderer;

pub use service::NotificationService;
pub use template_renderer::TemplateRenderer;
