//! # Furnish Service 設定
//!
//! 環境変数から Furnish Service サーバーの設定を読み込む。

use std::env;

/// Furnish Service サーバーの設定
#[derive(Debug, Clone)]
pub struct FurnishConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// データベース接続 URL
    pub database_url: String,
    /// eService ポータル設定
    pub portal: PortalConfig,
    /// 通知設定
    pub notification: NotificationConfig,
}

/// eService ポータル連携の設定
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// ポータル内部 API のベース URL
    pub base_url: String,
}

/// 通知機能の設定
///
/// `NOTIFICATION_BACKEND` 環境変数で送信バックエンドを切り替える:
/// - `smtp`: Mailpit（開発）/ SMTP サーバー経由で送信
/// - `noop`: 送信しない（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// 送信バックエンド（"smtp" | "noop"）
    pub backend:      String,
    /// SMTP ホスト（backend=smtp の場合に使用）
    pub smtp_host:    String,
    /// SMTP ポート（backend=smtp の場合に使用）
    pub smtp_port:    u16,
    /// 送信元メールアドレス
    pub from_address: String,
}

impl FurnishConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            host: env::var("FURNISH_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("FURNISH_PORT")
                .expect("FURNISH_PORT が設定されていません")
                .parse()
                .expect("FURNISH_PORT は有効なポート番号である必要があります"),
            database_url: env::var("DATABASE_URL")
                .expect("DATABASE_URL が設定されていません"),
            portal: PortalConfig {
                base_url: env::var("PORTAL_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            },
            notification: NotificationConfig::from_env(),
        })
    }
}

impl NotificationConfig {
    /// 環境変数から通知設定を読み込む
    fn from_env() -> Self {
        Self {
            backend:      env::var("NOTIFICATION_BACKEND").unwrap_or_else(|_| "noop".to_string()),
            smtp_host:    env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            smtp_port:    env::var("SMTP_PORT")
                .unwrap_or_else(|_| "1025".to_string())
                .parse()
                .expect("SMTP_PORT は有効なポート番号である必要があります"),
            from_address: env::var("NOTIFICATION_FROM_ADDRESS")
                .unwrap_or_else(|_| "noreply@noticeflow.example.com".to_string()),
        }
    }
}
