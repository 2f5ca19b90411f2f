//! # eService ポータルクライアント
//!
//! 却下処分後に「この通知書は再申告を受け付けられる」と
//! eService ポータルへ通知するためのクライアント。
//!
//! ## 設計方針
//!
//! - **fire-and-forget**: 成否のみを返し、レスポンスペイロードは想定しない
//! - **trait による抽象化**: テストではモック実装に差し替える

use async_trait::async_trait;
use noticeflow_domain::value_objects::NoticeNo;

use crate::error::InfraError;

/// eService ポータルクライアントトレイト
#[async_trait]
pub trait EservicePortalClient: Send + Sync {
    /// 通知書を eService ポータルに再掲載する（再申告受付シグナル）
    async fn resend_notice_to_portal(&self, notice_no: &NoticeNo) -> Result<(), InfraError>;
}

/// HTTP 実装の EservicePortalClient
///
/// ポータルの内部 API `POST {base_url}/internal/notices/{notice_no}/resend`
/// を呼び出す。
pub struct HttpEservicePortalClient {
    client:   reqwest::Client,
    base_url: String,
}

impl HttpEservicePortalClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl EservicePortalClient for HttpEservicePortalClient {
    async fn resend_notice_to_portal(&self, notice_no: &NoticeNo) -> Result<(), InfraError> {
        let url = format!(
            "{}/internal/notices/{}/resend",
            self.base_url,
            notice_no.as_str()
        );

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| InfraError::portal(format!("ポータル呼び出しに失敗: {e}")))?;

        if !response.status().is_success() {
            return Err(InfraError::portal(format!(
                "ポータルがエラーを返しました: {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_クライアントはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpEservicePortalClient>();
    }
}
