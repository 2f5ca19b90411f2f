//! # HTTP ハンドラ
//!
//! エンドポイントとユースケースを接続する層。
//!
//! 申告系エンドポイントはタグ付き Result を HTTP に写像する:
//! Success / BusinessError（手動審査行き・状態遷移違反）は 200、
//! ValidationError は 400、TechnicalError は 500。
//! クライアントは HTTP ステータスではなく `success` と `error_type` で分岐する。

mod dashboard;
mod furnish;
mod health;

pub use dashboard::{DashboardState, get_application_detail, list_furnish_applications};
pub use furnish::{FurnishState, approve_furnish, reject_furnish, submit_furnish};
pub use health::health_check;
