//! # NoticeFlow ドメイン層
//!
//! 交通違反通知書に対する申告（furnish）業務の中核となるドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! このクレートは DDD（ドメイン駆動設計）の原則に従い、以下を提供する:
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（例: FurnishApplication,
//!   Notice）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（例: TxnNo,
//!   NoticeNo）
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! app → infra → domain → shared
//! ```
//!
//! ドメイン層は `shared` のみに依存し、インフラ層（DB、外部サービス）には
//! 一切依存しない。これにより、ビジネスロジックの純粋性が保たれる。
//!
//! ## モジュール構成
//!
//! - [`error`] - ドメイン層で発生するエラーの定義
//! - [`clock`] - 時刻プロバイダの抽象化
//! - [`value_objects`] - 共通値オブジェクト
//! - [`notice`] - 違反通知書エンティティ
//! - [`furnish`] - 申告（furnish）エンティティ群
//! - [`notification`] - メール通知のドメインモデル

#[macro_use]
mod macros;

pub mod clock;
pub mod error;
pub mod furnish;
pub mod notice;
pub mod notification;
pub mod value_objects;

pub use error::DomainError;

/// PII マスキングに使用する固定文字列
///
/// `define_validated_string!` の PII アームが `Debug` 出力に使用する。
pub const REDACTED: &str = "[REDACTED]";
