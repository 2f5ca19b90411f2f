//! # NoticeFlow インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! このクレートはリポジトリトレイトとその具体実装を提供する。
//! 外部システムの詳細をカプセル化し、ユースケース層を
//! インフラの変更から保護する。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール・トランザクション管理
//! - **リポジトリ実装**: 申告ワークフローが参照・更新するエンティティの永続化
//! - **メール送信**: SMTP / Noop の通知送信バックエンド
//! - **eService ポータル連携**: 却下後の再申告受付シグナル
//!
//! ## 依存関係
//!
//! ```text
//! app → infra → domain → shared
//! ```
//!
//! インフラ層は `domain` に依存する。
//! ドメイン層はインフラ層に依存しない（依存性逆転の原則）。
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL データベース接続・トランザクション管理
//! - [`error`] - インフラ層エラー定義
//! - [`repository`] - リポジトリトレイトと PostgreSQL 実装
//! - [`retry`] - 一時的な DB エラーに対する有限リトライ
//! - [`notification`] - メール送信バックエンド
//! - [`portal`] - eService ポータルクライアント
//! - [`mock`] - テスト用インメモリ実装（`test-utils` feature）

pub mod db;
pub mod error;
pub mod notification;
pub mod portal;
pub mod repository;
pub mod retry;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use error::{InfraError, InfraErrorKind};
