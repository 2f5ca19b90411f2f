//! # リポジトリ実装
//!
//! 申告ワークフローが参照・更新するエンティティの永続化を提供する。
//!
//! ## 設計方針
//!
//! - **依存性逆転**: トレイトをインフラ層で定義し、ユースケース層はトレイトに依存
//! - **データベース抽象化**: sqlx を使用し、PostgreSQL 固有の処理をカプセル化
//! - **テスタビリティ**: トレイト経由でモック可能な設計
//! - **書き込みの構造的強制**: 書き込みメソッドは `&mut TxContext` を要求する

pub mod exclusion_list_repository;
pub mod furnish_application_repository;
pub mod furnish_document_repository;
pub mod notice_repository;
pub mod owner_driver_repository;
pub mod suspension_repository;

pub use exclusion_list_repository::{ExclusionListRepository, PostgresExclusionListRepository};
pub use furnish_application_repository::{
    FurnishApplicationRepository,
    PostgresFurnishApplicationRepository,
};
pub use furnish_document_repository::{
    FurnishDocumentRepository,
    PostgresFurnishDocumentRepository,
};
pub use notice_repository::{NoticeRepository, PostgresNoticeRepository};
pub use owner_driver_repository::{OwnerDriverRepository, PostgresOwnerDriverRepository};
pub use suspension_repository::{PostgresSuspensionRepository, SuspensionRepository};
