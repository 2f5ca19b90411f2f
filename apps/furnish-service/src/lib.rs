//! # Furnish Service ライブラリ
//!
//! Furnish Service のユースケースとハンドラを公開する。
//! テスト用に内部モジュールへのアクセスを提供する。

pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;
