//! # Vybbi 通知サービス ライブラリ
//!
//! 設定・ユースケース・ハンドラ・ルーターを公開する。
//! バイナリ（`main.rs`）はここで組み立てた [`app::router`] を起動するだけ。

pub mod app;
pub mod config;
pub mod error;
pub mod handler;
pub mod transport;
pub mod usecase;
