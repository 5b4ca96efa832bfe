//! # Light Estate Notify Service
//!
//! 販売状況の LED 表示、プッシュ通知の一斉配信、お知らせメール送信を提供する
//! HTTP サービス。
//!
//! ## モジュール構成
//!
//! - [`app_builder`]: 依存の組み立てとルーター構築
//! - [`config`]: 環境変数からの設定読み込み
//! - [`error`]: API エラーと HTTP レスポンスへの変換
//! - [`handler`]: HTTP ハンドラ
//! - [`usecase`]: ユースケース（一斉配信ディスパッチャを含む）

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;
