//! marshal-core
//!
//! Core building blocks for the marshal action dispatcher: a worker consumes
//! action messages (`start-app`, `regenerate-apprc`, ...) from a queue,
//! validates them against the application's state and runs the rendered
//! command on each targeted unit.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（status, application, message, ids, command, errors）
//! - **ports**: 抽象化レイヤー（MessageQueue, AppStore, Provisioner, LogSink, Clock）
//! - **app**: アプリケーションロジック（registry, dispatcher, disposition, worker_loop, builder）
//! - **impls**: 実装（InMemoryQueue, InMemoryAppStore など開発用）
//! - **config**: TOML 設定
//! - **observability**: tracing の初期化と span

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
