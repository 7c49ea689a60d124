//! App - アプリケーション層
//!
//! ports を組み合わせて action dispatch を実装する。
//!
//! # 主要コンポーネント
//! - **ActionRegistry**: action 名 → descriptor (arity / precondition / renderer)
//! - **Dispatcher**: 1 message を検証 → 描画 → 実行し、DispatchReport を返す
//! - **DispositionPolicy**: report から ack / release / drop を決める
//! - **WorkerGroup**: lease → dispatch → disposition のループ
//! - **DispatcherBuilder**: ワイヤリングと起動時検証

pub mod builder;
pub mod dispatcher;
pub mod disposition;
pub mod registry;
pub mod render;
pub mod retry;
pub mod targets;
pub mod worker_loop;

pub use self::builder::{BuildError, DispatcherBuilder};
pub use self::dispatcher::{DispatchReport, Dispatcher, UnitExecution, failure_line};
pub use self::disposition::{DefaultDisposition, Disposition, DispositionPolicy};
pub use self::registry::{
    ActionDescriptor, ActionRegistry, Precondition, REGENERATE_APPRC, RegistryError, START_APP,
};
pub use self::render::{ApprcRenderer, Renderer, RestartRenderer};
pub use self::retry::RetryPolicy;
pub use self::targets::resolve_targets;
pub use self::worker_loop::WorkerGroup;
