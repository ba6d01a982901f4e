//! # 通知ユースケース
//!
//! テンプレート解決とメール配信を行う。
//!
//! - `placeholder`: `{{key}}` トークンの置換（全テンプレート共通）
//! - `template_resolver`: 種別とデータから件名・本文を決める
//! - `dispatcher`: 通知行の保存からメール送信までの一連の流れ

mod dispatcher;
pub mod placeholder;
mod template_resolver;

pub use dispatcher::{DispatchInput, DispatchReport, NotificationDispatcher, SendEmailInput};
pub use template_resolver::{ResolveRequest, ResolvedEmail, TemplateResolver, TemplateSource};
