//! # トレーシング初期化
//!
//! `tracing-subscriber` の組み立てを通知サービスのバイナリから切り離す。
//!
//! - 出力形式は `LOG_FORMAT`（`json` / `pretty`）
//! - フィルタは `RUST_LOG`、未設定なら [`TracingConfig::default_filter`]

/// `RUST_LOG` 未設定時のフィルタ
pub const DEFAULT_FILTER: &str = "info,vybbi=debug,tower_http=info";

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 1 行 1 イベントの JSON（本番）
    Json,
    /// 開発用
    #[default]
    Pretty,
}

impl LogFormat {
    /// `LOG_FORMAT` の値を解釈する
    ///
    /// 不明な値は stderr に警告を出して [`LogFormat::Pretty`] にする。
    /// サブスクライバ初期化前に呼ばれるので `tracing` は使わない。
    pub fn parse(value: &str) -> Self {
        match value {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            other => {
                eprintln!("WARNING: LOG_FORMAT={other:?} は不明な値のため pretty で出力します");
                Self::Pretty
            }
        }
    }

    pub fn from_env() -> Self {
        std::env::var("LOG_FORMAT")
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }
}

/// トレーシング初期化設定
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub service_name:   String,
    pub log_format:     LogFormat,
    pub default_filter: String,
}

impl TracingConfig {
    pub fn new(service_name: impl Into<String>, log_format: LogFormat) -> Self {
        Self {
            service_name: service_name.into(),
            log_format,
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }

    pub fn from_env(service_name: impl Into<String>) -> Self {
        Self::new(service_name, LogFormat::from_env())
    }

    /// `RUST_LOG` 未設定時のフィルタを差し替える
    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }
}

/// グローバルサブスクライバを登録する
///
/// 既に登録済みの場合はエラー。JSON 形式ではイベントのフィールドを
/// トップレベルに展開し、現在のスパンを `span` キーに含める。
#[cfg(feature = "observability")]
pub fn init_tracing(
    config: TracingConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::{Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.default_filter));

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!(
        service = %config.service_name,
        log_format = ?config.log_format,
        "トレーシングを初期化"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_既知の値を解釈する() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
    }

    #[test]
    fn test_不明な値はprettyになる() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(""), LogFormat::Pretty);
    }

    #[test]
    fn test_デフォルトフィルタを差し替えられる() {
        let config = TracingConfig::new("vybbi-notification-service", LogFormat::Json);
        assert_eq!(config.default_filter, DEFAULT_FILTER);

        let config = config.with_default_filter("warn");
        assert_eq!(config.default_filter, "warn");
        assert_eq!(config.service_name, "vybbi-notification-service");
    }
}
