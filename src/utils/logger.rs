use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CRATE_TARGET: &str = "cost_redistribution";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 終端機輸出
    Compact,
    /// 每行一筆 JSON，給批次執行收集
    Json,
}

/// `RUST_LOG` 優先；否則 verbose 時本 crate 開到 debug
fn build_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{}={},warn", CRATE_TARGET, level))
    })
}

/// 安裝全域 subscriber；已安裝過時回傳 false（測試中重複呼叫不會 panic）
pub fn init_logger(format: LogFormat, verbose: bool) -> bool {
    let registry = tracing_subscriber::registry().with(build_filter(verbose));

    let installed = match format {
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_target(verbose)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().with_target(true).json().flatten_event(true))
            .try_init(),
    };

    installed.is_ok()
}

pub fn init_cli_logger(verbose: bool) {
    if !init_logger(LogFormat::Compact, verbose) {
        tracing::debug!("Logger already initialised");
    }
}

pub fn init_json_logger() {
    if !init_logger(LogFormat::Json, false) {
        tracing::debug!("Logger already initialised");
    }
}
