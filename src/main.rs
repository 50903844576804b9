use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use taskboard::{
    app::Application,
    shutdown::{supervise, ShutdownManager},
};
use taskboard_config::{AppConfig, ConfigValidator};
use taskboard_observability::{init_metrics, init_structured_logging, LogFormat, LoggingConfig};
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let matches = Command::new("taskboard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("任务看板服务")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径（缺省时依次查找默认位置）"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别，覆盖配置文件")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式，覆盖配置文件")
                .value_parser(["json", "pretty", "compact"]),
        )
        .arg(
            Arg::new("bind")
                .short('b')
                .long("bind")
                .value_name("ADDR")
                .help("监听地址，覆盖配置文件"),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").map(String::as_str);

    // 加载配置
    let mut config = AppConfig::load(config_path)
        .with_context(|| format!("加载配置失败: {}", config_path.unwrap_or("默认位置")))?;

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.observability.log_level = level.clone();
    }
    if let Some(format) = matches.get_one::<String>("log-format") {
        config.observability.log_format = format.clone();
    }
    if let Some(bind) = matches.get_one::<String>("bind") {
        config.api.bind_address = bind.clone();
    }
    config.validate().context("命令行参数覆盖后的配置无效")?;

    // 初始化日志系统
    let log_format = config
        .observability
        .log_format
        .parse::<LogFormat>()
        .map_err(|e| anyhow::anyhow!(e))?;
    init_structured_logging(&LoggingConfig {
        level: config.observability.log_level.clone(),
        format: log_format,
        include_location: false,
    })?;

    info!("启动任务看板服务");
    info!("配置文件: {}", config_path.unwrap_or("默认位置"));

    let metrics_handle = if config.observability.metrics_enabled {
        Some(init_metrics().context("初始化指标导出失败")?)
    } else {
        None
    };

    // 创建应用实例
    let app = Arc::new(Application::new(config, metrics_handle).await?);

    // 创建优雅关闭管理器
    let shutdown_manager = ShutdownManager::new();

    // 启动应用
    let app_handle = {
        let shutdown_rx = shutdown_manager.subscribe().await;
        let app = Arc::clone(&app);

        tokio::spawn(async move { app.run(shutdown_rx).await })
    };

    // 服务器提前退出时不再等待信号
    let outcome = supervise(
        app_handle,
        wait_for_shutdown_signal(),
        &shutdown_manager,
        Duration::from_secs(30),
    )
    .await;

    app.close().await;

    info!("任务看板服务已退出");
    outcome
}

/// 等待关闭信号
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("安装Ctrl+C信号处理器失败: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("安装SIGTERM信号处理器失败: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("收到Ctrl+C信号");
        },
        _ = terminate => {
            info!("收到SIGTERM信号");
        },
    }
}
