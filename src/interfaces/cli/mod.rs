/// CLI Interface Module
///
/// Entry point of the `orderbook-engine` binary: parses arguments, starts
/// the book service, the observability server and the order server, and
/// shuts them down on Ctrl-C.

use crate::application::services::{spawn_book_service, ServiceConfig};
use crate::domain::orderbook::Orderbook;
use crate::domain::validation::{OrderValidator, ValidationConfig};
use crate::infrastructure::network::{OrderServer, WireFormat};
use crate::infrastructure::observability::{HealthChecker, ObservabilityServer};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// 订单簿引擎命令行配置
#[derive(Parser, Debug, Clone)]
#[command(name = "orderbook-engine")]
#[command(version)]
#[command(about = "单品种限价订单簿撮合引擎", long_about = None)]
pub struct CliConfig {
    /// 服务器监听地址
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// 订单服务端口
    #[arg(short, long, default_value_t = 50051)]
    pub port: u16,

    /// 基础货币
    #[arg(long, default_value = "BTC")]
    pub base_ccy: String,

    /// 计价货币
    #[arg(long, default_value = "USD")]
    pub quote_ccy: String,

    /// 消息体编码
    #[arg(short = 'w', long, value_enum, default_value_t = WireFormat::Json)]
    pub wire_format: WireFormat,

    /// Metrics/健康检查端口（0 表示禁用）
    #[arg(short = 'm', long, default_value_t = 9090)]
    pub metrics_port: u16,

    /// 单笔订单最大数量
    #[arg(long, default_value_t = 1_000_000)]
    pub max_quantity: u64,

    /// 将撮合线程绑定到 0 号核心（需要 cpu-affinity feature）
    #[arg(long, default_value_t = false)]
    pub cpu_affinity: bool,

    /// 日志级别
    #[arg(short = 'l', long, default_value = "info", value_parser = ["trace", "debug", "info", "warn", "error"])]
    pub log_level: String,

    /// 仅显示配置不启动服务器（用于调试）
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

/// Parses the command line and runs until Ctrl-C.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    run_with(CliConfig::parse()).await
}

pub async fn run_with(config: CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&config.log_level);

    let book = Orderbook::new(config.base_ccy.as_str(), config.quote_ccy.as_str());
    let symbol = book.symbol().to_string();

    info!("订单簿引擎启动");
    info!("配置: {:?}", config);

    println!("========================================");
    println!("  订单簿撮合引擎 v{}", env!("CARGO_PKG_VERSION"));
    println!("========================================");
    println!("交易品种:     {}", symbol);
    println!("监听地址:     {}:{}", config.host, config.port);
    println!("消息编码:     {:?}", config.wire_format);
    if config.metrics_port == 0 {
        println!("Metrics端口:  禁用");
    } else {
        println!("Metrics端口:  {}", config.metrics_port);
    }
    println!("最大数量:     {}", config.max_quantity);
    println!("CPU亲和性:    {}", if config.cpu_affinity { "启用" } else { "禁用" });
    println!("日志级别:     {}", config.log_level);
    println!("========================================");

    if config.dry_run {
        println!("\nDry-run 模式 - 不启动服务器");
        return Ok(());
    }

    let validator = OrderValidator::with_config(ValidationConfig {
        max_quantity: config.max_quantity,
        ..Default::default()
    });
    let service_config = ServiceConfig {
        thread_name: format!("book-{}", symbol),
        core_id: config.cpu_affinity.then_some(0),
    };
    let (handle, worker) = spawn_book_service(book, validator, service_config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let observability = if config.metrics_port != 0 {
        let checker = HealthChecker::new(env!("CARGO_PKG_VERSION"), symbol.clone())
            .with_book(handle.clone());
        let server = ObservabilityServer::new(
            SocketAddr::new(config.host, config.metrics_port),
            Arc::new(checker),
        );
        let mut rx = shutdown_rx.clone();
        Some(tokio::spawn(server.run(async move {
            let _ = rx.changed().await;
        })))
    } else {
        None
    };

    let server = OrderServer::bind((config.host, config.port), handle, config.wire_format).await?;
    server.run(wait_for_ctrl_c()).await?;

    let _ = shutdown_tx.send(true);
    if let Some(task) = observability {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "observability server failed"),
            Err(e) => error!(error = %e, "observability task panicked"),
        }
    }

    // 仍有连接时撮合线程不会退出，最多等待一秒
    let joined = tokio::time::timeout(
        Duration::from_secs(1),
        tokio::task::spawn_blocking(move || worker.join()),
    )
    .await;
    match joined {
        Ok(Ok(Ok(book))) => info!(symbol = %symbol, resting = book.len(), "订单簿引擎已关闭"),
        Ok(_) => error!("book service thread panicked"),
        Err(_) => warn!("client connections still open, exiting without draining"),
    }

    Ok(())
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("收到 Ctrl-C，开始关闭"),
        Err(e) => {
            error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}

/// 初始化日志系统，`RUST_LOG` 优先于 `--log-level`
fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    // 测试中可能被重复调用
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
