// ==========================================
// 订单排产系统 - 命令行入口
// ==========================================
// 用法:
//   order-aps run-once [db_path]   人工触发一轮排产，输出结果 JSON
//   order-aps daemon [db_path]     每日定时排产，Ctrl-C 退出
// ==========================================

use anyhow::{anyhow, bail, Context};
use order_aps::app::{get_default_db_path, AppState};
use order_aps::logging;
use tokio::sync::watch;

const USAGE: &str = "用法: order-aps <run-once|daemon> [db_path]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "run-once".to_string());
    let db_path = args.next().unwrap_or_else(get_default_db_path);

    tracing::info!("==================================================");
    tracing::info!("{} v{}", order_aps::APP_NAME, order_aps::VERSION);
    tracing::info!(db_path = %db_path, command = %command, "启动");
    tracing::info!("==================================================");

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    match command.as_str() {
        "run-once" => {
            let report = state
                .scheduling_api
                .manual_execute()
                .await
                .context("人工排产失败")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "daemon" => {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let handle = state.daily_trigger().spawn(shutdown_rx);

            tokio::signal::ctrl_c().await.context("监听退出信号失败")?;
            tracing::info!("收到退出信号，等待定时任务结束");
            shutdown_tx.send(true).ok();
            handle.await.context("定时任务异常退出")?;
        }
        other => bail!("未知命令: {}\n{}", other, USAGE),
    }

    Ok(())
}
