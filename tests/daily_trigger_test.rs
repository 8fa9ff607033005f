// ==========================================
// 每日定时触发测试
// ==========================================


use std::time::Duration;

use tokio::sync::watch;
use test_helpers::create_test_state;

#[tokio::test]
async fn test_trigger_exits_on_shutdown() {
    let (_temp, state) = create_test_state().unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = state.daily_trigger().spawn(shutdown_rx);
    shutdown_tx.send(true).unwrap();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("定时任务未在关闭信号后退出")
        .unwrap();

    // 关闭前未到触发时间，不应产生运行记录
    assert!(state.run_log_repo.list_recent(10).unwrap().is_empty());
}

#[tokio::test]
async fn test_trigger_exits_when_sender_dropped() {
    let (_temp, state) = create_test_state().unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = state.daily_trigger().spawn(shutdown_rx);
    drop(shutdown_tx);

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("定时任务未在发送端关闭后退出")
        .unwrap();
}
