use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// 优雅关闭管理器
#[derive(Clone)]
pub struct ShutdownManager {
    /// 关闭后置为 None
    shutdown_tx: Arc<RwLock<Option<broadcast::Sender<()>>>>,
}

impl ShutdownManager {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(16);

        Self {
            shutdown_tx: Arc::new(RwLock::new(Some(shutdown_tx))),
        }
    }

    /// 订阅关闭信号
    pub async fn subscribe(&self) -> broadcast::Receiver<()> {
        let shutdown_tx = self.shutdown_tx.read().await;
        if let Some(ref tx) = *shutdown_tx {
            tx.subscribe()
        } else {
            // 已经关闭，返回一个立即触发的接收器
            let (tx, rx) = broadcast::channel(1);
            let _ = tx.send(());
            rx
        }
    }

    /// 触发关闭，重复调用无效果
    pub async fn shutdown(&self) {
        let Some(tx) = self.shutdown_tx.write().await.take() else {
            debug!("关闭管理器已经触发过关闭");
            return;
        };

        info!("触发系统关闭");
        debug!("发送关闭信号给 {} 个订阅者", tx.receiver_count());
        // 没有接收者时发送失败，可以忽略
        let _ = tx.send(());

        info!("关闭信号已发送");
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

/// 等待关闭信号或服务器任务结束，二者先到者为准
///
/// 服务器先退出时直接返回它的结果；信号先到时广播关闭并在 `grace` 内等待服务器退出。
pub async fn supervise(
    mut app_handle: JoinHandle<Result<()>>,
    signal: impl Future<Output = ()>,
    shutdown_manager: &ShutdownManager,
    grace: Duration,
) -> Result<()> {
    tokio::select! {
        res = &mut app_handle => match res {
            Ok(Ok(())) => {
                warn!("应用在收到关闭信号前退出");
                Ok(())
            }
            Ok(Err(e)) => {
                error!("应用运行失败: {e:#}");
                Err(e)
            }
            Err(e) => {
                error!("应用任务异常结束: {e}");
                Err(anyhow::Error::new(e).context("应用任务异常结束"))
            }
        },
        _ = signal => {
            info!("收到关闭信号，开始优雅关闭...");
            shutdown_manager.shutdown().await;

            match tokio::time::timeout(grace, app_handle).await {
                Ok(Ok(Ok(()))) => info!("应用已优雅关闭"),
                Ok(Ok(Err(e))) => error!("应用关闭时发生错误: {e:#}"),
                Ok(Err(e)) => error!("应用任务异常结束: {e}"),
                Err(_) => warn!("应用关闭超时，强制退出"),
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_shutdown_manager_basic() {
        let manager = ShutdownManager::new();
        let mut rx = manager.subscribe().await;
        assert!(rx.try_recv().is_err());

        manager.shutdown().await;

        let result = timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let manager = ShutdownManager::new();

        let mut rx1 = manager.subscribe().await;
        let mut rx2 = manager.subscribe().await;

        manager.shutdown().await;

        assert!(timeout(Duration::from_millis(100), rx1.recv()).await.is_ok());
        assert!(timeout(Duration::from_millis(100), rx2.recv()).await.is_ok());
    }

    #[tokio::test]
    async fn test_subscribe_after_shutdown() {
        let manager = ShutdownManager::new();
        manager.shutdown().await;

        // 关闭之后订阅应立即收到信号
        let mut rx = manager.subscribe().await;
        let result = timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_double_shutdown() {
        let manager = ShutdownManager::new();
        let mut rx = manager.subscribe().await;
        manager.shutdown().await;
        manager.shutdown().await;

        // 只发送一次信号，之后发送端已关闭
        assert!(matches!(rx.recv().await, Ok(())));
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_shutdown_from_another_handle() {
        let manager = ShutdownManager::new();

        let mut rx = manager.subscribe().await;
        let wait_handle = tokio::spawn(async move {
            let _ = rx.recv().await;
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        manager.shutdown().await;

        let result = timeout(Duration::from_millis(100), wait_handle).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_supervise_returns_when_server_fails() {
        let manager = ShutdownManager::new();
        let app_handle = tokio::spawn(async { Err(anyhow::anyhow!("绑定地址失败: 127.0.0.1:1")) });

        // 信号永远不会到达
        let result = timeout(
            Duration::from_secs(1),
            supervise(app_handle, std::future::pending(), &manager, Duration::from_secs(30)),
        )
        .await
        .expect("服务器失败后应立即返回");

        let err = result.unwrap_err();
        assert!(err.to_string().contains("绑定地址失败"));
    }

    #[tokio::test]
    async fn test_supervise_broadcasts_shutdown_on_signal() {
        let manager = ShutdownManager::new();
        let mut rx = manager.subscribe().await;
        let app_handle = tokio::spawn(async move {
            let _ = rx.recv().await;
            Ok(())
        });

        let result = timeout(
            Duration::from_secs(1),
            supervise(app_handle, async {}, &manager, Duration::from_millis(500)),
        )
        .await
        .expect("收到信号后应完成关闭");

        assert!(result.is_ok());
    }
}
