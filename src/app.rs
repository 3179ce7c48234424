use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use taskboard_api::create_app;
use taskboard_config::AppConfig;
use taskboard_domain::{OrchestratorSettings, TaskOrchestrator};
use taskboard_infrastructure::{StorageClients, StorageFactory};
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{info, warn};

use crate::shutdown::ShutdownManager;

/// 主应用程序
pub struct Application {
    config: AppConfig,
    orchestrator: Arc<TaskOrchestrator>,
}

impl Application {
    /// 按配置创建存储客户端，确保表、容器和队列存在
    pub async fn new(config: AppConfig) -> Result<Self> {
        info!(
            "初始化应用程序，表存储: {:?}，Blob存储: {:?}，队列: {:?}",
            config.record_store.r#type, config.blob_store.r#type, config.queue.r#type
        );

        let clients = StorageFactory::create(&config)
            .await
            .context("创建存储客户端失败")?;
        Self::with_clients(config, clients).await
    }

    /// 使用已创建好的存储客户端构建应用
    pub async fn with_clients(config: AppConfig, clients: StorageClients) -> Result<Self> {
        clients
            .ensure_all_exist()
            .await
            .context("初始化存储资源失败")?;

        let settings = OrchestratorSettings {
            url_ttl: Duration::from_secs(config.blob_store.url_ttl_seconds),
            ..OrchestratorSettings::default()
        };
        let orchestrator = Arc::new(TaskOrchestrator::with_settings(
            clients.records,
            clients.blobs,
            clients.notifications,
            settings,
        ));

        Ok(Self {
            config,
            orchestrator,
        })
    }

    /// 构建带全部中间件的路由
    pub fn router(&self) -> Router {
        create_app(Arc::clone(&self.orchestrator), &self.config.api)
    }

    /// 运行API服务器，直到收到关闭信号
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let bind_address = &self.config.api.bind_address;
        let listener = TcpListener::bind(bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {bind_address}"))?;

        info!("API服务器启动在 http://{}", bind_address);

        axum::serve(listener, self.router().into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("API服务器收到关闭信号");
            })
            .await
            .context("API服务器运行失败")?;

        info!("API服务器已停止");
        Ok(())
    }

    /// 运行服务器直到 `shutdown_signal` 完成，然后在 `grace_period` 内等待优雅关闭
    ///
    /// 服务器在收到信号前退出（例如绑定地址失败）时立即返回其错误。
    pub async fn serve_until<F>(
        self: Arc<Self>,
        shutdown_signal: F,
        grace_period: Duration,
    ) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let shutdown_manager = ShutdownManager::new();
        let shutdown_rx = shutdown_manager.subscribe().await;
        let app = Arc::clone(&self);
        let mut server = tokio::spawn(async move { app.run(shutdown_rx).await });

        tokio::select! {
            result = &mut server => {
                return match result {
                    Ok(Ok(())) => {
                        warn!("API服务器在收到关闭信号前退出");
                        Ok(())
                    }
                    Ok(Err(e)) => Err(e),
                    Err(e) => Err(anyhow::Error::new(e).context("API服务器任务异常终止")),
                };
            }
            _ = shutdown_signal => {
                info!("收到关闭信号，开始优雅关闭...");
            }
        }

        shutdown_manager.shutdown().await;
        match tokio::time::timeout(grace_period, server).await {
            Ok(Ok(result)) => {
                result?;
                info!("应用已优雅关闭");
            }
            Ok(Err(e)) => return Err(anyhow::Error::new(e).context("API服务器任务异常终止")),
            Err(_) => warn!("应用关闭超时，强制退出"),
        }
        Ok(())
    }
}
