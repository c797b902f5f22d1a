//! 控制器模块
//!
//! 该模块把 MockPolicy 的协调逻辑挂到 kube-runtime 控制器上，
//! 监听全部命名空间中的 MockPolicy 资源，收到终止信号后退出。

use futures::StreamExt;
use kube::{
    api::Api,
    client::Client,
    runtime::{controller::Controller as KubeController, watcher},
};
use policyfw_controller::{ComplianceEventPublisher, FrameworkConfig, KubeEventSink};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::crd::MockPolicy;
use crate::reconcile::{error_policy, reconcile, Context};

/// 控制器结构体
pub struct Controller {
    /// Kubernetes 客户端
    client: Client,
    /// 协调上下文
    context: Arc<Context>,
}

impl Controller {
    /// 创建新的控制器
    pub fn new(client: Client, config: &FrameworkConfig) -> Self {
        let sink = KubeEventSink::new(client.clone(), config.controller_name.clone());
        let publisher = ComplianceEventPublisher::new(sink, config.event_config());

        let context = Arc::new(Context {
            client: client.clone(),
            publisher,
        });

        Self { client, context }
    }

    /// 运行控制器，直到收到终止信号
    pub async fn run(self) {
        let policies: Api<MockPolicy> = Api::all(self.client.clone());

        info!("启动 MockPolicy 控制器");

        KubeController::new(policies, watcher::Config::default())
            .shutdown_on_signal()
            .run(reconcile, error_policy, self.context)
            .for_each(|result| async move {
                match result {
                    Ok(o) => debug!("协调成功: {:?}", o),
                    Err(e) => error!("协调错误: {}", e),
                }
            })
            .await;

        info!("MockPolicy 控制器已停止");
    }
}
