//! MockPolicy Operator - 基于策略框架的参考控制器
//!
//! 该模块演示如何在策略框架之上构建策略控制器：MockPolicy 资源内嵌框架的通用
//! spec/status 字段，协调时使用命名空间选择器、更新 `Compliant` 条件，
//! 并向父策略发送合规事件。

pub mod controller;
pub mod crd;
pub mod error;
pub mod reconcile;

use anyhow::{Context, Result};
use kube::Client;
use policyfw_controller::FrameworkConfig;

/// Operator 主结构体
pub struct MockPolicyOperator {
    /// 控制器
    controller: controller::Controller,
}

impl MockPolicyOperator {
    /// 创建新的 Operator 实例
    pub async fn new(config: &FrameworkConfig) -> Result<Self> {
        // 创建 Kubernetes 客户端
        let client = Client::try_default()
            .await
            .context("创建 Kubernetes 客户端失败")?;

        let controller = controller::Controller::new(client, config);

        Ok(Self { controller })
    }

    /// 运行 Operator，直到收到终止信号
    pub async fn run(self) -> Result<()> {
        self.controller.run().await;

        Ok(())
    }
}
