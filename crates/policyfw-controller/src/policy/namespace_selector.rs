//! 命名空间选择模块
//!
//! 该模块根据策略的 `NamespaceSelector` 过滤候选命名空间：先匹配 include，
//! 再剔除 exclude，输出保持候选列表的原始顺序。

use async_trait::async_trait;
use glob::{MatchOptions, Pattern};
use k8s_openapi::api::core::v1::Namespace;
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use policyfw_common::{Error, NamespaceSelector, Result};
use tracing::debug;

/// 与 shell 通配符一致：`*` 和 `?` 不跨越 `/`，区分大小写
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// 列举集群中全部命名空间名称的只读能力
///
/// 使用 kube 客户端时需要 core 组 namespaces 资源的 get/list/watch 权限。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NamespaceLister: Send + Sync {
    /// 返回全部命名空间名称
    async fn list_namespaces(&self) -> Result<Vec<String>>;
}

#[async_trait]
impl NamespaceLister for Client {
    async fn list_namespaces(&self) -> Result<Vec<String>> {
        let api: Api<Namespace> = Api::all(self.clone());
        let namespaces = api
            .list(&ListParams::default())
            .await
            .map_err(Error::transport)?;

        Ok(namespaces.items.iter().map(|ns| ns.name_any()).collect())
    }
}

/// 编译后的命名空间选择器
///
/// 构造时编译全部模式，任何一个模式非法都会立即报错，
/// 避免损坏的选择器静默地匹配全部或不匹配任何命名空间。
/// include 为空时选择器不选中任何命名空间，此时不再编译 exclude。
#[derive(Debug, Clone)]
pub struct NamespaceMatcher {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl NamespaceMatcher {
    /// 编译选择器中的 include/exclude 模式
    pub fn new(selector: &NamespaceSelector) -> Result<Self> {
        if selector.include.is_empty() {
            return Ok(Self {
                include: Vec::new(),
                exclude: Vec::new(),
            });
        }

        Ok(Self {
            include: compile(&selector.include)?,
            exclude: compile(&selector.exclude)?,
        })
    }

    /// 单个命名空间是否被选中
    ///
    /// include 为空时不选中任何命名空间。
    pub fn is_selected(&self, namespace: &str) -> bool {
        let included = self
            .include
            .iter()
            .any(|pattern| pattern.matches_with(namespace, MATCH_OPTIONS));
        if !included {
            return false;
        }

        !self
            .exclude
            .iter()
            .any(|pattern| pattern.matches_with(namespace, MATCH_OPTIONS))
    }

    /// 稳定过滤候选命名空间
    pub fn filter<S: AsRef<str>>(&self, namespaces: &[S]) -> Vec<String> {
        namespaces
            .iter()
            .map(AsRef::as_ref)
            .filter(|ns| self.is_selected(ns))
            .map(str::to_string)
            .collect()
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|raw| {
            Pattern::new(&normalize(raw)).map_err(|source| Error::Pattern {
                pattern: raw.clone(),
                source,
            })
        })
        .collect()
}

/// 将常见的 shell 通配符写法改写为 glob crate 的语法
///
/// 字符类开头的 `[^` 改写为 `[!`，类外连续的 `*` 合并为一个。
/// 字符类开头（含取反符号之后）的 `]` 按字面字符处理。
fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut in_class = false;

    while let Some(c) = chars.next() {
        match c {
            '[' if !in_class => {
                in_class = true;
                out.push('[');
                if matches!(chars.peek(), Some('^') | Some('!')) {
                    chars.next();
                    out.push('!');
                }
                if chars.peek() == Some(&']') {
                    chars.next();
                    out.push(']');
                }
            }
            ']' if in_class => {
                in_class = false;
                out.push(']');
            }
            '*' if !in_class => {
                out.push('*');
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// 过滤候选命名空间，返回被选择器选中的部分
pub fn match_namespaces<S: AsRef<str>>(
    namespaces: &[S],
    selector: &NamespaceSelector,
) -> Result<Vec<String>> {
    let matched = NamespaceMatcher::new(selector)?.filter(namespaces);
    debug!(
        "命名空间选择器 include={:?} exclude={:?} 选中 {}/{} 个命名空间",
        selector.include,
        selector.exclude,
        matched.len(),
        namespaces.len()
    );
    Ok(matched)
}

/// 列举集群中的全部命名空间，并返回被选择器选中的部分
///
/// 列举失败时原样返回错误。
pub async fn get_namespaces<L>(lister: &L, selector: &NamespaceSelector) -> Result<Vec<String>>
where
    L: NamespaceLister + ?Sized,
{
    let namespaces = lister.list_namespaces().await?;
    match_namespaces(&namespaces, selector)
}
