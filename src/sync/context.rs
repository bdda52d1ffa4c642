//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了请求上下文，携带上游传入的截止时间和取消信号。

use crate::error::{Result, SyncError};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// 请求上下文
///
/// 同步引擎的每个入口都接收一个上下文。被上下文保护的操作在取消或超过截止时间时
/// 立即返回，对应的底层调用被丢弃。
#[derive(Debug, Clone)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::background()
    }
}

impl RequestContext {
    /// 无截止时间、不会被外部取消的上下文
    pub fn background() -> Self {
        Self {
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    /// 从现在起 `timeout` 后到期的上下文
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().timeout(timeout)
    }

    /// 绑定到给定取消令牌的上下文
    pub fn with_token(cancel: CancellationToken) -> Self {
        Self {
            deadline: None,
            cancel,
        }
    }

    /// 设置相对截止时间，`Duration::ZERO` 表示不限制
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.deadline = if timeout.is_zero() {
            None
        } else {
            Some(Instant::now() + timeout)
        };
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 取消该上下文及其派生的所有操作
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// 在上下文约束下执行操作
    ///
    /// 取消返回 [`SyncError::Cancelled`]，超时返回 [`SyncError::Timeout`]
    pub async fn run<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let guarded = async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(SyncError::Cancelled),
                res = fut => res,
            }
        };

        match self.deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, guarded).await {
                Ok(res) => res,
                Err(_) => Err(SyncError::Timeout(op.to_string())),
            },
            None => guarded.await,
        }
    }
}
