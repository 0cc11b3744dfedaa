//! 事件总线统一错误定义
//!
//! 聚焦处理器故障、注册表类型解析与目录过滤等最小必要集合，
//! 便于上层（如 `relay-session`）统一转换为自身错误类型。
//!
use thiserror::Error;

/// 统一错误类型（基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BusError {
    // --- 分发 ---
    #[error("handler fault: event={event}, binding={binding}: {source}")]
    HandlerFault {
        event: &'static str,
        binding: String,
        #[source]
        source: anyhow::Error,
    },

    // --- 注册表/目录 ---
    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("event type not cataloged: {0}")]
    NotCataloged(String),
}

impl BusError {
    pub fn handler_fault(
        event: &'static str,
        binding: impl ToString,
        source: anyhow::Error,
    ) -> Self {
        BusError::HandlerFault {
            event,
            binding: binding.to_string(),
            source,
        }
    }

    /// 是否为订阅者处理器故障
    pub fn is_handler_fault(&self) -> bool {
        matches!(self, BusError::HandlerFault { .. })
    }
}

/// 统一 Result 类型别名
pub type BusResult<T> = Result<T, BusError>;
