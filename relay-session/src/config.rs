//! 生命周期配置（LifecycleConfig）
//!
//! 决定哪些阶段迁移属于“环境重置边界”、哪些事件类型在清扫中保留。
//! 支持以 JSON 加载，缺省字段取默认值：
//!
//! ```rust
//! use relay_session::config::LifecycleConfig;
//!
//! let cfg = LifecycleConfig::from_json_str(r#"{ "retain": ["audio.volume"] }"#).unwrap();
//! assert_eq!(cfg.retain, vec!["audio.volume".to_string()]);
//! assert_eq!(cfg.reset_boundaries.len(), 2);
//! ```
//!
use crate::error::{SessionError, SessionResult};
use crate::phase::SessionPhase;
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 一条重置边界：从 `from` 迁移到 `to` 时触发全量清扫
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Boundary {
    pub from: SessionPhase,
    pub to: SessionPhase,
}

impl Boundary {
    pub const fn new(from: SessionPhase, to: SessionPhase) -> Self {
        Self { from, to }
    }
}

fn default_boundaries() -> Vec<Boundary> {
    vec![
        Boundary::new(SessionPhase::Running, SessionPhase::Idle),
        Boundary::new(SessionPhase::Paused, SessionPhase::Idle),
    ]
}

#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// 触发清扫的阶段迁移
    #[builder(default = default_boundaries())]
    pub reset_boundaries: Vec<Boundary>,
    /// 清扫时保留的事件类型名（`EventRecord::NAME`）
    #[builder(default)]
    pub retain: Vec<String>,
    /// 拒绝阶段图之外的迁移
    #[builder(default = true)]
    pub strict_transitions: bool,
    /// 保留的迁移历史条数
    #[builder(default = 32)]
    pub history_limit: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl LifecycleConfig {
    pub fn from_json_str(s: &str) -> SessionResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> SessionResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> SessionResult<()> {
        for b in &self.reset_boundaries {
            if b.from == b.to {
                return Err(SessionError::Config(format!(
                    "reset boundary {} -> {} is a self transition",
                    b.from, b.to
                )));
            }
            if self.strict_transitions && !b.from.can_transition_to(b.to) {
                return Err(SessionError::Config(format!(
                    "reset boundary {} -> {} is not a legal transition",
                    b.from, b.to
                )));
            }
        }
        if let Some(name) = self.retain.iter().find(|n| n.trim().is_empty()) {
            return Err(SessionError::Config(format!(
                "retained event name must not be blank: {name:?}"
            )));
        }
        Ok(())
    }

    pub fn is_reset_boundary(&self, from: SessionPhase, to: SessionPhase) -> bool {
        self.reset_boundaries
            .iter()
            .any(|b| b.from == from && b.to == to)
    }
}
