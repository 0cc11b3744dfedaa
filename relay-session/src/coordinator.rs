//! 生命周期协调器（LifecycleCoordinator）
//!
//! 全量清扫的唯一外部触发者：
//! - 跟踪宿主的会话阶段，校验迁移是否合法；
//! - 迁移命中配置的重置边界（默认：离开运行中的会话回到空闲态）时，
//!   对目录中的所有总线调用 `clear`，清除已销毁订阅者遗留的绑定；
//! - 总线自身从不自行清空。
//!
use crate::config::LifecycleConfig;
use crate::error::{SessionError, SessionResult};
use crate::phase::SessionPhase;
use chrono::{DateTime, Utc};
use relay_core::{SweepReport, TypeCatalog};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// 一次阶段迁移的记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionRecord {
    pub from: SessionPhase,
    pub to: SessionPhase,
    pub at: DateTime<Utc>,
    /// 该迁移触发的清扫结果（未触发时为空）
    pub sweep: Option<SweepReport>,
}

pub struct LifecycleCoordinator {
    catalog: TypeCatalog,
    config: LifecycleConfig,
    phase: SessionPhase,
    history: VecDeque<TransitionRecord>,
    last_sweep: Option<SweepReport>,
}

impl LifecycleCoordinator {
    /// 以目录与配置创建协调器，初始阶段为 `Idle`
    pub fn new(catalog: TypeCatalog, config: LifecycleConfig) -> SessionResult<Self> {
        config.validate()?;
        for name in &config.retain {
            if !catalog.contains_name(name) {
                warn!(event = %name, "retained event is not cataloged");
            }
        }
        Ok(Self {
            catalog,
            config,
            phase: SessionPhase::Idle,
            history: VecDeque::new(),
            last_sweep: None,
        })
    }

    pub fn with_defaults(catalog: TypeCatalog) -> Self {
        Self {
            catalog,
            config: LifecycleConfig::default(),
            phase: SessionPhase::Idle,
            history: VecDeque::new(),
            last_sweep: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// 迁移到 `to`；命中重置边界时执行清扫并返回结果
    ///
    /// 迁移到当前阶段为 no-op。
    pub fn transition(&mut self, to: SessionPhase) -> SessionResult<Option<SweepReport>> {
        let from = self.phase;
        if from == to {
            debug!(phase = %to, "transition to current phase ignored");
            return Ok(None);
        }
        if self.config.strict_transitions && !from.can_transition_to(to) {
            return Err(SessionError::InvalidTransition { from, to });
        }

        self.phase = to;
        let sweep = if self.config.is_reset_boundary(from, to) {
            Some(self.sweep())
        } else {
            None
        };
        info!(%from, %to, swept = sweep.is_some(), "session phase changed");

        self.record(TransitionRecord {
            from,
            to,
            at: Utc::now(),
            sweep,
        });
        Ok(sweep)
    }

    /// 无视当前阶段，立即执行一次全量清扫（保留配置中的事件类型）
    pub fn reset(&mut self) -> SweepReport {
        info!(phase = %self.phase, "forced reset requested");
        self.sweep()
    }

    /// 仅清空指定名称的总线
    pub fn clear_event(&self, name: &str) -> SessionResult<usize> {
        Ok(self.catalog.clear_named(name)?)
    }

    /// 迁移历史（由旧到新）
    pub fn history(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.history.iter()
    }

    pub fn last_sweep(&self) -> Option<SweepReport> {
        self.last_sweep
    }

    fn sweep(&mut self) -> SweepReport {
        let report = self.catalog.sweep_except(&self.config.retain);
        self.last_sweep = Some(report);
        report
    }

    fn record(&mut self, rec: TransitionRecord) {
        if self.config.history_limit == 0 {
            return;
        }
        while self.history.len() >= self.config.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(rec);
    }
}
