//! 会话阶段（SessionPhase）
//!
//! 描述宿主环境所处的生命周期阶段及其合法迁移：
//!
//! ```text
//! Idle ──► Loading ──► Running ◄──► Paused
//!  ▲          │           │            │
//!  └──────────┴───────────┴────────────┘
//! ```
//!
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// 空闲/编辑态，没有运行中的会话
    #[default]
    Idle,
    Loading,
    Running,
    Paused,
}

impl SessionPhase {
    pub const ALL: [SessionPhase; 4] = [
        SessionPhase::Idle,
        SessionPhase::Loading,
        SessionPhase::Running,
        SessionPhase::Paused,
    ];

    /// 是否允许从当前阶段迁移到 `to`（不含自迁移）
    pub fn can_transition_to(self, to: SessionPhase) -> bool {
        use SessionPhase::*;
        matches!(
            (self, to),
            (Idle, Loading)
                | (Loading, Running)
                | (Loading, Idle)
                | (Running, Paused)
                | (Paused, Running)
                | (Running, Idle)
                | (Paused, Idle)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Loading => "loading",
            SessionPhase::Running => "running",
            SessionPhase::Paused => "paused",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_graph() {
        use SessionPhase::*;
        assert!(Idle.can_transition_to(Loading));
        assert!(Running.can_transition_to(Idle));
        assert!(Paused.can_transition_to(Running));
        assert!(!Idle.can_transition_to(Running));
        assert!(!Loading.can_transition_to(Paused));
        for p in SessionPhase::ALL {
            assert!(!p.can_transition_to(p));
        }
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&SessionPhase::Running).unwrap();
        assert_eq!(json, "\"running\"");
        let back: SessionPhase = serde_json::from_str("\"paused\"").unwrap();
        assert_eq!(back, SessionPhase::Paused);
        assert_eq!(SessionPhase::default().to_string(), "idle");
    }
}
