//! 会话生命周期层（relay-session）
//!
//! 在环境重置边界（例如离开运行中的会话、回到空闲/编辑态）上，
//! 对启动期发现的全部事件总线执行清扫，防止已销毁订阅者的绑定延续到下一次会话。
//!
pub mod config;
pub mod coordinator;
pub mod error;
pub mod phase;

pub use config::{Boundary, LifecycleConfig};
pub use coordinator::{LifecycleCoordinator, TransitionRecord};
pub use error::{SessionError, SessionResult};
pub use phase::SessionPhase;
