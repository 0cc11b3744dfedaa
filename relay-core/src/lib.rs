//! 进程内按类型索引的事件总线（relay-core）
//!
//! 用于解耦彼此无直接引用的子系统（战斗、相机、拾取、音频等）：
//! - 载荷契约（`record`）：只有实现 `EventRecord` 的类型才能作为事件；
//! - 订阅绑定（`binding`）：订阅者持有的两条处理链，按身份注册/注销；
//! - 事件总线（`bus`）：每个载荷类型一份注册状态，支持分发途中安全注销；
//! - 注册表（`registry`）：以 `TypeId` 为键的进程级单例，类型擦除保存各总线；
//! - 目录（`catalog`）：启动期发现所有事件类型，供环境重置时统一清扫。
//!
//! 典型用法：
//! 1. 用 `#[derive(EventRecord)]` 标注载荷类型，并在 `#[event_module]` 模块中集中声明；
//! 2. 启动时以 `TypeCatalog::discover` 构建目录；
//! 3. 订阅者创建 `Binding` 并 `register`，拆除时 `deregister`；
//! 4. 生产者调用 `Bus::<T>::global().raise(&event)`；
//! 5. 会话结束时由生命周期协调器调用 `TypeCatalog::sweep`。
//!
//! ```rust
//! use relay_core::{Binding, Bus, EventRecord, EventRegistry};
//!
//! #[derive(EventRecord)]
//! struct CoinPicked {
//!     value: u32,
//! }
//!
//! let registry = EventRegistry::new();
//! let bus = registry.bus::<CoinPicked>();
//! let binding = Binding::new(|e: &CoinPicked| {
//!     assert_eq!(e.value, 5);
//!     Ok(())
//! });
//! bus.register(&binding);
//! bus.raise(&CoinPicked { value: 5 }).unwrap();
//! bus.deregister(&binding);
//! ```
//!
pub mod binding;
pub mod bus;
pub mod catalog;
pub mod error;
pub mod record;
pub mod registry;

pub use binding::{Binding, BindingId, Callback, Handler, callback, handler};
pub use bus::Bus;
pub use catalog::{CatalogBuilder, CatalogEntry, SweepReport, TypeCatalog};
pub use error::{BusError, BusResult};
pub use record::{EventDescriptor, EventRecord};
pub use registry::{ErasedBus, EventRegistry};

#[cfg(feature = "derive")]
pub use relay_macros::{EventRecord, event_module};

// 允许在本 crate 内部通过 ::relay_core 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::relay_core 路径。
extern crate self as relay_core;
