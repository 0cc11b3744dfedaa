//! 事件记录（EventRecord）契约与类型描述符
//!
//! - `EventRecord`：无成员的标记 trait，只有显式标注的类型才能作为载荷流经总线；
//! - `EventDescriptor`：启动期发现（discovery）产出的类型描述，供目录（`TypeCatalog`）
//!   解析出对应总线的清理句柄。
//!
use crate::registry::{ErasedBus, EventRegistry};
use std::any::{TypeId, type_name};
use std::fmt;
use std::sync::Arc;

/// 事件载荷契约
///
/// 通常通过 `#[derive(EventRecord)]` 实现；`NAME` 默认取类型名，
/// 可用 `#[event_record(name = "...")]` 覆写。
pub trait EventRecord: 'static {
    /// 稳定的事件类型名（用于日志、配置与目录过滤）
    const NAME: &'static str;
}

type Resolver = fn(&EventRegistry) -> Arc<dyn ErasedBus>;

/// 事件类型描述符
#[derive(Clone, Copy)]
pub struct EventDescriptor {
    name: &'static str,
    type_id: TypeId,
    type_name: &'static str,
    resolver: Option<Resolver>,
}

impl EventDescriptor {
    /// 由具体载荷类型构造；解析时按需在注册表中创建该类型的总线
    pub fn of<T: EventRecord>() -> Self {
        Self {
            name: T::NAME,
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            resolver: Some(resolve_bus::<T>),
        }
    }

    /// 仅凭名称与 `TypeId` 构造（例如来自插件清单）
    ///
    /// 这类描述符无法自行创建总线，只能解析注册表中已存在的总线。
    pub fn dynamic(name: &'static str, type_id: TypeId) -> Self {
        Self {
            name,
            type_id,
            type_name: name,
            resolver: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is_dynamic(&self) -> bool {
        self.resolver.is_none()
    }

    pub(crate) fn resolve(&self, registry: &EventRegistry) -> Option<Arc<dyn ErasedBus>> {
        match self.resolver {
            Some(resolve) => Some(resolve(registry)),
            None => registry.erased(self.type_id),
        }
    }
}

impl fmt::Debug for EventDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDescriptor")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("dynamic", &self.is_dynamic())
            .finish()
    }
}

impl PartialEq for EventDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for EventDescriptor {}

fn resolve_bus<T: EventRecord>(registry: &EventRegistry) -> Arc<dyn ErasedBus> {
    registry.bus::<T>().erased()
}
