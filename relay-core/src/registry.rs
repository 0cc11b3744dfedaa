//! 事件注册表（EventRegistry）
//!
//! 以载荷类型的 `TypeId` 为键，保存各类型总线的类型擦除句柄：
//! - `global()`：进程级单例，首次访问时创建；
//! - `new()`：独立实例，便于测试或嵌入式宿主隔离状态；
//! - 总线在首次使用时按需创建，此后在注册表生命周期内一直存在，
//!   只会被显式的 `clear` 清空，不会被移除。
//!
use crate::bus::{Bus, BusShared};
use crate::error::{BusError, BusResult};
use crate::record::EventRecord;
use dashmap::DashMap;
use std::any::{Any, TypeId, type_name};
use std::sync::{Arc, OnceLock};

/// 类型擦除后的总线视图，供目录清扫与管理端使用
pub trait ErasedBus: Send + Sync {
    fn event_name(&self) -> &'static str;
    /// 当前已注册的绑定数量
    fn len(&self) -> usize;
    /// 清空该类型总线，返回释放的绑定数量
    fn clear(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone)]
struct RegistrySlot {
    typed: Arc<dyn Any + Send + Sync>,
    erased: Arc<dyn ErasedBus>,
    type_name: &'static str,
}

impl RegistrySlot {
    fn new<T: EventRecord>() -> Self {
        let shared = Arc::new(BusShared::<T>::new());
        Self {
            typed: shared.clone(),
            erased: shared,
            type_name: type_name::<T>(),
        }
    }
}

/// 事件注册表
///
/// 克隆得到的是同一注册表的句柄。
#[derive(Clone, Default)]
pub struct EventRegistry {
    slots: Arc<DashMap<TypeId, RegistrySlot>>,
}

static GLOBAL: OnceLock<EventRegistry> = OnceLock::new();

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 进程级注册表
    pub fn global() -> &'static EventRegistry {
        GLOBAL.get_or_init(EventRegistry::new)
    }

    /// 获取 `T` 对应的总线，不存在时创建
    pub fn bus<T: EventRecord>(&self) -> Bus<T> {
        // 槽位只在此处以 `TypeId::of::<T>()` 为键、用 `BusShared<T>` 创建，还原不会失败
        match self.try_bus::<T>() {
            Ok(bus) => bus,
            Err(err) => unreachable!("registry slot corrupted: {err}"),
        }
    }

    /// 获取 `T` 对应的总线，并显式报告类型还原失败
    pub fn try_bus<T: EventRecord>(&self) -> BusResult<Bus<T>> {
        let slot = self
            .slots
            .entry(TypeId::of::<T>())
            .or_insert_with(RegistrySlot::new::<T>)
            .clone();

        slot.typed
            .downcast::<BusShared<T>>()
            .map(Bus::from_shared)
            .map_err(|_| BusError::TypeMismatch {
                expected: type_name::<T>(),
                found: slot.type_name,
            })
    }

    /// 按 `TypeId` 查找已存在的总线（不会创建）
    pub fn erased(&self, type_id: TypeId) -> Option<Arc<dyn ErasedBus>> {
        self.slots.get(&type_id).map(|slot| slot.erased.clone())
    }

    pub fn contains<T: EventRecord>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<T>())
    }

    /// 已创建总线的事件类型名列表（只读视图，顺序不保证）
    pub fn registered_events(&self) -> Vec<&'static str> {
        self.slots.iter().map(|e| e.value().erased.event_name()).collect()
    }

    /// 已创建的总线数量
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
