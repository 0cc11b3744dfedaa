//! 事件类型目录（TypeCatalog）
//!
//! 启动期发现：把所有已知的 `EventRecord` 类型（通过 `#[event_module]` 生成的
//! `descriptors()` 或手动 `record::<T>()` 收集）解析为各自总线的清理句柄，
//! 供生命周期协调器在环境重置时统一清扫。
//!
//! - 目录构建后只读；顺序不保证稳定，清扫结果与顺序无关；
//! - 无法解析的条目不会导致失败：记录 warn 日志并在清扫时跳过。
//!
use crate::error::{BusError, BusResult};
use crate::record::{EventDescriptor, EventRecord};
use crate::registry::{ErasedBus, EventRegistry};
use serde::Serialize;
use std::any::TypeId;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// 目录条目：(载荷类型, 总线句柄)
pub struct CatalogEntry {
    descriptor: EventDescriptor,
    handle: OnceLock<Arc<dyn ErasedBus>>,
}

impl CatalogEntry {
    pub fn descriptor(&self) -> &EventDescriptor {
        &self.descriptor
    }

    pub fn is_resolved(&self) -> bool {
        self.handle.get().is_some()
    }

    fn resolve(&self, registry: &EventRegistry) -> BusResult<Option<&Arc<dyn ErasedBus>>> {
        if let Some(handle) = self.handle.get() {
            return Ok(Some(handle));
        }
        let Some(handle) = self.descriptor.resolve(registry) else {
            return Ok(None);
        };
        if handle.event_name() != self.descriptor.name() {
            return Err(BusError::TypeMismatch {
                expected: self.descriptor.name(),
                found: handle.event_name(),
            });
        }
        Ok(Some(self.handle.get_or_init(|| handle)))
    }
}

/// 一次清扫的统计结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// 被清空的总线数量
    pub cleared: usize,
    /// 被释放的绑定数量
    pub released: usize,
    /// 按配置保留、未清空的总线数量
    pub retained: usize,
    /// 无法解析而跳过的条目数量
    pub skipped: usize,
}

impl SweepReport {
    fn merge(&mut self, other: SweepReport) {
        self.cleared += other.cleared;
        self.released += other.released;
        self.retained += other.retained;
        self.skipped += other.skipped;
    }
}

/// 事件类型目录
pub struct TypeCatalog {
    registry: EventRegistry,
    entries: Vec<CatalogEntry>,
}

impl TypeCatalog {
    /// 由描述符集合构建目录（按 `TypeId` 去重），并立即解析各条目
    pub fn discover<I>(registry: &EventRegistry, descriptors: I) -> Self
    where
        I: IntoIterator<Item = EventDescriptor>,
    {
        let mut seen = HashSet::<TypeId>::new();
        let mut entries = Vec::new();
        for descriptor in descriptors {
            if !seen.insert(descriptor.type_id()) {
                debug!(event = descriptor.name(), "duplicate descriptor ignored");
                continue;
            }
            entries.push(CatalogEntry {
                descriptor,
                handle: OnceLock::new(),
            });
        }

        let catalog = Self {
            registry: registry.clone(),
            entries,
        };
        let mut unresolved = 0usize;
        for entry in &catalog.entries {
            match entry.resolve(&catalog.registry) {
                Ok(Some(_)) => {}
                Ok(None) => {
                    unresolved += 1;
                    warn!(
                        event = entry.descriptor.name(),
                        "no bus for cataloged event yet; will retry at sweep"
                    );
                }
                Err(err) => {
                    unresolved += 1;
                    warn!(event = entry.descriptor.name(), error = %err, "catalog entry unresolvable");
                }
            }
        }
        info!(
            events = catalog.entries.len(),
            unresolved, "event catalog discovered"
        );
        catalog
    }

    /// 手动登记事件类型的构建器
    pub fn builder(registry: &EventRegistry) -> CatalogBuilder {
        CatalogBuilder {
            registry: registry.clone(),
            descriptors: Vec::new(),
        }
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains<T: EventRecord>(&self) -> bool {
        let id = TypeId::of::<T>();
        self.entries.iter().any(|e| e.descriptor.type_id() == id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.descriptor.name()).collect()
    }

    /// 清空目录中所有总线
    pub fn sweep(&self) -> SweepReport {
        self.sweep_except::<&str>(&[])
    }

    /// 清空目录中除 `retain` 所列名称外的所有总线
    ///
    /// `retain` 中不在目录内的名称只记录 warn 日志。
    pub fn sweep_except<S: AsRef<str>>(&self, retain: &[S]) -> SweepReport {
        for name in retain {
            if !self.contains_name(name.as_ref()) {
                warn!(event = name.as_ref(), "retained event is not cataloged");
            }
        }

        let mut report = SweepReport::default();
        for entry in &self.entries {
            let name = entry.descriptor.name();
            if retain.iter().any(|r| r.as_ref() == name) {
                report.retained += 1;
                continue;
            }
            report.merge(self.sweep_entry(entry));
        }
        info!(
            cleared = report.cleared,
            released = report.released,
            retained = report.retained,
            skipped = report.skipped,
            "event catalog swept"
        );
        report
    }

    /// 仅清空指定名称的总线，返回释放的绑定数量
    pub fn clear_named(&self, name: &str) -> BusResult<usize> {
        let entry = self
            .find(name)
            .ok_or_else(|| BusError::NotCataloged(name.to_string()))?;
        match entry.resolve(&self.registry)? {
            Some(handle) => Ok(handle.clear()),
            None => Ok(0),
        }
    }

    fn sweep_entry(&self, entry: &CatalogEntry) -> SweepReport {
        let name = entry.descriptor.name();
        match entry.resolve(&self.registry) {
            Ok(Some(handle)) => SweepReport {
                cleared: 1,
                released: handle.clear(),
                ..SweepReport::default()
            },
            Ok(None) => {
                warn!(event = name, "cannot resolve bus for cataloged event; skipped");
                SweepReport {
                    skipped: 1,
                    ..SweepReport::default()
                }
            }
            Err(err) => {
                warn!(event = name, error = %err, "cannot resolve bus for cataloged event; skipped");
                SweepReport {
                    skipped: 1,
                    ..SweepReport::default()
                }
            }
        }
    }

    fn find(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.descriptor.name() == name)
    }
}

/// `TypeCatalog` 构建器：逐个登记已知载荷类型
pub struct CatalogBuilder {
    registry: EventRegistry,
    descriptors: Vec<EventDescriptor>,
}

impl CatalogBuilder {
    pub fn record<T: EventRecord>(mut self) -> Self {
        self.descriptors.push(EventDescriptor::of::<T>());
        self
    }

    pub fn descriptor(mut self, descriptor: EventDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn descriptors<I>(mut self, descriptors: I) -> Self
    where
        I: IntoIterator<Item = EventDescriptor>,
    {
        self.descriptors.extend(descriptors);
        self
    }

    pub fn build(self) -> TypeCatalog {
        TypeCatalog::discover(&self.registry, self.descriptors)
    }
}
