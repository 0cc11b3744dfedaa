//! 按载荷类型划分的事件总线（Bus<T>）
//!
//! 每个载荷类型 `T` 在一个注册表中对应唯一一份共享状态：
//! - `active`：已注册绑定集合（按 `BindingId` 去重，无序）；
//! - `pending`：分发过程中被注销、待提交移除的绑定；
//! - `depth`：正在进行的 `raise` 层数（即 in-dispatch 标记）。
//!
//! `raise` 在开始时对 `active` 做快照后逐个调用，调用前再确认绑定仍然有效，
//! 因此分发途中被注销的绑定在本轮剩余部分不会再被调用；
//! 分发结束（包括处理器失败或 panic 展开）时由守卫统一提交待移除项。
//!
//! 仅支持单线程协作式使用：同一 `T` 的并发 `raise` 需由调用方串行化。
//! 投递顺序不作保证。
//!
use crate::binding::{Binding, BindingId};
use crate::error::{BusError, BusResult};
use crate::record::EventRecord;
use crate::registry::{ErasedBus, EventRegistry};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

struct BusState<T: EventRecord> {
    active: HashMap<BindingId, Binding<T>>,
    pending: HashSet<BindingId>,
    depth: usize,
}

pub(crate) struct BusShared<T: EventRecord> {
    state: Mutex<BusState<T>>,
}

impl<T: EventRecord> BusShared<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(BusState {
                active: HashMap::new(),
                pending: HashSet::new(),
                depth: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BusState<T>> {
        // 处理器从不在持锁期间执行
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release_all(&self) -> usize {
        let mut state = self.lock();
        let released = state.active.len();
        state.active.clear();
        state.pending.clear();
        released
    }
}

impl<T: EventRecord> ErasedBus for BusShared<T> {
    fn event_name(&self) -> &'static str {
        T::NAME
    }

    fn len(&self) -> usize {
        self.lock().active.len()
    }

    fn clear(&self) -> usize {
        let released = self.release_all();
        debug!(event = T::NAME, released, "bus cleared");
        released
    }
}

/// 结束一轮分发：无论正常返回、处理器失败还是 panic 展开都会执行
struct DispatchGuard<'a, T: EventRecord> {
    shared: &'a BusShared<T>,
}

impl<T: EventRecord> Drop for DispatchGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.depth = state.depth.saturating_sub(1);
        if state.depth == 0 && !state.pending.is_empty() {
            let BusState {
                active, pending, ..
            } = &mut *state;
            let removed = pending.len();
            for id in pending.drain() {
                active.remove(&id);
            }
            trace!(event = T::NAME, removed, "pending removals committed");
        }
    }
}

/// 事件总线句柄
///
/// 克隆代价很低，所有克隆共享同一份注册状态。
pub struct Bus<T: EventRecord> {
    shared: Arc<BusShared<T>>,
}

impl<T: EventRecord> Bus<T> {
    /// 进程级注册表中 `T` 对应的总线
    pub fn global() -> Self {
        EventRegistry::global().bus::<T>()
    }

    pub(crate) fn from_shared(shared: Arc<BusShared<T>>) -> Self {
        Self { shared }
    }

    pub(crate) fn erased(&self) -> Arc<dyn ErasedBus> {
        self.shared.clone()
    }

    /// 注册绑定；重复注册为 no-op
    ///
    /// 若该绑定正处于待移除状态，则撤销这次移除。
    pub fn register(&self, binding: &Binding<T>) {
        let mut state = self.shared.lock();
        let id = binding.id();
        let revived = state.pending.remove(&id);
        if state.active.contains_key(&id) && !revived {
            trace!(event = T::NAME, binding = %id, "binding already registered");
            return;
        }
        state.active.insert(id, binding.clone());
        debug!(event = T::NAME, binding = %id, revived, "binding registered");
    }

    /// 注销绑定；未注册的绑定直接忽略
    ///
    /// 分发进行中时仅记入待移除集合，本轮剩余部分不再调用该绑定。
    pub fn deregister(&self, binding: &Binding<T>) {
        let mut state = self.shared.lock();
        let id = binding.id();
        if !state.active.contains_key(&id) {
            trace!(event = T::NAME, binding = %id, "deregister ignored: not registered");
            return;
        }
        if state.depth > 0 {
            state.pending.insert(id);
            debug!(event = T::NAME, binding = %id, "binding deregistered (deferred)");
        } else {
            state.active.remove(&id);
            debug!(event = T::NAME, binding = %id, "binding deregistered");
        }
    }

    /// 同步地将载荷投递给所有有效绑定
    ///
    /// 对每个绑定先调用载荷链，再调用无参链。处理器返回错误时立即中止本轮，
    /// 尚未访问的绑定不会被调用，错误以 `BusError::HandlerFault` 返回。
    pub fn raise(&self, event: &T) -> BusResult<()> {
        let snapshot: Vec<Binding<T>> = {
            let mut state = self.shared.lock();
            state.depth += 1;
            state.active.values().cloned().collect()
        };
        let _guard = DispatchGuard {
            shared: &self.shared,
        };
        trace!(event = T::NAME, bindings = snapshot.len(), "raising event");

        for binding in &snapshot {
            if !self.is_live(binding.id()) {
                trace!(event = T::NAME, binding = %binding.id(), "skipping removed binding");
                continue;
            }
            binding
                .invoke(event)
                .map_err(|source| BusError::handler_fault(T::NAME, binding.id(), source))?;
        }
        Ok(())
    }

    /// 清空已注册与待移除集合；仅供生命周期协调器在环境重置时调用
    pub fn clear(&self) -> usize {
        ErasedBus::clear(&*self.shared)
    }

    pub fn contains(&self, binding: &Binding<T>) -> bool {
        self.is_live(binding.id())
    }

    /// 当前已注册（含待移除）的绑定数量
    pub fn len(&self) -> usize {
        self.shared.lock().active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_dispatching(&self) -> bool {
        self.shared.lock().depth > 0
    }

    pub fn pending_len(&self) -> usize {
        self.shared.lock().pending.len()
    }

    fn is_live(&self, id: BindingId) -> bool {
        let state = self.shared.lock();
        state.active.contains_key(&id) && !state.pending.contains(&id)
    }
}

impl<T: EventRecord> Clone for Bus<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: EventRecord> fmt::Debug for Bus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("Bus")
            .field("event", &T::NAME)
            .field("active", &state.active.len())
            .field("pending", &state.pending.len())
            .field("depth", &state.depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Ping;

    impl EventRecord for Ping {
        const NAME: &'static str = "ping";
    }

    fn counting(counter: &Arc<AtomicUsize>, step: usize) -> Binding<Ping> {
        let counter = counter.clone();
        Binding::new(move |_| {
            counter.fetch_add(step, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn register_is_idempotent() {
        let bus = EventRegistry::new().bus::<Ping>();
        let counter = Arc::new(AtomicUsize::new(0));
        let b = counting(&counter, 1);

        bus.register(&b);
        bus.register(&b);
        assert_eq!(bus.len(), 1);

        bus.raise(&Ping).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn double_register_single_deregister_removes() {
        let bus = EventRegistry::new().bus::<Ping>();
        let counter = Arc::new(AtomicUsize::new(0));
        let b = counting(&counter, 1);

        bus.register(&b);
        bus.register(&b);
        bus.deregister(&b);
        assert!(bus.is_empty());

        bus.raise(&Ping).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn deregister_unknown_is_noop() {
        let bus = EventRegistry::new().bus::<Ping>();
        let b = Binding::<Ping>::empty();
        bus.deregister(&b);
        bus.deregister(&b);
        assert!(bus.is_empty());
        assert_eq!(bus.pending_len(), 0);
    }

    #[test]
    fn both_chains_fire_once_per_raise() {
        let bus = EventRegistry::new().bus::<Ping>();
        let typed = Arc::new(AtomicUsize::new(0));
        let bare = Arc::new(AtomicUsize::new(0));
        let b = counting(&typed, 1);
        {
            let bare = bare.clone();
            b.add_callback(crate::binding::callback(move || {
                bare.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));
        }
        bus.register(&b);

        bus.raise(&Ping).unwrap();
        bus.raise(&Ping).unwrap();
        assert_eq!(typed.load(Ordering::SeqCst), 2);
        assert_eq!(bare.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn deregister_during_raise_skips_unvisited_binding() {
        let bus = EventRegistry::new().bus::<Ping>();
        let fired = Arc::new(Mutex::new(Vec::new()));

        // 两个绑定互相注销：无论遍历顺序如何，先被访问的一方会移除另一方
        let slot_a: Arc<Mutex<Option<Binding<Ping>>>> = Arc::new(Mutex::new(None));
        let slot_b: Arc<Mutex<Option<Binding<Ping>>>> = Arc::new(Mutex::new(None));
        let make = |name: &'static str, other: Arc<Mutex<Option<Binding<Ping>>>>| {
            let bus = bus.clone();
            let fired = fired.clone();
            Binding::<Ping>::new(move |_| {
                fired.lock().unwrap().push(name);
                if let Some(other) = other.lock().unwrap().as_ref() {
                    bus.deregister(other);
                }
                Ok(())
            })
        };
        let a = make("a", slot_b.clone());
        let b = make("b", slot_a.clone());
        *slot_a.lock().unwrap() = Some(a.clone());
        *slot_b.lock().unwrap() = Some(b.clone());
        bus.register(&a);
        bus.register(&b);

        bus.raise(&Ping).unwrap();
        assert_eq!(fired.lock().unwrap().len(), 1);
        assert_eq!(bus.len(), 1);
        assert_eq!(bus.pending_len(), 0);
        assert!(!bus.is_dispatching());
    }

    #[test]
    fn register_during_raise_waits_for_next_pass() {
        let bus = EventRegistry::new().bus::<Ping>();
        let late_hits = Arc::new(AtomicUsize::new(0));
        let late = counting(&late_hits, 1);
        let trigger = {
            let bus = bus.clone();
            let late = late.clone();
            Binding::<Ping>::new(move |_| {
                bus.register(&late);
                Ok(())
            })
        };
        bus.register(&trigger);

        bus.raise(&Ping).unwrap();
        assert_eq!(late_hits.load(Ordering::SeqCst), 0);
        bus.raise(&Ping).unwrap();
        assert_eq!(late_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reregister_cancels_pending_removal() {
        let bus = EventRegistry::new().bus::<Ping>();
        let counter = Arc::new(AtomicUsize::new(0));
        let target = counting(&counter, 100);
        let flip = {
            let bus = bus.clone();
            let target = target.clone();
            Binding::<Ping>::from_callback(move || {
                bus.deregister(&target);
                bus.register(&target);
                Ok(())
            })
        };
        bus.register(&flip);
        bus.register(&target);

        bus.raise(&Ping).unwrap();
        assert_eq!(bus.len(), 2);
        assert!(bus.contains(&target));
        bus.raise(&Ping).unwrap();
        assert!(counter.load(Ordering::SeqCst) >= 100);
    }

    #[test]
    fn handler_fault_aborts_and_settles_state() {
        let bus = EventRegistry::new().bus::<Ping>();
        let counter = Arc::new(AtomicUsize::new(0));
        let ok = counting(&counter, 1);
        let bad = Binding::<Ping>::new(|_| Err(anyhow::anyhow!("boom")));
        bus.register(&bad);

        let err = bus.raise(&Ping).unwrap_err();
        assert!(err.is_handler_fault());
        assert!(!bus.is_dispatching());

        bus.deregister(&bad);
        bus.register(&ok);
        bus.raise(&Ping).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panic_in_handler_still_commits_pending_removals() {
        let bus = EventRegistry::new().bus::<Ping>();
        let victim = Binding::<Ping>::empty();
        let bomber = {
            let bus = bus.clone();
            let victim = victim.clone();
            Binding::<Ping>::new(move |_| {
                bus.deregister(&victim);
                panic!("subscriber exploded");
            })
        };
        bus.register(&victim);
        bus.register(&bomber);

        let result = catch_unwind(AssertUnwindSafe(|| bus.raise(&Ping)));
        assert!(result.is_err());
        assert!(!bus.is_dispatching());
        assert_eq!(bus.pending_len(), 0);
        assert!(!bus.contains(&victim));
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn clear_releases_everything() {
        let bus = EventRegistry::new().bus::<Ping>();
        let counter = Arc::new(AtomicUsize::new(0));
        bus.register(&counting(&counter, 1));
        bus.register(&counting(&counter, 1));

        assert_eq!(bus.clear(), 2);
        bus.raise(&Ping).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        // 空总线上清理是安全的
        assert_eq!(bus.clear(), 0);
    }

    #[test]
    fn nested_raise_commits_after_outermost_pass() {
        let bus = EventRegistry::new().bus::<Ping>();
        let depth_seen = Arc::new(AtomicUsize::new(0));
        let victim = Binding::<Ping>::empty();
        let reentrant = {
            let bus = bus.clone();
            let victim = victim.clone();
            let depth_seen = depth_seen.clone();
            Binding::<Ping>::new(move |_| {
                if depth_seen.fetch_add(1, Ordering::SeqCst) == 0 {
                    bus.deregister(&victim);
                    bus.raise(&Ping)?;
                    // 内层结束后仍处于外层分发中，移除尚未提交
                    assert_eq!(bus.pending_len(), 1);
                }
                Ok(())
            })
        };
        bus.register(&reentrant);
        bus.register(&victim);

        bus.raise(&Ping).unwrap();
        assert_eq!(depth_seen.load(Ordering::SeqCst), 2);
        assert_eq!(bus.pending_len(), 0);
        assert!(!bus.contains(&victim));
    }
}
