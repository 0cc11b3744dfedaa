//! 订阅绑定（Binding）
//!
//! 每个订阅者持有一个 `Binding`，作为注册/注销的最小单元：
//! - 两条可组合的处理链：携带载荷的 `Handler<T>` 与无参的 `Callback`；
//! - 两条链默认都为空（即 no-op），任何时候调用都是安全的；
//! - 按身份（`BindingId`）判等，而非按处理器内容判等；
//! - 处理链只对所属总线可见（`pub(crate)` 调用入口）。
//!
use crate::record::EventRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// 携带载荷的处理器
pub type Handler<T> = Arc<dyn Fn(&T) -> anyhow::Result<()> + Send + Sync>;

/// 无参处理器
pub type Callback = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// 将闭包包装为 `Handler<T>`；保留返回值即可在之后按引用身份移除
pub fn handler<T, F>(f: F) -> Handler<T>
where
    T: EventRecord,
    F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// 将闭包包装为 `Callback`
pub fn callback<F>(f: F) -> Callback
where
    F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// 绑定标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BindingId(Uuid);

impl BindingId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Chains<T> {
    typed: Vec<Handler<T>>,
    bare: Vec<Callback>,
}

impl<T> Default for Chains<T> {
    fn default() -> Self {
        Self {
            typed: Vec::new(),
            bare: Vec::new(),
        }
    }
}

struct BindingInner<T> {
    id: BindingId,
    chains: Mutex<Chains<T>>,
}

/// 订阅绑定
///
/// `clone` 得到的是同一个绑定的另一个句柄（共享身份与处理链）。
pub struct Binding<T: EventRecord> {
    inner: Arc<BindingInner<T>>,
}

impl<T: EventRecord> Binding<T> {
    /// 创建两条链都为空的绑定
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(BindingInner {
                id: BindingId::new(),
                chains: Mutex::new(Chains::default()),
            }),
        }
    }

    /// 由携带载荷的闭包创建
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::from_handler(Arc::new(f))
    }

    /// 由无参闭包创建
    pub fn from_callback<F>(f: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let binding = Self::empty();
        binding.add_callback(Arc::new(f));
        binding
    }

    /// 由已包装的处理器创建（便于之后按引用移除）
    pub fn from_handler(handler: Handler<T>) -> Self {
        let binding = Self::empty();
        binding.add_handler(handler);
        binding
    }

    pub fn id(&self) -> BindingId {
        self.inner.id
    }

    /// 追加一个载荷处理器（按插入顺序调用）
    pub fn add_handler(&self, handler: Handler<T>) {
        self.chains().typed.push(handler);
    }

    /// 移除第一个引用身份相同的载荷处理器；不存在时返回 `false`
    pub fn remove_handler(&self, handler: &Handler<T>) -> bool {
        let mut chains = self.chains();
        match chains.typed.iter().position(|h| Arc::ptr_eq(h, handler)) {
            Some(idx) => {
                chains.typed.remove(idx);
                true
            }
            None => false,
        }
    }

    /// 追加一个无参处理器
    pub fn add_callback(&self, callback: Callback) {
        self.chains().bare.push(callback);
    }

    /// 移除第一个引用身份相同的无参处理器；不存在时返回 `false`
    pub fn remove_callback(&self, callback: &Callback) -> bool {
        let mut chains = self.chains();
        match chains.bare.iter().position(|c| Arc::ptr_eq(c, callback)) {
            Some(idx) => {
                chains.bare.remove(idx);
                true
            }
            None => false,
        }
    }

    /// 两条链中处理器的数量 `(typed, bare)`
    pub fn chain_len(&self) -> (usize, usize) {
        let chains = self.chains();
        (chains.typed.len(), chains.bare.len())
    }

    /// 先调用载荷链，再调用无参链；任一处理器失败即返回
    ///
    /// 调用前对两条链做快照，处理器可在调用期间修改自身绑定的链，
    /// 修改从下一次调用起生效。
    pub(crate) fn invoke(&self, event: &T) -> anyhow::Result<()> {
        let (typed, bare) = {
            let chains = self.chains();
            (chains.typed.clone(), chains.bare.clone())
        };
        for h in &typed {
            h(event)?;
        }
        for c in &bare {
            c()?;
        }
        Ok(())
    }

    fn chains(&self) -> MutexGuard<'_, Chains<T>> {
        // 处理器从不在持锁期间执行，锁中毒不会留下半更新状态
        self.inner
            .chains
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: EventRecord> Default for Binding<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: EventRecord> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: EventRecord> PartialEq for Binding<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<T: EventRecord> Eq for Binding<T> {}

impl<T: EventRecord> Hash for Binding<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl<T: EventRecord> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (typed, bare) = self.chain_len();
        f.debug_struct("Binding")
            .field("event", &T::NAME)
            .field("id", &self.inner.id)
            .field("typed", &typed)
            .field("bare", &bare)
            .finish()
    }
}
