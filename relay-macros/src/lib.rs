use proc_macro::TokenStream;

mod derive_utils;
mod event_module;
mod event_record;
mod utils;

/// 事件记录派生宏
/// - 为目标类型实现 `::relay_core::record::EventRecord`
/// - 支持：`#[event_record(name = "...")]` 覆写事件类型名（默认取类型名）
#[proc_macro_derive(EventRecord, attributes(event_record))]
pub fn derive_event_record(input: TokenStream) -> TokenStream {
    event_record::expand(input)
}

/// 事件模块宏（编译期发现）
/// - 收集内联模块中所有派生了 `EventRecord` 的类型
/// - 生成 `pub fn descriptors() -> Vec<::relay_core::record::EventDescriptor>`
#[proc_macro_attribute]
pub fn event_module(attr: TokenStream, item: TokenStream) -> TokenStream {
    event_module::expand(attr, item)
}
