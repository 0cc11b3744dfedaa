use crate::derive_utils::has_derive;
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Ident, Item, ItemMod, parse_macro_input};

const GENERATED_FN: &str = "descriptors";

/// #[event_module] 宏实现
/// - 仅支持内联模块：`mod events { ... }`
/// - 扫描模块内直接声明、且派生了 `EventRecord` 的非泛型 struct/enum
/// - 同样标注了 `#[event_module]` 的内联子模块会被级联收集
/// - 在模块内追加 `pub fn descriptors() -> Vec<EventDescriptor>`
///
/// 泛型载荷无法在编译期枚举具体实例，需通过 `TypeCatalog::builder().record::<T>()` 手动登记。
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(
            proc_macro2::TokenStream::from(attr).span(),
            "#[event_module] takes no arguments",
        )
        .to_compile_error()
        .into();
    }

    let mut module = parse_macro_input!(item as ItemMod);
    let module_span = module.span();

    let Some((_, items)) = module.content.as_mut() else {
        return syn::Error::new(
            module_span,
            "#[event_module] requires an inline module, e.g., mod events { ... }",
        )
        .to_compile_error()
        .into();
    };

    let mut records: Vec<Ident> = Vec::new();
    let mut nested: Vec<Ident> = Vec::new();

    for it in items.iter() {
        match it {
            Item::Struct(s) if has_derive(&s.attrs, "EventRecord") => {
                if s.generics.params.is_empty() {
                    records.push(s.ident.clone());
                }
            }
            Item::Enum(e) if has_derive(&e.attrs, "EventRecord") => {
                if e.generics.params.is_empty() {
                    records.push(e.ident.clone());
                }
            }
            Item::Mod(m) if m.content.is_some() && is_event_module(m) => {
                nested.push(m.ident.clone());
            }
            Item::Fn(f) if f.sig.ident == GENERATED_FN => {
                return syn::Error::new(
                    f.sig.ident.span(),
                    "#[event_module] generates `descriptors()`; rename this function",
                )
                .to_compile_error()
                .into();
            }
            _ => {}
        }
    }

    let generated: Item = syn::parse_quote! {
        /// 本模块内全部 `EventRecord` 类型的描述符（由 `#[event_module]` 生成）
        pub fn descriptors() -> ::std::vec::Vec<::relay_core::record::EventDescriptor> {
            #[allow(unused_mut)]
            let mut out = ::std::vec![
                #( ::relay_core::record::EventDescriptor::of::<#records>() ),*
            ];
            #( out.extend(self::#nested::descriptors()); )*
            out
        }
    };
    items.push(generated);

    TokenStream::from(quote! { #module })
}

// 子模块是否标注了 #[event_module]（允许带路径前缀）
fn is_event_module(m: &ItemMod) -> bool {
    m.attrs.iter().any(|a| {
        a.path()
            .segments
            .last()
            .map(|s| s.ident == "event_module")
            .unwrap_or(false)
    })
}
