use quote::ToTokens;
use syn::{Attribute, Token};

// 提取 `#[derive(...)]` 中列出的全部派生路径
pub(crate) fn collect_derives(attrs: &[Attribute]) -> Vec<syn::Path> {
    let mut existing = Vec::new();
    for attr in attrs.iter() {
        if attr.path().is_ident("derive") {
            if let Ok(list) = attr.parse_args_with(
                syn::punctuated::Punctuated::<syn::Path, Token![,]>::parse_terminated,
            ) {
                existing.extend(list);
            }
        }
    }
    existing
}

// 归一化 derive 的 key，避免 EventRecord/relay_core::EventRecord 被视为不同派生
pub(crate) fn derive_key(p: &syn::Path) -> String {
    if let Some(last) = p.segments.last() {
        last.ident.to_string()
    } else {
        p.to_token_stream().to_string()
    }
}

// 属性列表中是否派生了指定名称
pub(crate) fn has_derive(attrs: &[Attribute], name: &str) -> bool {
    collect_derives(attrs).iter().any(|p| derive_key(p) == name)
}
