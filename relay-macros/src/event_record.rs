use crate::utils::parse_name_attr;
use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, GenericParam, parse_macro_input, parse_quote};

/// #[derive(EventRecord)] 宏实现
/// - 为目标类型实现 `::relay_core::record::EventRecord`
/// - `NAME` 默认取类型名，可用 `#[event_record(name = "...")]` 覆写
/// - 泛型类型参数自动追加 `'static` 约束
pub(crate) fn expand(input: TokenStream) -> TokenStream {
    let mut input = parse_macro_input!(input as DeriveInput);

    let name = match parse_name_attr(&input.attrs, "event_record") {
        Ok(Some(lit)) => lit,
        Ok(None) => syn::LitStr::new(&input.ident.to_string(), input.ident.span()),
        Err(err) => return err.to_compile_error().into(),
    };

    if name.value().trim().is_empty() {
        return syn::Error::new(name.span(), "event name must not be empty")
            .to_compile_error()
            .into();
    }

    for param in input.generics.params.iter_mut() {
        if let GenericParam::Type(ty) = param {
            ty.bounds.push(parse_quote!('static));
        }
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let out = quote! {
        impl #impl_generics ::relay_core::record::EventRecord for #ident #ty_generics #where_clause {
            const NAME: &'static str = #name;
        }
    };

    TokenStream::from(out)
}
