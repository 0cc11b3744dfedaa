use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Attribute, Expr, Ident, Result, Token, parse::Parse, parse::ParseStream};

struct NameKv {
    key: Ident,
    #[allow(dead_code)]
    eq: Token![=],
    value: Expr,
}

impl Parse for NameKv {
    fn parse(input: ParseStream) -> Result<Self> {
        Ok(Self {
            key: input.parse()?,
            eq: input.parse()?,
            value: input.parse()?,
        })
    }
}

/// 解析形如 `#[<attr_name>(name = "...")]` 的属性
/// - 未出现该属性时返回 `Ok(None)`
/// - 重复的 `name`、未知的键或非字符串字面量均报错
pub(crate) fn parse_name_attr(attrs: &[Attribute], attr_name: &str) -> Result<Option<syn::LitStr>> {
    let mut name: Option<syn::LitStr> = None;

    for attr in attrs.iter().filter(|a| a.path().is_ident(attr_name)) {
        let pairs: Punctuated<NameKv, Token![,]> =
            attr.parse_args_with(Punctuated::<NameKv, Token![,]>::parse_terminated)?;

        for kv in pairs {
            match kv.key.to_string().as_str() {
                "name" => {
                    if name.is_some() {
                        return Err(syn::Error::new(
                            kv.key.span(),
                            "duplicate key 'name' in attribute",
                        ));
                    }
                    let lit = match kv.value {
                        Expr::Lit(syn::ExprLit {
                            lit: syn::Lit::Str(lit),
                            ..
                        }) => lit,
                        other => {
                            return Err(syn::Error::new(
                                other.span(),
                                "expected string literal for 'name'",
                            ));
                        }
                    };
                    name = Some(lit);
                }
                _ => {
                    return Err(syn::Error::new(
                        kv.key.span(),
                        "unknown key; expected 'name'",
                    ));
                }
            }
        }
    }

    Ok(name)
}
