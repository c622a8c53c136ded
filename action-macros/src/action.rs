use proc_macro::TokenStream;
use quote::{ToTokens, quote};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Item, LitStr, Result, Token, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[action] 宏实现
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as ActionAttrConfig);
    let input = parse_macro_input!(item as Item);

    let (ident, generics) = match &input {
        Item::Struct(st) => (&st.ident, &st.generics),
        Item::Enum(en) => (&en.ident, &en.generics),
        other => {
            return syn::Error::new(other.span(), "#[action] only supports struct or enum")
                .to_compile_error()
                .into();
        }
    };

    let kind = match cfg.kind {
        Some(lit) => {
            if lit.value().trim().is_empty() {
                return syn::Error::new(lit.span(), "action kind must not be empty")
                    .to_compile_error()
                    .into();
            }
            lit
        }
        None => LitStr::new(&ident.to_string(), ident.span()),
    };

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let expanded = quote! {
        #input

        impl #impl_generics ::action_core::ActionKind for #ident #ty_generics #where_clause {
            const KIND: &'static str = #kind;
        }
    };

    TokenStream::from(expanded)
}

// -------- parsing --------

// 解析 action 宏键值参数：kind = "<name>"
struct ActionAttrConfig {
    kind: Option<LitStr>,
}

impl Parse for ActionAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut kind: Option<LitStr> = None;

        if input.is_empty() {
            return Ok(Self { kind });
        }

        let pairs: Punctuated<syn::ExprAssign, Token![,]> =
            Punctuated::<syn::ExprAssign, Token![,]>::parse_terminated(input)?;

        for assign in pairs.into_iter() {
            let key_ident = match *assign.left {
                syn::Expr::Path(p) if p.path.segments.len() == 1 => {
                    p.path.segments[0].ident.clone()
                }
                other => {
                    return Err(syn::Error::new(other.span(), "invalid attribute key"));
                }
            };
            match key_ident.to_string().as_str() {
                "kind" => {
                    if kind.is_some() {
                        return Err(syn::Error::new(
                            key_ident.span(),
                            "duplicate key 'kind' in attribute",
                        ));
                    }
                    let lit: LitStr = syn::parse2(assign.right.to_token_stream())?;
                    kind = Some(lit);
                }
                _ => {
                    return Err(syn::Error::new(
                        key_ident.span(),
                        "unknown key; expected 'kind'",
                    ));
                }
            }
        }

        Ok(Self { kind })
    }
}
