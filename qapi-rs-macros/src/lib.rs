use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, FnArg, ItemFn, LitStr, Pat};

/// Generates a `<fn>_entry()` constructor for a handler function.
///
/// # Usage
///
/// ```ignore
/// /// Orders placed in the last few days
/// #[qapi::api(name = "recentOrders", hint(days = "近几天"))]
/// pub fn recent_orders(days: i32) -> qapi::HandlerResult {
///     // ...
/// }
/// ```
///
/// This keeps the function as written and adds:
///
/// ```ignore
/// pub fn recent_orders_entry() -> qapi::HandlerEntry {
///     qapi::HandlerEntry::new(
///         "recentOrders",
///         "Orders placed in the last few days",
///         vec![qapi::ParameterSpec::new("days", <i32 as qapi::FromArg>::TYPE_TAG, "近几天")],
///         recent_orders,
///     )
/// }
/// ```
///
/// `name` defaults to the function name and `desc` to its doc comment.
#[proc_macro_attribute]
pub fn api(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = ApiArgs::default();
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            args.name = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("desc") {
            args.desc = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("hint") {
            meta.parse_nested_meta(|inner| {
                let param = inner
                    .path
                    .get_ident()
                    .ok_or_else(|| inner.error("expected a parameter name"))?
                    .to_string();
                let hint: LitStr = inner.value()?.parse()?;
                args.hints.push((param, hint));
                Ok(())
            })
        } else {
            Err(meta.error("unsupported api attribute, expected `name`, `desc` or `hint`"))
        }
    });
    parse_macro_input!(attr with parser);

    let func = parse_macro_input!(item as ItemFn);

    match expand(args, func) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct ApiArgs {
    name: Option<LitStr>,
    desc: Option<LitStr>,
    hints: Vec<(String, LitStr)>,
}

fn expand(args: ApiArgs, func: ItemFn) -> syn::Result<proc_macro2::TokenStream> {
    let vis = &func.vis;
    let fn_ident = &func.sig.ident;
    let entry_ident = format_ident!("{}_entry", fn_ident);

    let name = args
        .name
        .map(|lit| lit.value())
        .unwrap_or_else(|| fn_ident.to_string());
    let desc = args
        .desc
        .map(|lit| lit.value())
        .unwrap_or_else(|| doc_comment(&func.attrs));

    let mut params = Vec::new();
    let mut used_hints = Vec::new();
    for (index, input) in func.sig.inputs.iter().enumerate() {
        let typed = match input {
            FnArg::Typed(typed) => typed,
            FnArg::Receiver(recv) => {
                return Err(syn::Error::new_spanned(
                    recv,
                    "api handlers must be free functions",
                ))
            }
        };

        let param_name = param_name(&typed.pat).unwrap_or_else(|| format!("arg{}", index));
        let hint = args
            .hints
            .iter()
            .find(|(p, _)| *p == param_name)
            .map(|(p, lit)| {
                used_hints.push(p.clone());
                lit.value()
            })
            .unwrap_or_default();
        let ty = &typed.ty;

        params.push(quote! {
            ::qapi::ParameterSpec::new(#param_name, <#ty as ::qapi::FromArg>::TYPE_TAG, #hint)
        });
    }

    if let Some((_, lit)) = args.hints.iter().find(|(p, _)| !used_hints.contains(p)) {
        return Err(syn::Error::new_spanned(lit, "hint for an unknown parameter"));
    }

    Ok(quote! {
        #func

        #vis fn #entry_ident() -> ::qapi::HandlerEntry {
            ::qapi::HandlerEntry::new(
                #name,
                #desc,
                ::std::vec![#(#params),*],
                #fn_ident,
            )
        }
    })
}

/// `days` for `days: i32`, `tags` for `Rest(tags): Rest<String>`.
fn param_name(pat: &Pat) -> Option<String> {
    match pat {
        Pat::Ident(pat) => Some(pat.ident.to_string()),
        Pat::TupleStruct(ts) if ts.elems.len() == 1 => ts.elems.first().and_then(param_name),
        _ => None,
    }
}

/// Join the `///` lines on a function into one description.
fn doc_comment(attrs: &[syn::Attribute]) -> String {
    let mut lines = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        if let syn::Meta::NameValue(nv) = &attr.meta {
            if let syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(s),
                ..
            }) = &nv.value
            {
                let line = s.value();
                let line = line.trim();
                if !line.is_empty() {
                    lines.push(line.to_string());
                }
            }
        }
    }
    lines.join(" ")
}
