// Copyright 2025 The Pigweed Authors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy of
// the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations under
// the License.

// This proc macro crate is a private API for the `picolog` crate.
#![doc(hidden)]

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};
use syn::{parse_macro_input, Expr, ExprCast, Ident, Lit, LitStr, Token, Type, UnOp};

mod format;

// Everything below the build threshold is elided entirely: no metadata
// record, no code.  Mirrors the original command-line level define; the
// variable is read at macro expansion time.
const LEVEL_ENV_VAR: &str = "PICOLOG_LEVEL";

const LEVELS: &[(&str, u8)] = &[
    ("Error", 0),
    ("Warn", 1),
    ("Mile", 2),
    ("Info", 3),
    ("Trace", 4),
    ("Debug0", 5),
    ("Debug1", 6),
    ("Debug2", 7),
    ("Debug3", 8),
];

// Args parsed according to the pattern:
//   ($severity:ident, $format_string:literal $(, $args:expr)*)
struct LogArgs {
    severity: Ident,
    format: LitStr,
    args: Vec<Expr>,
}

impl Parse for LogArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let severity: Ident = input.parse()?;
        input.parse::<Token![,]>()?;
        let format: LitStr = input.parse()?;

        let mut args = Vec::new();
        while !input.is_empty() {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }
            args.push(input.parse()?);
        }

        Ok(Self {
            severity,
            format,
            args,
        })
    }
}

fn severity_level(severity: &Ident) -> syn::Result<u8> {
    let name = severity.to_string();
    LEVELS
        .iter()
        .find(|(level, _)| *level == name)
        .map(|(_, value)| *value)
        .ok_or_else(|| {
            syn::Error::new(
                severity.span(),
                "severity must be one of Error, Warn, Mile, Info, Trace, Debug0..Debug3",
            )
        })
}

fn threshold(span: proc_macro2::Span) -> syn::Result<u8> {
    let Ok(value) = std::env::var(LEVEL_ENV_VAR) else {
        // Default: keep everything.
        return Ok(8);
    };
    let lower = value.to_ascii_lowercase();
    LEVELS
        .iter()
        .find(|(level, _)| level.to_ascii_lowercase() == lower)
        .map(|(_, value)| *value)
        .ok_or_else(|| {
            syn::Error::new(
                span,
                format!("unrecognized {LEVEL_ENV_VAR} value `{value}`"),
            )
        })
}

// One classified call-site argument: the type tag interned into the
// metadata record and the `Argument` constructor evaluated at runtime.
struct ClassifiedArg {
    tag: &'static str,
    runtime: TokenStream2,
}

fn unsupported(expr: &Expr) -> syn::Error {
    syn::Error::new_spanned(
        expr,
        "log arguments need an explicit type of at most 4 bytes: \
         a suffixed literal (`42u8`), a cast (`x as u16`, `s as &str`), \
         or a bool/string literal",
    )
}

fn too_wide(expr: &Expr) -> syn::Error {
    syn::Error::new_spanned(
        expr,
        "log argument is wider than 4 bytes; narrow it explicitly (e.g. `x as u32`)",
    )
}

fn classify(expr: &Expr) -> syn::Result<ClassifiedArg> {
    match expr {
        // `$args:expr` fragments arrive wrapped in invisible groups.
        Expr::Group(group) => classify(&group.expr),
        Expr::Paren(paren) => classify(&paren.expr),
        Expr::Lit(lit) => classify_literal(&lit.lit, expr, false),
        Expr::Unary(unary) => {
            if let (UnOp::Neg(_), Expr::Lit(lit)) = (&unary.op, unary.expr.as_ref()) {
                classify_literal(&lit.lit, expr, true)
            } else {
                Err(unsupported(expr))
            }
        }
        Expr::Cast(cast) => classify_cast(cast, expr),
        _ => Err(unsupported(expr)),
    }
}

fn classify_literal(lit: &Lit, expr: &Expr, negated: bool) -> syn::Result<ClassifiedArg> {
    let arg = |tag, runtime| Ok(ClassifiedArg { tag, runtime });
    match lit {
        Lit::Str(_) if !negated => arg("Str", quote!(__picolog_crate::Argument::Str(#expr))),
        Lit::Bool(_) if !negated => arg("Bool", quote!(__picolog_crate::Argument::Bool(#expr))),
        Lit::Int(int) => match int.suffix() {
            "u8" if !negated => arg("U8", quote!(__picolog_crate::Argument::U8(#expr))),
            "u16" if !negated => arg("U16", quote!(__picolog_crate::Argument::U16(#expr))),
            "u32" if !negated => arg("U32", quote!(__picolog_crate::Argument::U32(#expr))),
            "i8" => arg("S8", quote!(__picolog_crate::Argument::S8(#expr))),
            "i16" => arg("S16", quote!(__picolog_crate::Argument::S16(#expr))),
            "i32" => arg("S32", quote!(__picolog_crate::Argument::S32(#expr))),
            "u64" | "i64" | "u128" | "i128" | "usize" | "isize" => Err(too_wide(expr)),
            "" => Err(syn::Error::new_spanned(
                expr,
                "suffix the literal with its type, e.g. `42u8`",
            )),
            _ => Err(unsupported(expr)),
        },
        // Doubles are narrowed at the call site, matching the f64 -> f32
        // entry of the type map.
        Lit::Float(_) => arg("F32", quote!(__picolog_crate::Argument::F32((#expr) as f32))),
        _ => Err(unsupported(expr)),
    }
}

fn classify_cast(cast: &ExprCast, expr: &Expr) -> syn::Result<ClassifiedArg> {
    let arg = |tag, runtime| Ok(ClassifiedArg { tag, runtime });
    match cast.ty.as_ref() {
        Type::Path(path) if path.qself.is_none() => {
            let Some(ident) = path.path.get_ident() else {
                return Err(unsupported(expr));
            };
            match ident.to_string().as_str() {
                "u8" => arg("U8", quote!(__picolog_crate::Argument::U8(#expr))),
                "i8" => arg("S8", quote!(__picolog_crate::Argument::S8(#expr))),
                "u16" => arg("U16", quote!(__picolog_crate::Argument::U16(#expr))),
                "i16" => arg("S16", quote!(__picolog_crate::Argument::S16(#expr))),
                "u32" => arg("U32", quote!(__picolog_crate::Argument::U32(#expr))),
                "i32" => arg("S32", quote!(__picolog_crate::Argument::S32(#expr))),
                "f32" => arg("F32", quote!(__picolog_crate::Argument::F32(#expr))),
                "f64" => arg("F32", quote!(__picolog_crate::Argument::F32((#expr) as f32))),
                "u64" | "i64" | "u128" | "i128" | "usize" | "isize" => Err(too_wide(expr)),
                _ => Err(unsupported(expr)),
            }
        }
        Type::Reference(reference) => match reference.elem.as_ref() {
            Type::Path(elem) if elem.path.is_ident("str") => {
                arg("Str", quote!(__picolog_crate::Argument::Str(#expr)))
            }
            _ => Err(unsupported(expr)),
        },
        Type::Ptr(_) => arg(
            "Ptr16",
            quote!(__picolog_crate::Argument::Ptr16((#expr) as usize as u16)),
        ),
        _ => Err(unsupported(expr)),
    }
}

// Generates the interned metadata record and evaluates to its identifier.
// The record lands in the dedicated metadata section, 256-byte aligned, so
// the identifier is a pure address derivation at runtime.
fn site_record(severity: &Ident, typecode: &TokenStream2, format: &LitStr) -> TokenStream2 {
    quote! {
        {
            // Use an inner scope to avoid identifier collision.  Name
            // mangling disambiguates these in the symbol table.
            #[cfg_attr(target_os = "macos", link_section = "__DATA,__picolog")]
            #[cfg_attr(not(target_os = "macos"), link_section = "picolog_sites")]
            #[used]
            static _PICOLOG_SITE_ENTRY: __picolog_crate::CallSite =
                __picolog_crate::CallSite::new(
                    __picolog_crate::Severity::#severity,
                    line!(),
                    #typecode,
                    file!(),
                    #format,
                );

            __picolog_crate::site_id(&_PICOLOG_SITE_ENTRY)
        }
    }
}

fn expand(input: LogArgs) -> syn::Result<TokenStream2> {
    let level = severity_level(&input.severity)?;
    if level > threshold(input.severity.span())? {
        // Elided call site.  Touch the alias so the wrapper's
        // `use $crate::__private as __picolog_crate;` stays used.
        return Ok(quote! {{ let _ = __picolog_crate::MAX_ARGS; }});
    }

    let placeholders = format::count_placeholders(&input.format.value())
        .map_err(|message| syn::Error::new(input.format.span(), message))?;
    // Formats with no placeholders may still carry arguments (the host
    // appends them); otherwise the arity must match.
    if placeholders != 0 && placeholders != input.args.len() {
        return Err(syn::Error::new(
            input.format.span(),
            format!(
                "format string expects {placeholders} argument(s), got {}",
                input.args.len()
            ),
        ));
    }

    let classified = input
        .args
        .iter()
        .map(classify)
        .collect::<syn::Result<Vec<_>>>()?;

    let typecode = if classified.is_empty() {
        quote!(0u32)
    } else {
        let parts = classified.iter().enumerate().map(|(index, arg)| {
            let tag = format_ident!("{}", arg.tag);
            quote!(__picolog_crate::TypeTag::#tag.at(#index))
        });
        quote!(#(#parts)|*)
    };

    let site = site_record(&input.severity, &typecode, &input.format);
    let runtime_args = classified.iter().map(|arg| &arg.runtime);
    let arg_count = input.args.len();
    let count_guard = if arg_count > 0 {
        quote! {
            const _: () = assert!(
                #arg_count <= __picolog_crate::MAX_ARGS,
                "too many log arguments for the configured id width",
            );
        }
    } else {
        TokenStream2::new()
    };

    Ok(quote! {
        {
            #count_guard
            __picolog_crate::dispatch(#site, &[#(#runtime_args),*]);
        }
    })
}

// Documented in `picolog::log`.
#[proc_macro]
pub fn _log(tokens: TokenStream) -> TokenStream {
    let input = parse_macro_input!(tokens as LogArgs);

    match expand(input) {
        Ok(token_stream) => token_stream.into(),
        Err(e) => e.to_compile_error().into(),
    }
}
