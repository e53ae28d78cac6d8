// Copyright (c) 2024 The Hierarchical TEE Authors

//! `#[test_with_logger]`: run a test function which takes a `Logger` argument.

extern crate proc_macro;

mod error;

use self::error::{DiagnosticError, Result};
use proc_macro::TokenStream;
use quote::quote;
use syn::parse_quote;

/// Wrap a `fn name(logger: Logger)` in a `#[test]` which creates a test
/// logger named after the test and installs it as the scoped global logger.
#[proc_macro_attribute]
pub fn test_with_logger(_attr: TokenStream, item: TokenStream) -> TokenStream {
    match test_with_logger_impl(item) {
        Ok(tokens) => tokens,
        Err(e) => e.into_compile_error().into(),
    }
}

fn test_with_logger_impl(item: TokenStream) -> Result<TokenStream> {
    let mut original_fn: syn::ItemFn = syn::parse(item).map_err(|e| {
        DiagnosticError::new_with_syn_error(
            proc_macro2::Span::call_site(),
            "test_with_logger may only be used on functions",
            e,
        )
    })?;

    let orig_ident = original_fn.sig.ident.clone();
    let orig_name = orig_ident.to_string();

    let new_name = format!("__wrapped_{}", orig_name);
    original_fn.sig.ident = syn::Ident::new(&new_name, orig_ident.span());
    let new_ident = original_fn.sig.ident.clone();

    let mut new_fn: syn::ItemFn = parse_quote! {
        #[test]
        fn #orig_ident() {
            let test_name = format!("{}::{}", module_path!(), #orig_name);
            let logger = ht_common::logger::create_test_logger(test_name);
            ht_common::logger::slog_scope::scope(
                &logger.clone(),
                || {
                    #new_ident(logger);
                }
            );
        }
    };
    new_fn.attrs.extend(original_fn.attrs.clone());
    original_fn.attrs = Vec::new();

    let out = quote! {
        #new_fn
        #original_fn
    };
    Ok(out.into())
}
