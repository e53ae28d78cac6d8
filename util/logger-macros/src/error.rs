// Copyright (c) 2024 The Hierarchical TEE Authors

use proc_macro2::{Span, TokenStream};

/// An error raised while expanding a macro, reported at a source span.
pub struct DiagnosticError {
    span: Span,
    message: String,
    syn_error: Option<syn::Error>,
}

impl DiagnosticError {
    pub fn new_with_syn_error(span: Span, message: &str, syn_error: syn::Error) -> Self {
        Self {
            span,
            message: message.to_string(),
            syn_error: Some(syn_error),
        }
    }

    /// Turn the error into `compile_error!` invocations.
    pub fn into_compile_error(self) -> TokenStream {
        let mut tokens = syn::Error::new(self.span, self.message).to_compile_error();
        if let Some(err) = self.syn_error {
            tokens.extend(err.to_compile_error());
        }
        tokens
    }
}

pub type Result<T> = core::result::Result<T, DiagnosticError>;
