use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse_macro_input, Data, DeriveInput, ImplItem, ImplItemFn, ItemImpl, Stmt,
    Variant, Visibility,
};

/// Procedural macro that completes error enums for use across the FFI boundary.
///
/// Applied to a plain enum with `#[error(..)]` attributes, it:
/// 1. Adds `#[derive(Debug, thiserror::Error, uniffi::Error)]` and `#[uniffi(flat_error)]`
/// 2. Appends a `Generic { message: String }` variant if the enum doesn't define one
/// 3. Implements `From<anyhow::Error>`, flattening the error chain into the message
///
/// # Usage
///
/// ```rust,ignore
/// #[basalt_error]
/// pub enum StoreError {
///     #[error("store is locked: {path}")]
///     Locked { path: String },
/// }
/// ```
#[proc_macro_attribute]
pub fn basalt_error(_args: TokenStream, input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(
            &input,
            "basalt_error can only be applied to enums",
        )
        .to_compile_error()
        .into();
    };

    let enum_name = &input.ident;
    let visibility = &input.vis;
    let generics = &input.generics;

    // Drop any derive/uniffi attributes the author wrote so ours don't conflict.
    let attrs: Vec<_> = input
        .attrs
        .iter()
        .filter(|attr| {
            !attr.path().is_ident("derive") && !attr.path().is_ident("uniffi")
        })
        .collect();

    let mut variants = data_enum.variants.clone();

    let has_generic = variants.iter().any(|variant| variant.ident == "Generic");
    if !has_generic {
        let generic_variant: Variant = syn::parse_quote! {
            /// A generic error that can wrap any anyhow error.
            #[error("Generic error: {message}")]
            Generic {
                /// The error message from the wrapped error.
                message: String
            }
        };
        variants.push(generic_variant);
    }

    let expanded = quote! {
        #[derive(Debug, thiserror::Error, uniffi::Error)]
        #[uniffi(flat_error)]
        #(#attrs)*
        #visibility enum #enum_name #generics {
            #variants
        }

        impl #generics From<anyhow::Error> for #enum_name #generics {
            fn from(err: anyhow::Error) -> Self {
                // Flatten the whole anyhow chain into one message so no
                // context is lost when the error crosses the FFI boundary.
                let mut message = err.to_string();
                let chain: Vec<String> = err.chain().skip(1).map(|e| e.to_string()).collect();
                if !chain.is_empty() {
                    message.push_str(" (caused by: ");
                    message.push_str(&chain.join(" -> "));
                    message.push(')');
                }
                Self::Generic { message }
            }
        }

        impl #generics #enum_name #generics {
            /// Convert an `anyhow::Result` to a `Result` with this error type.
            pub fn from_anyhow_result<T>(result: anyhow::Result<T>) -> Result<T, Self> {
                result.map_err(Self::from)
            }
        }
    };

    TokenStream::from(expanded)
}

/// Procedural macro that wraps `uniffi::export` and injects a logging context.
///
/// Every `pub fn` in the impl block gets a scoped
/// `crate::primitives::logger::LogContext` named after the type, so log lines
/// emitted inside it are prefixed with `[Basalt][TypeName]`. The attribute
/// arguments are forwarded to `#[uniffi::export]` unchanged.
///
/// # Usage
///
/// ```rust,ignore
/// #[basalt_export]
/// impl MigrationEngine {
///     pub fn run(&self) -> Result<MigrationRunReport, MigrationError> {
///         info!("prefixed with [Basalt][MigrationEngine]");
///         // ...
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn basalt_export(args: TokenStream, input: TokenStream) -> TokenStream {
    let input_impl = parse_macro_input!(input as ItemImpl);

    // The logging context is named after the implementing type.
    let type_name = match &*input_impl.self_ty {
        syn::Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map_or_else(|| "Unknown".to_string(), |seg| seg.ident.to_string()),
        _ => "Unknown".to_string(),
    };

    let new_items: Vec<ImplItem> = input_impl
        .items
        .iter()
        .map(|item| match item {
            ImplItem::Fn(method) if matches!(method.vis, Visibility::Public(_)) => {
                let mut new_method = method.clone();
                inject_logging_context(&mut new_method, &type_name);
                ImplItem::Fn(new_method)
            }
            other => other.clone(),
        })
        .collect();

    let new_impl = ItemImpl {
        items: new_items,
        ..input_impl
    };

    let args = proc_macro2::TokenStream::from(args);

    quote! {
        #[uniffi::export(#args)]
        #new_impl
    }
    .into()
}

/// Prepend the scoped logging context to a function body.
fn inject_logging_context(method: &mut ImplItemFn, type_name: &str) {
    let context_stmt: Stmt = syn::parse_quote! {
        let _basalt_logger_ctx = crate::primitives::logger::LogContext::new(#type_name);
    };
    method.block.stmts.insert(0, context_stmt);
}
