use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Ident, ItemFn, LitStr};

/// Marks a test function and installs a `tracing` subscriber that writes to
/// the test output capture.
///
/// Sync functions become `#[test]`; async functions become `#[tokio::test]`.
/// Async tests accept an optional flavor: `#[rxkit_macro::test(local)]` or
/// `#[rxkit_macro::test(shared)]`.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let mut input = parse_macro_input!(item as ItemFn);

  let is_async = input.sig.asyncness.is_some();

  let raw_args = proc_macro2::TokenStream::from(attr);
  let tokio_args = if raw_args.is_empty() {
    proc_macro2::TokenStream::new()
  } else {
    if !is_async {
      return TokenStream::from(
        syn::Error::new(
          raw_args.span(),
          "rxkit_macro::test flavor args are only supported for async tests. Use \
           #[rxkit_macro::test] for sync tests, or make the function async.",
        )
        .to_compile_error(),
      );
    }

    let flavor = if let Ok(ident) = syn::parse2::<Ident>(raw_args.clone()) {
      Some((ident.to_string(), ident.span()))
    } else if let Ok(lit) = syn::parse2::<LitStr>(raw_args.clone()) {
      Some((lit.value(), lit.span()))
    } else {
      None
    };

    match flavor {
      Some((name, _)) if name == "local" => quote!(flavor = "current_thread"),
      Some((name, _)) if name == "shared" => quote!(flavor = "multi_thread"),
      Some((_, span)) => {
        return TokenStream::from(
          syn::Error::new(span, "rxkit_macro::test only accepts `local` or `shared`")
            .to_compile_error(),
        );
      }
      None => {
        return TokenStream::from(
          syn::Error::new(
            raw_args.span(),
            "rxkit_macro::test only accepts: #[rxkit_macro::test], #[rxkit_macro::test(local)], \
             #[rxkit_macro::test(shared)], or string equivalents",
          )
          .to_compile_error(),
        );
      }
    }
  };

  let body = &input.block;
  let init_tracing: syn::Block = syn::parse_quote!({
    let _ = ::tracing_subscriber::fmt()
      .with_test_writer()
      .with_max_level(::tracing::Level::DEBUG)
      .try_init();
    #body
  });
  input.block = Box::new(init_tracing);

  let native_attr = if is_async { quote!(tokio::test(#tokio_args)) } else { quote!(test) };

  let expanded = quote! {
      #[#native_attr]
      #input
  };

  TokenStream::from(expanded)
}
