//! Client-binding synthesis
//!
//! Deterministically maps a validated contract to a generated binding model,
//! its structural manifest, and the Rust tokens realizing it:
//!
//! - per push method: a callback-slot field, a dispatch thunk, and a
//!   wire-name registration entry;
//! - per invoke method: a typed wrapper serializing arguments and delegating
//!   to the relay client's invoke primitive;
//! - per contract: a registration helper joining the base uri with the
//!   bridge's uri segment, applying the default reconnect backoff only when
//!   the caller supplied none, and registering under a configurable lifetime.
//!
//! Synthesis is total over its validated input; there is no error path.

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use crate::ast::{ParamSpec, ReturnKind, TypeRef};
use crate::runtime::Lifetime;

use super::manifest::{BindingManifest, MethodDescriptor};
use super::validate::ValidatedContract;

/// Generated surface for one push method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushBinding {
    /// Name the method is registered under on the wire.
    pub wire_name: String,
    /// Callback-slot field on the binding struct.
    pub callback_field: String,
    /// Public setter installing a callback into the slot.
    pub setter: String,
    /// Internal thunk invoking the slot if set, else resolving immediately.
    pub thunk: String,
    pub descriptor: MethodDescriptor,
}

/// Generated surface for one invoke method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeBinding {
    pub wire_name: String,
    /// Typed wrapper method delegating to the invoke primitive.
    pub wrapper: String,
    pub descriptor: MethodDescriptor,
}

/// Generated registration helper for one contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationHelper {
    pub name: String,
    pub route: String,
    /// Lifetime the binding is registered under when the caller does not
    /// choose one.
    pub default_lifetime: Lifetime,
}

/// The generated client-binding description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientBinding {
    pub name: String,
    pub route: String,
    /// Doc line derived from the bridge's friendly name, when present.
    pub doc: Option<String>,
    pub push: Vec<PushBinding>,
    pub invoke: Vec<InvokeBinding>,
    pub registration: RegistrationHelper,
}

/// Complete synthesis output for one contract: model, manifest, tokens.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub binding: ClientBinding,
    pub manifest: BindingManifest,
    pub tokens: TokenStream,
}

/// Synthesize the client binding for a validated contract.
#[must_use]
pub fn synthesize(contract: &ValidatedContract) -> Synthesis {
    let binding = build_model(contract);
    let manifest = BindingManifest::from_contract(contract, binding.name.clone());
    let tokens = render(&binding);
    Synthesis {
        binding,
        manifest,
        tokens,
    }
}

fn build_model(contract: &ValidatedContract) -> ClientBinding {
    let name = format!("{}Client", contract.decl.id);

    let push = contract
        .push
        .iter()
        .map(|method| {
            let snake = snake_case(&method.sig.name);
            PushBinding {
                wire_name: method.sig.name.clone(),
                callback_field: format!("on_{snake}"),
                setter: format!("set_{snake}"),
                thunk: format!("dispatch_{snake}"),
                descriptor: MethodDescriptor {
                    name: method.sig.name.clone(),
                    params: method.sig.params.clone(),
                    returns: method.sig.returns.clone(),
                },
            }
        })
        .collect();

    let invoke = contract
        .invoke
        .iter()
        .map(|method| InvokeBinding {
            wire_name: method.sig.name.clone(),
            wrapper: snake_case(&method.sig.name),
            descriptor: MethodDescriptor {
                name: method.sig.name.clone(),
                params: method.sig.params.clone(),
                returns: method.sig.returns.clone(),
            },
        })
        .collect();

    ClientBinding {
        name,
        route: contract.decl.route.clone(),
        doc: contract
            .decl
            .display_name
            .as_ref()
            .map(|n| format!("Generated client binding for the '{n}' bridge.")),
        push,
        invoke,
        registration: RegistrationHelper {
            name: format!("register_{}", snake_case(&contract.decl.id)),
            route: contract.decl.route.clone(),
            default_lifetime: Lifetime::Singleton,
        },
    }
}

fn render(binding: &ClientBinding) -> TokenStream {
    let name = format_ident!("{}", binding.name);
    let doc = binding.doc.as_deref().unwrap_or("Generated client binding.");

    let slot_fields = binding.push.iter().map(|push| {
        let field = format_ident!("{}", push.callback_field);
        let payload = payload_type_tokens(&push.descriptor.params);
        quote! { #field: ::crosswire::runtime::CallbackSlot<#payload> }
    });
    let slot_inits = binding.push.iter().map(|push| {
        let field = format_ident!("{}", push.callback_field);
        quote! { #field: ::crosswire::runtime::CallbackSlot::new() }
    });

    let push_methods = binding.push.iter().map(|push| render_push(push));
    let registrations = binding.push.iter().map(|push| render_registration(push));
    let invoke_methods = binding.invoke.iter().map(|invoke| render_invoke(invoke));
    let helper = render_helper(binding, &name);

    quote! {
        #[doc = #doc]
        pub struct #name<C: ::crosswire::runtime::RelayClient> {
            client: ::std::sync::Arc<C>,
            #(#slot_fields,)*
        }

        impl<C: ::crosswire::runtime::RelayClient + 'static> #name<C> {
            pub fn new(client: ::std::sync::Arc<C>) -> ::std::sync::Arc<Self> {
                let binding = ::std::sync::Arc::new(Self {
                    client,
                    #(#slot_inits,)*
                });
                binding.register_handlers();
                binding
            }

            fn register_handlers(self: &::std::sync::Arc<Self>) {
                #(#registrations)*
            }

            #(#push_methods)*

            #(#invoke_methods)*
        }

        #helper
    }
}

fn render_push(push: &PushBinding) -> TokenStream {
    let setter = format_ident!("{}", push.setter);
    let field = format_ident!("{}", push.callback_field);
    let thunk = format_ident!("{}", push.thunk);
    let payload = payload_type_tokens(&push.descriptor.params);
    let params = param_tokens(&push.descriptor.params);
    let args = payload_expr_tokens(&push.descriptor.params);

    quote! {
        pub fn #setter<F>(&self, callback: F)
        where
            F: Fn(#payload) -> ::futures::future::BoxFuture<'static, ()>
                + Send
                + Sync
                + 'static,
        {
            self.#field.set(callback);
        }

        async fn #thunk(&self, #(#params),*) {
            self.#field.dispatch(#args).await;
        }
    }
}

fn render_registration(push: &PushBinding) -> TokenStream {
    let wire_name = &push.wire_name;
    let thunk = format_ident!("{}", push.thunk);
    let payload = payload_type_tokens(&push.descriptor.params);
    let pattern = payload_expr_tokens(&push.descriptor.params);
    let arg_names: Vec<Ident> = push
        .descriptor
        .params
        .iter()
        .map(|p| format_ident!("{}", p.name))
        .collect();

    quote! {
        {
            let binding = ::std::sync::Arc::clone(self);
            self.client.on_event(#wire_name, Box::new(move |value| {
                let binding = ::std::sync::Arc::clone(&binding);
                Box::pin(async move {
                    if let Ok(#pattern) = ::serde_json::from_value::<#payload>(value) {
                        binding.#thunk(#(#arg_names),*).await;
                    }
                })
            }));
        }
    }
}

fn render_invoke(invoke: &InvokeBinding) -> TokenStream {
    let wrapper = format_ident!("{}", invoke.wrapper);
    let wire_name = &invoke.wire_name;
    let params = param_tokens(&invoke.descriptor.params);
    let arg_names: Vec<Ident> = invoke
        .descriptor
        .params
        .iter()
        .map(|p| format_ident!("{}", p.name))
        .collect();

    match &invoke.descriptor.returns {
        ReturnKind::ValueAsync(ty) => {
            let value_ty = type_tokens(ty);
            quote! {
                pub async fn #wrapper(&self, #(#params),*)
                    -> Result<#value_ty, ::crosswire::runtime::ClientError>
                {
                    let args = ::serde_json::json!([#(#arg_names),*]);
                    let value = self.client.invoke(#wire_name, args).await?;
                    Ok(::serde_json::from_value(value)?)
                }
            }
        }
        _ => quote! {
            pub async fn #wrapper(&self, #(#params),*)
                -> Result<(), ::crosswire::runtime::ClientError>
            {
                let args = ::serde_json::json!([#(#arg_names),*]);
                self.client.invoke(#wire_name, args).await?;
                Ok(())
            }
        },
    }
}

fn render_helper(binding: &ClientBinding, name: &Ident) -> TokenStream {
    let helper = format_ident!("{}", binding.registration.name);
    let route = &binding.registration.route;
    let binding_name = &binding.name;

    quote! {
        pub async fn #helper<B, R>(
            connector: &B,
            registry: &mut R,
            base_uri: &str,
            options: ::crosswire::runtime::ConnectionOptions,
        ) -> Result<::std::sync::Arc<#name<B::Client>>, ::crosswire::runtime::ClientError>
        where
            B: ::crosswire::runtime::RelayConnector,
            B::Client: 'static,
            R: ::crosswire::runtime::ServiceRegistry,
        {
            let uri = ::crosswire::runtime::connection_uri(base_uri, #route);
            let policy = ::crosswire::runtime::resolve_policy(options.reconnect);
            let client = connector.connect(&uri, &policy)?;
            client.start().await?;
            let binding = #name::new(::std::sync::Arc::new(client));
            registry.register_binding(#binding_name, options.lifetime);
            Ok(binding)
        }
    }
}

/// Aggregate registration helper wiring every synthesized binding in one
/// call, in synthesis order.
#[must_use]
pub fn aggregate_registration(bindings: &[&ClientBinding]) -> TokenStream {
    let calls = bindings.iter().map(|binding| {
        let helper = format_ident!("{}", binding.registration.name);
        quote! { #helper(connector, registry, base_uri, options.clone()).await?; }
    });

    quote! {
        pub async fn register_generated_bindings<B, R>(
            connector: &B,
            registry: &mut R,
            base_uri: &str,
            options: ::crosswire::runtime::ConnectionOptions,
        ) -> Result<(), ::crosswire::runtime::ClientError>
        where
            B: ::crosswire::runtime::RelayConnector,
            B::Client: 'static,
            R: ::crosswire::runtime::ServiceRegistry,
        {
            #(#calls)*
            Ok(())
        }
    }
}

/// Convert a declared PascalCase or camelCase name to snake_case.
pub(crate) fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Tokens for a declared type. Falls back to a JSON value for type text that
/// does not parse as a Rust type.
pub(crate) fn type_tokens(ty: &TypeRef) -> TokenStream {
    match syn::parse_str::<syn::Type>(ty.as_str()) {
        Ok(parsed) => quote!(#parsed),
        Err(_) => quote!(::serde_json::Value),
    }
}

/// `name: Type` tokens for each parameter.
pub(crate) fn param_tokens(params: &[ParamSpec]) -> Vec<TokenStream> {
    params
        .iter()
        .map(|p| {
            let name = format_ident!("{}", p.name);
            let ty = type_tokens(&p.ty);
            quote! { #name: #ty }
        })
        .collect()
}

/// The payload type carried by a method: unit for none, the bare type for
/// one parameter, a tuple otherwise.
pub(crate) fn payload_type_tokens(params: &[ParamSpec]) -> TokenStream {
    match params {
        [] => quote!(()),
        [single] => type_tokens(&single.ty),
        many => {
            let tys = many.iter().map(|p| type_tokens(&p.ty));
            quote! { (#(#tys),*) }
        }
    }
}

/// Expression producing the payload from parameter bindings, mirroring
/// [`payload_type_tokens`].
pub(crate) fn payload_expr_tokens(params: &[ParamSpec]) -> TokenStream {
    match params {
        [] => quote!(()),
        [single] => {
            let name = format_ident!("{}", single.name);
            quote!(#name)
        }
        many => {
            let names = many.iter().map(|p| format_ident!("{}", p.name));
            quote! { (#(#names),*) }
        }
    }
}
