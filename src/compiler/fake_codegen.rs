//! Fake-binding synthesis
//!
//! Maps a realized binding's structural manifest to a test double mirroring
//! the binding surface. The manifest is the only input; fake generation never
//! inspects contract text or recovers roles from method-name patterns.
//!
//! Per invoke method the fake carries a thread-safe call log, an overridable
//! behavior delegate, and honors a strict-mode flag. Per push method it
//! carries a record log, an event channel, a `simulate_*` operation, and a
//! `next_*` operation awaiting the channel. Cancellation-typed trailing
//! parameters are plumbing and excluded from recorded argument lists.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use thiserror::Error;

use crate::ast::{ParamSpec, ReturnKind};

use super::codegen::{payload_type_tokens, snake_case, type_tokens};
use super::manifest::{BindingManifest, MethodDescriptor};

/// Generated surface for one faked push method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakePush {
    pub method: String,
    pub record_field: String,
    pub channel_field: String,
    pub callback_field: String,
    pub simulate: String,
    pub wait_next: String,
    /// Payload parameters, cancellation plumbing already stripped.
    pub payload: Vec<ParamSpec>,
}

/// Generated surface for one faked invoke method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeInvoke {
    pub method: String,
    pub call_field: String,
    pub override_field: String,
    pub wrapper: String,
    /// Recorded arguments, cancellation plumbing already stripped.
    pub args: Vec<ParamSpec>,
    pub returns: ReturnKind,
}

/// The generated fake-binding description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeBinding {
    pub name: String,
    /// The binding type this fake mirrors.
    pub target: String,
    pub push: Vec<FakePush>,
    pub invoke: Vec<FakeInvoke>,
}

/// Complete fake synthesis output: model plus tokens.
#[derive(Debug, Clone)]
pub struct FakeSynthesis {
    pub fake: FakeBinding,
    pub tokens: TokenStream,
}

/// A manifest shape this synthesizer does not recognize. Failing one fake
/// never blocks the rest of the compilation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FakeSynthError {
    #[error("manifest has an empty binding name")]
    EmptyBindingName,

    #[error("manifest for '{binding}' contains an unnamed method")]
    UnnamedMethod { binding: String },

    #[error("fake target '{target}' matches no synthesized binding")]
    UnknownTarget { target: String },
}

/// Synthesize a fake from a binding manifest.
pub fn synthesize_fake(manifest: &BindingManifest) -> Result<FakeSynthesis, FakeSynthError> {
    let fake = build_model(manifest)?;
    let tokens = render(&fake);
    Ok(FakeSynthesis { fake, tokens })
}

fn build_model(manifest: &BindingManifest) -> Result<FakeBinding, FakeSynthError> {
    if manifest.binding.trim().is_empty() {
        return Err(FakeSynthError::EmptyBindingName);
    }
    let check_named = |descriptor: &MethodDescriptor| {
        if descriptor.name.trim().is_empty() {
            Err(FakeSynthError::UnnamedMethod {
                binding: manifest.binding.clone(),
            })
        } else {
            Ok(())
        }
    };

    let mut push = Vec::with_capacity(manifest.push.len());
    for descriptor in &manifest.push {
        check_named(descriptor)?;
        let snake = snake_case(&descriptor.name);
        push.push(FakePush {
            method: descriptor.name.clone(),
            record_field: format!("records_{snake}"),
            channel_field: format!("events_{snake}"),
            callback_field: format!("on_{snake}"),
            simulate: format!("simulate_{snake}"),
            wait_next: format!("next_{snake}"),
            payload: descriptor.payload_params().to_vec(),
        });
    }

    let mut invoke = Vec::with_capacity(manifest.invoke.len());
    for descriptor in &manifest.invoke {
        check_named(descriptor)?;
        let snake = snake_case(&descriptor.name);
        invoke.push(FakeInvoke {
            method: descriptor.name.clone(),
            call_field: format!("calls_{snake}"),
            override_field: format!("on_{snake}"),
            wrapper: snake,
            args: descriptor.payload_params().to_vec(),
            returns: descriptor.returns.clone(),
        });
    }

    Ok(FakeBinding {
        name: format!("Fake{}", manifest.binding),
        target: manifest.binding.clone(),
        push,
        invoke,
    })
}

fn render(fake: &FakeBinding) -> TokenStream {
    let name = format_ident!("{}", fake.name);
    let target = &fake.target;
    let doc = format!("Generated test double mirroring `{target}`.");

    let push_fields = fake.push.iter().map(|p| {
        let record = format_ident!("{}", p.record_field);
        let channel = format_ident!("{}", p.channel_field);
        let callback = format_ident!("{}", p.callback_field);
        let payload = payload_type_tokens(&p.payload);
        quote! {
            pub #record: ::crosswire::runtime::CallLog<#payload>,
            pub #channel: ::crosswire::runtime::EventChannel<#payload>,
            pub #callback: ::crosswire::runtime::CallbackSlot<#payload>,
        }
    });

    let invoke_fields = fake.invoke.iter().map(|i| {
        let calls = format_ident!("{}", i.call_field);
        let slot = format_ident!("{}", i.override_field);
        let args = payload_type_tokens(&i.args);
        let ret = return_type_tokens(&i.returns);
        quote! {
            pub #calls: ::crosswire::runtime::CallLog<#args>,
            pub #slot: ::crosswire::runtime::OverrideSlot<#args, #ret>,
        }
    });

    let push_inits = fake.push.iter().map(|p| {
        let record = format_ident!("{}", p.record_field);
        let channel = format_ident!("{}", p.channel_field);
        let callback = format_ident!("{}", p.callback_field);
        quote! {
            #record: ::crosswire::runtime::CallLog::new(),
            #channel: ::crosswire::runtime::EventChannel::new(),
            #callback: ::crosswire::runtime::CallbackSlot::new(),
        }
    });
    let invoke_inits = fake.invoke.iter().map(|i| {
        let calls = format_ident!("{}", i.call_field);
        let slot = format_ident!("{}", i.override_field);
        quote! {
            #calls: ::crosswire::runtime::CallLog::new(),
            #slot: ::crosswire::runtime::OverrideSlot::new(),
        }
    });

    let push_methods = fake.push.iter().map(|p| render_push(p));
    let invoke_methods = fake.invoke.iter().map(|i| render_invoke(i));

    let resets = fake
        .push
        .iter()
        .map(|p| {
            let record = format_ident!("{}", p.record_field);
            let channel = format_ident!("{}", p.channel_field);
            quote! {
                self.#record.clear();
                self.#channel.reset();
            }
        })
        .chain(fake.invoke.iter().map(|i| {
            let calls = format_ident!("{}", i.call_field);
            quote! { self.#calls.clear(); }
        }));

    quote! {
        #[doc = #doc]
        pub struct #name {
            pub strict: bool,
            #(#push_fields)*
            #(#invoke_fields)*
        }

        impl #name {
            pub fn new() -> Self {
                Self {
                    strict: false,
                    #(#push_inits)*
                    #(#invoke_inits)*
                }
            }

            pub fn strict() -> Self {
                Self {
                    strict: true,
                    ..Self::new()
                }
            }

            /// Clear every call and record log and install fresh event
            /// channels.
            pub fn reset(&self) {
                #(#resets)*
            }

            #(#push_methods)*
            #(#invoke_methods)*
        }

        impl Default for #name {
            fn default() -> Self {
                Self::new()
            }
        }
    }
}

fn render_push(push: &FakePush) -> TokenStream {
    let simulate = format_ident!("{}", push.simulate);
    let wait_next = format_ident!("{}", push.wait_next);
    let record = format_ident!("{}", push.record_field);
    let channel = format_ident!("{}", push.channel_field);
    let callback = format_ident!("{}", push.callback_field);
    let payload = payload_type_tokens(&push.payload);

    quote! {
        /// Record the event, publish it to the channel, then invoke and
        /// await the callback if one is set, in that order.
        pub async fn #simulate(&self, value: #payload) {
            ::crosswire::runtime::simulate(
                &self.#record,
                &self.#channel,
                &self.#callback,
                value,
            )
            .await;
        }

        /// Await the next simulated event, FIFO across calls.
        pub async fn #wait_next(
            &self,
            cancel: &::tokio_util::sync::CancellationToken,
        ) -> Result<#payload, ::crosswire::runtime::ChannelError> {
            self.#channel.wait_next(cancel).await
        }
    }
}

fn render_invoke(invoke: &FakeInvoke) -> TokenStream {
    let wrapper = format_ident!("{}", invoke.wrapper);
    let calls = format_ident!("{}", invoke.call_field);
    let slot = format_ident!("{}", invoke.override_field);
    let method = &invoke.method;
    let params = super::codegen::param_tokens(&invoke.args);
    let args = super::codegen::payload_expr_tokens(&invoke.args);
    let ret = return_type_tokens(&invoke.returns);

    quote! {
        pub async fn #wrapper(&self, #(#params),*)
            -> Result<#ret, ::crosswire::runtime::FakeError>
        {
            ::crosswire::runtime::dispatch_invoke(
                &self.#calls,
                &self.#slot,
                self.strict,
                #method,
                #args,
            )
            .await
        }
    }
}

fn return_type_tokens(returns: &ReturnKind) -> TokenStream {
    match returns {
        ReturnKind::ValueAsync(ty) => type_tokens(ty),
        ReturnKind::UnitAsync | ReturnKind::Sync(_) => quote!(()),
    }
}
