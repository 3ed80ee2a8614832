// vim: tw=80
//! Proc Macros for use with Tagmock
//!
//! You probably don't want to use this crate directly.  Instead, you use its
//! reexports via the [`tagmock`](../tagmock/index.html) crate.

#![cfg_attr(feature = "nightly_derive", feature(proc_macro_diagnostic))]
extern crate proc_macro;

use cfg_if::cfg_if;
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote, ToTokens};
use syn::{
    braced,
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    token,
    Attribute, Ident, Lifetime, Type, TypeTuple, Visibility,
};

mod autostub;
mod facade;
mod operation;
use crate::autostub::do_autostub;
use crate::facade::{do_facade, Facade};
use crate::operation::Operation;

cfg_if! {
    // proc-macro2's Span::unstable method requires the nightly feature, and it
    // doesn't work in test mode.
    // https://github.com/alexcrichton/proc-macro2/issues/159
    if #[cfg(all(feature = "nightly_derive", not(test)))] {
        fn compile_error(span: Span, msg: &'static str) {
            span.unstable()
                .error(msg)
                .emit();
        }
    } else {
        fn compile_error(_span: Span, msg: &str) {
            panic!("{}.  More information may be available when tagmock is built with the \"nightly\" feature.", msg);
        }
    }
}

/// Generate the stub's identifier from the interface's: eg "Foo" => "StubFoo"
fn gen_stub_ident(ident: &Ident) -> Ident {
    format_ident!("Stub{}", ident)
}

/// Generate the identifier of the stub's callable store: eg "Foo" =>
/// "FooCalls"
fn gen_calls_ident(ident: &Ident) -> Ident {
    format_ident!("{}Calls", ident)
}

/// Generate the identifier of the stub's builder: eg "Foo" => "FooBuilder"
fn gen_builder_ident(ident: &Ident) -> Ident {
    format_ident!("{}Builder", ident)
}

/// Generate a tag identifier from an operation's: eg "read_dir" => "ReadDir"
fn gen_tag_ident(ident: &Ident) -> Ident {
    let mut camel = String::new();
    for word in ident.to_string().split('_') {
        let mut chars = word.chars();
        if let Some(c) = chars.next() {
            camel.extend(c.to_uppercase());
            camel.push_str(chars.as_str());
        }
    }
    Ident::new(&camel, ident.span())
}

/// Name every elided lifetime in `ty` so the type can be used in an impl
/// header, recording the fresh lifetimes in `out`.  `&str` becomes
/// `&'__a0 str`, `Option<&'_ [u8]>` becomes `Option<&'__a1 [u8]>`, and so
/// on.
fn name_elided_lifetimes(ty: &mut Type, ctr: &mut usize, out: &mut Vec<Lifetime>)
{
    let fresh = |ctr: &mut usize, out: &mut Vec<Lifetime>| {
        let lt = Lifetime::new(&format!("'__a{}", ctr), Span::call_site());
        *ctr += 1;
        out.push(lt.clone());
        lt
    };
    match ty {
        Type::Reference(tr) => {
            let elided = match &tr.lifetime {
                None => true,
                Some(lt) => lt.ident == "_",
            };
            if elided {
                tr.lifetime = Some(fresh(ctr, out));
            }
            name_elided_lifetimes(&mut tr.elem, ctr, out);
        },
        Type::Slice(ts) => name_elided_lifetimes(&mut ts.elem, ctr, out),
        Type::Array(ta) => name_elided_lifetimes(&mut ta.elem, ctr, out),
        Type::Paren(tp) => name_elided_lifetimes(&mut tp.elem, ctr, out),
        Type::Tuple(tt) => {
            for elem in tt.elems.iter_mut() {
                name_elided_lifetimes(elem, ctr, out);
            }
        },
        Type::Path(tp) => {
            for seg in tp.path.segments.iter_mut() {
                if let syn::PathArguments::AngleBracketed(ab) = &mut seg.arguments
                {
                    for ga in ab.args.iter_mut() {
                        match ga {
                            syn::GenericArgument::Type(t) =>
                                name_elided_lifetimes(t, ctr, out),
                            syn::GenericArgument::Lifetime(lt)
                                if lt.ident == "_" =>
                            {
                                *lt = fresh(ctr, out);
                            },
                            _ => (),
                        }
                    }
                }
            }
        },
        _ => (),    // Nothing to do
    }
}

/// Manually declare a stub facade.
///
/// The macro takes an optional visibility specifier, the interface's name,
/// and its operations written as bodiless methods:
///
/// ```text
/// facade! {
///     pub Filesystem {
///         fn read(&self, path: &str) -> String;
///         fn remove(&self, path: &str) -> bool;
///     }
/// }
/// ```
///
/// It generates one tag type per operation (the CamelCased operation name),
/// a callable store, a by-tag builder, and a `StubFilesystem` struct whose
/// methods mirror the declared operations.  Attributes on an operation are
/// forwarded to its mirrored method; `#[cfg]` attributes additionally gate
/// the operation's tag and builder slot, so a configured-out operation
/// needs no registered callable.  See the
/// [`tagmock`](../tagmock/index.html) crate docs for the full user guide and
/// runnable examples.
#[proc_macro]
pub fn facade(item: proc_macro::TokenStream) -> proc_macro::TokenStream {
    do_facade(item.into()).into()
}

/// Generate a stub facade for a trait definition.
///
/// Applied to a plain trait, it emits the trait unchanged and additionally
/// generates the same tags, store, and builder as [`facade!`], with the stub
/// implementing the trait:
///
/// ```text
/// #[autostub]
/// pub trait Filesystem {
///     fn read(&self, path: &str) -> String;
/// }
/// ```
///
/// Traits with generics, supertraits, associated items, or `self`-by-value
/// receivers are rejected.  See the [`tagmock`](../tagmock/index.html) crate
/// docs for details.
#[proc_macro_attribute]
pub fn autostub(attrs: proc_macro::TokenStream, input: proc_macro::TokenStream)
    -> proc_macro::TokenStream
{
    let input: proc_macro2::TokenStream = input.into();
    let mut output = input.clone();
    output.extend(do_autostub(attrs.into(), input));
    output.into()
}
