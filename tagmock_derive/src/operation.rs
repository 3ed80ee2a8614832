// vim: tw=80
use super::*;

use syn::{FnArg, Pat, ReturnType, Signature};

/// Everything known about one stubbed operation: its name, the tag type that
/// stands for it, and the signature the registered callable must satisfy.
pub(crate) struct Operation {
    /// Attributes forwarded to the mirrored method, eg doc comments.
    pub(crate) attrs: Vec<Attribute>,
    /// `#[cfg]` attributes, which gate every generated artifact of this
    /// operation rather than just the method.
    pub(crate) cfg: Vec<Attribute>,
    /// The operation's name, also the name of its store slot.
    pub(crate) ident: Ident,
    /// The tag type's identifier, eg "read_dir" => "ReadDir".
    pub(crate) tag: Ident,
    /// The identifier of the type parameter holding this slot's callable,
    /// eg "ReadDirFn".
    pub(crate) fnty: Ident,
    /// True iff the operation takes `&mut self`.
    mutable: bool,
    argnames: Vec<Ident>,
    /// Argument types as declared.
    argty: Vec<Type>,
    /// Argument types with every elided lifetime named, usable in an impl
    /// header as the argument tuple of the `Invoke` impl.
    tupty: Vec<Type>,
    /// The fresh lifetimes introduced by `tupty`.
    lifetimes: Vec<Lifetime>,
    output: Type,
}

impl Operation {
    pub(crate) fn new(attrs: Vec<Attribute>, sig: &Signature) -> Self {
        let (cfg, attrs): (Vec<_>, Vec<_>) = attrs.into_iter()
            .partition(|attr| attr.path().is_ident("cfg"));
        if !sig.generics.params.is_empty() {
            compile_error(sig.generics.span(),
                "Tagmock does not support generic operations");
        }
        if sig.asyncness.is_some() {
            compile_error(sig.span(),
                "Tagmock does not support async operations");
        }
        let mut mutable = false;
        let mut has_receiver = false;
        let mut argnames = Vec::new();
        let mut argty = Vec::new();
        for fn_arg in sig.inputs.iter() {
            match fn_arg {
                FnArg::Receiver(recv) => {
                    if recv.reference.is_none() {
                        compile_error(recv.span(),
                            "Stubbed operations must take &self or &mut self");
                    }
                    mutable = recv.mutability.is_some();
                    has_receiver = true;
                },
                FnArg::Typed(pt) => {
                    argnames.push(arg_ident(&pt.pat));
                    argty.push((*pt.ty).clone());
                },
            }
        }
        if !has_receiver {
            compile_error(sig.span(),
                "Stubbed operations must take &self or &mut self");
        }
        let output = match &sig.output {
            ReturnType::Default => Type::Tuple(TypeTuple {
                paren_token: token::Paren::default(),
                elems: Punctuated::new(),
            }),
            ReturnType::Type(_, ty) => {
                if mentions_self(ty.to_token_stream()) {
                    compile_error(ty.span(),
                        "Stubbed operations may not return Self");
                }
                if let Type::Reference(tr) = ty.as_ref() {
                    let is_static = tr.lifetime.as_ref()
                        .map(|lt| lt.ident == "static")
                        .unwrap_or(false);
                    if !is_static {
                        compile_error(ty.span(),
                            "Non-'static reference returns are not supported");
                    }
                }
                (**ty).clone()
            },
        };
        let mut lifetimes = Vec::new();
        let mut ctr = 0;
        let tupty = argty.iter().map(|ty| {
            let mut ty = ty.clone();
            name_elided_lifetimes(&mut ty, &mut ctr, &mut lifetimes);
            ty
        }).collect();
        let tag = gen_tag_ident(&sig.ident);
        let fnty = format_ident!("{}Fn", tag);
        Operation {
            attrs,
            cfg,
            ident: sig.ident.clone(),
            tag,
            fnty,
            mutable,
            argnames,
            argty,
            tupty,
            lifetimes,
            output,
        }
    }

    /// The `F: FnMut(args...) -> output` bound the slot's callable must
    /// satisfy, for an arbitrary type parameter name.
    pub(crate) fn fn_bound_for(&self, fnty: &Ident) -> TokenStream {
        let argty = &self.argty;
        let output = &self.output;
        quote!(#fnty: FnMut(#(#argty),*) -> #output)
    }

    pub(crate) fn fn_bound(&self) -> TokenStream {
        self.fn_bound_for(&self.fnty)
    }

    /// The predicate of this operation's `#[cfg]` attributes, if it has
    /// any.  Multiple attributes conjoin, as they do on any item.
    pub(crate) fn cfg_predicate(&self) -> Option<TokenStream> {
        let mut preds = self.cfg.iter().filter_map(|attr| {
            if let syn::Meta::List(ml) = &attr.meta {
                Some(ml.tokens.clone())
            } else {
                None
            }
        }).collect::<Vec<_>>();
        match preds.len() {
            0 => None,
            1 => preds.pop(),
            _ => Some(quote!(all(#(#preds),*))),
        }
    }

    /// The tag type and its `Tag` impl.
    pub(crate) fn tag_def(&self, vis: &Visibility) -> TokenStream {
        let cfg = &self.cfg;
        let tag = &self.tag;
        let name = self.ident.to_string();
        quote!(
            #(#cfg)*
            #vis struct #tag;
            #(#cfg)*
            impl ::tagmock::Tag for #tag {
                const NAME: &'static str = #name;
            }
        )
    }

    /// This slot's field in the callable store.
    pub(crate) fn store_field(&self) -> TokenStream {
        let ident = &self.ident;
        let fnty = &self.fnty;
        quote!(#ident: ::std::cell::RefCell<#fnty>,)
    }

    /// This slot's field in the builder.
    pub(crate) fn builder_field(&self) -> TokenStream {
        let ident = &self.ident;
        let fnty = &self.fnty;
        quote!(#ident: #fnty,)
    }

    /// The store's `Invoke` impl for this operation's tag.
    pub(crate) fn invoke_impl(&self, calls: &Ident, fn_params: &[&Ident])
        -> TokenStream
    {
        let tag = &self.tag;
        let lifetimes = &self.lifetimes;
        let tupty = &self.tupty;
        let bound = self.fn_bound();
        let output = &self.output;
        let ident = &self.ident;
        let argnames = &self.argnames;
        let destructure = if argnames.is_empty() {
            quote!(let () = args;)
        } else {
            quote!(let (#(#argnames,)*) = args;)
        };
        quote!(
            impl<#(#lifetimes,)* #(#fn_params),*>
                ::tagmock::Invoke<#tag, (#(#tupty,)*)>
                for #calls<#(#fn_params),*>
                where #bound
            {
                type Output = #output;
                fn invoke(&self, _tag: #tag, args: (#(#tupty,)*)) -> #output {
                    #destructure
                    (&mut *self.#ident.borrow_mut())(#(#argnames),*)
                }
            }
        )
    }

    /// The builder's `Register` impl for this operation's tag.  It exists
    /// only while the slot is still `Vacant`, which is what makes double
    /// registration a compile error.
    pub(crate) fn register_impl(&self, builder: &Ident, ops: &[&Operation],
                                idx: usize) -> TokenStream
    {
        let tag = &self.tag;
        let f = format_ident!("__F");
        let bound = self.fn_bound_for(&f);
        let mut params = vec![f.clone()];
        params.extend(ops.iter().enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, op)| op.fnty.clone()));
        let in_params = ops.iter().enumerate().map(|(i, op)| {
            if i == idx {
                quote!(::tagmock::Vacant)
            } else {
                let fnty = &op.fnty;
                quote!(#fnty)
            }
        }).collect::<Vec<_>>();
        let out_params = ops.iter().enumerate().map(|(i, op)| {
            if i == idx {
                quote!(#f)
            } else {
                let fnty = &op.fnty;
                quote!(#fnty)
            }
        }).collect::<Vec<_>>();
        let field_inits = ops.iter().enumerate().map(|(i, op)| {
            let ident = &op.ident;
            if i == idx {
                quote!(#ident: stub,)
            } else {
                quote!(#ident: self.#ident,)
            }
        }).collect::<Vec<_>>();
        quote!(
            impl<#(#params),*> ::tagmock::Register<#tag, #f>
                for #builder<#(#in_params),*>
                where #bound
            {
                type Output = #builder<#(#out_params),*>;
                fn on(self, _tag: #tag, stub: #f) -> Self::Output {
                    #builder {
                        #(#field_inits)*
                    }
                }
            }
        )
    }

    /// The facade method mirroring this operation.  Inherent for `facade!`,
    /// a trait item for `#[autostub]`.
    pub(crate) fn interface_method(&self, inherent: bool) -> TokenStream {
        let attrs = &self.attrs;
        let ident = &self.ident;
        let tag = &self.tag;
        let argnames = &self.argnames;
        let argty = &self.argty;
        let output = &self.output;
        let vis = if inherent { quote!(pub) } else { quote!() };
        let receiver = if self.mutable {
            quote!(&mut self)
        } else {
            quote!(&self)
        };
        quote!(
            #(#attrs)*
            #vis fn #ident(#receiver #(, #argnames: #argty)*) -> #output {
                ::tagmock::Invoke::invoke(&self.calls, #tag, (#(#argnames,)*))
            }
        )
    }
}

/// Whether a type's tokens mention `Self`, which would resolve to the
/// generated store inside the expansion.
fn mentions_self(ts: TokenStream) -> bool {
    ts.into_iter().any(|tt| match tt {
        proc_macro2::TokenTree::Ident(ident) => ident == "Self",
        proc_macro2::TokenTree::Group(g) => mentions_self(g.stream()),
        _ => false,
    })
}

/// Extract the binding from a method argument's pattern.
fn arg_ident(pat: &Pat) -> Ident {
    match pat {
        Pat::Ident(pat_ident) => {
            if let Some(r) = &pat_ident.by_ref {
                compile_error(r.span(),
                    "Tagmock does not support by-reference argument bindings");
            }
            if let Some((_at, subpat)) = &pat_ident.subpat {
                compile_error(subpat.span(),
                    "Tagmock does not support subpattern bindings");
            }
            pat_ident.ident.clone()
        },
        _ => {
            compile_error(pat.span(),
                "Stubbed operations must have named arguments");
            Ident::new("__unnamed", pat.span())
        },
    }
}
