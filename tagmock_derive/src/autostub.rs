// vim: tw=80
use super::*;

use syn::{ItemTrait, TraitItem};

/// Generate the stub facade for a trait definition.  Returns only the
/// generated code; the caller re-emits the original trait.
pub(crate) fn do_autostub(attrs: TokenStream, input: TokenStream)
    -> TokenStream
{
    if !attrs.is_empty() {
        compile_error(Span::call_site(), "#[autostub] takes no arguments");
    }
    let trait_item: ItemTrait = match syn::parse2(input) {
        Ok(trait_item) => trait_item,
        Err(_) => {
            compile_error(Span::call_site(),
                "#[autostub] is only supported on trait definitions");
            return TokenStream::new();
        },
    };
    if !trait_item.generics.params.is_empty() {
        compile_error(trait_item.generics.span(),
            "Tagmock does not support generic interfaces");
    }
    if !trait_item.supertraits.is_empty() {
        compile_error(trait_item.supertraits.span(),
            "Tagmock does not support supertraits");
    }
    let mut ops = Vec::new();
    for item in trait_item.items.iter() {
        match item {
            TraitItem::Fn(f) => {
                ops.push(Operation::new(f.attrs.clone(), &f.sig));
            },
            _ => {
                compile_error(item.span(),
                    "#[autostub] only supports methods");
            },
        }
    }
    let facade = Facade {
        vis: trait_item.vis.clone(),
        name: trait_item.ident.clone(),
        trait_: Some(trait_item.ident.clone()),
        ops,
    };
    facade.gen()
}
