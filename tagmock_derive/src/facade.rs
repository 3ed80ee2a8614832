// vim: tw=80
use super::*;

/// A parsed `facade!` invocation: an interface name and the operations the
/// stub must mirror.
pub(crate) struct Facade {
    pub(crate) vis: Visibility,
    pub(crate) name: Ident,
    /// When generating for `#[autostub]`, the trait the stub implements.
    /// `None` makes the interface methods inherent.
    pub(crate) trait_: Option<Ident>,
    pub(crate) ops: Vec<Operation>,
}

impl Facade {
    pub(crate) fn gen(&self) -> TokenStream {
        for (i, op) in self.ops.iter().enumerate() {
            if self.ops[..i].iter().any(|other| other.ident == op.ident) {
                compile_error(op.ident.span(), "Duplicate operation name");
            } else if self.ops[..i].iter().any(|other| other.tag == op.tag) {
                // eg "foo" and "foo_" both camel-case to "Foo"
                compile_error(op.ident.span(), "Duplicate tag name");
            }
        }
        let mut output = TokenStream::new();
        // The tags, each gated by its own operation's cfg
        for op in self.ops.iter() {
            op.tag_def(&self.vis).to_tokens(&mut output);
        }
        // An operation behind a cfg predicate exists in some configurations
        // and not others, and the store's shape changes with it.  Emit one
        // store/builder/stub variant per combination of cfg'd operations,
        // gated so exactly one variant survives cfg evaluation.
        let cfged: Vec<usize> = self.ops.iter().enumerate()
            .filter(|(_, op)| op.cfg_predicate().is_some())
            .map(|(i, _)| i)
            .collect();
        for mask in 0..(1usize << cfged.len()) {
            let active = self.ops.iter().enumerate()
                .filter(|(i, _)| {
                    cfged.iter().position(|j| j == i)
                        .map(|b| mask & (1 << b) != 0)
                        .unwrap_or(true)
                })
                .map(|(_, op)| op)
                .collect::<Vec<_>>();
            let gate = variant_gate(&self.ops, &cfged, mask);
            self.gen_variant(&active, &gate, &mut output);
        }
        output
    }

    /// One store/builder/stub rendition for a fixed set of compiled
    /// operations, each item prefixed by `gate` (empty when nothing in the
    /// facade carries a cfg).
    fn gen_variant(&self, ops: &[&Operation], gate: &TokenStream,
                   output: &mut TokenStream)
    {
        let vis = &self.vis;
        let stub = gen_stub_ident(&self.name);
        let calls = gen_calls_ident(&self.name);
        let builder = gen_builder_ident(&self.name);
        let fn_params = ops.iter().map(|op| &op.fnty).collect::<Vec<_>>();
        let vacants = ops.iter()
            .map(|_| quote!(::tagmock::Vacant))
            .collect::<Vec<_>>();
        let bounds = ops.iter()
            .map(|op| op.fn_bound())
            .collect::<Vec<_>>();
        // The callable store and its tag-addressed dispatch
        let store_fields = ops.iter().map(|op| op.store_field());
        quote!(
            #gate
            #vis struct #calls<#(#fn_params),*> {
                #(#store_fields)*
            }
        ).to_tokens(output);
        for op in ops.iter() {
            let invoke = op.invoke_impl(&calls, &fn_params);
            quote!(#gate #invoke).to_tokens(output);
        }
        // The stub facade itself
        quote!(
            #gate
            #vis struct #stub<#(#fn_params),*> {
                calls: #calls<#(#fn_params),*>,
            }
        ).to_tokens(output);
        let vacant_inits = ops.iter().map(|op| {
            let ident = &op.ident;
            quote!(#ident: ::tagmock::Vacant,)
        });
        quote!(
            #gate
            #[allow(dead_code)]
            impl #stub<#(#vacants),*> {
                pub fn builder() -> #builder<#(#vacants),*> {
                    #builder {
                        #(#vacant_inits)*
                    }
                }
            }
        ).to_tokens(output);
        quote!(
            #gate
            #[allow(dead_code)]
            impl<#(#fn_params),*> #stub<#(#fn_params),*> {
                pub fn calls(&self) -> &#calls<#(#fn_params),*> {
                    &self.calls
                }
            }
        ).to_tokens(output);
        // The builder, filled slot by slot through `Register`
        let builder_fields = ops.iter().map(|op| op.builder_field());
        quote!(
            #gate
            #vis struct #builder<#(#fn_params),*> {
                #(#builder_fields)*
            }
        ).to_tokens(output);
        for (i, op) in ops.iter().enumerate() {
            let register = op.register_impl(&builder, ops, i);
            quote!(#gate #register).to_tokens(output);
        }
        let cell_inits = ops.iter().map(|op| {
            let ident = &op.ident;
            quote!(#ident: ::std::cell::RefCell::new(self.#ident),)
        });
        quote!(
            #gate
            #[allow(dead_code)]
            impl<#(#fn_params),*> #builder<#(#fn_params),*>
                where #(#bounds),*
            {
                pub fn build(self) -> #stub<#(#fn_params),*> {
                    #stub {
                        calls: #calls {
                            #(#cell_inits)*
                        },
                    }
                }
            }
        ).to_tokens(output);
        // The mirrored interface
        let methods = ops.iter()
            .map(|op| op.interface_method(self.trait_.is_none()));
        match &self.trait_ {
            Some(trait_) => quote!(
                #gate
                impl<#(#fn_params),*> #trait_ for #stub<#(#fn_params),*>
                    where #(#bounds),*
                {
                    #(#methods)*
                }
            ),
            None => quote!(
                #gate
                #[allow(dead_code)]
                impl<#(#fn_params),*> #stub<#(#fn_params),*>
                    where #(#bounds),*
                {
                    #(#methods)*
                }
            ),
        }.to_tokens(output);
    }
}

/// The cfg attribute confining one variant to exactly the configurations
/// where `mask` selects the compiled operations.
fn variant_gate(ops: &[Operation], cfged: &[usize], mask: usize)
    -> TokenStream
{
    if cfged.is_empty() {
        return TokenStream::new();
    }
    let terms = cfged.iter().enumerate().map(|(b, i)| {
        // cfged holds only operations with a predicate
        let p = ops[*i].cfg_predicate().unwrap();
        if mask & (1 << b) != 0 {
            p
        } else {
            quote!(not(#p))
        }
    }).collect::<Vec<_>>();
    quote!(#[cfg(all(#(#terms),*))])
}

impl Parse for Facade {
    fn parse(input: ParseStream) -> syn::parse::Result<Self> {
        let vis: Visibility = input.parse()?;
        let name: Ident = input.parse()?;
        let generics: syn::Generics = input.parse()?;
        if !generics.params.is_empty() {
            compile_error(generics.span(),
                "Tagmock does not support generic interfaces");
        }
        let content;
        let _brace_token = braced!(content in input);
        let mut ops = Vec::new();
        while !content.is_empty() {
            let item: syn::TraitItemFn = content.parse()?;
            if let Some(block) = &item.default {
                compile_error(block.span(),
                    "Stubbed operations must not have bodies");
            }
            ops.push(Operation::new(item.attrs, &item.sig));
        }
        if !input.is_empty() {
            return Err(input.error("Unsupported in this context"));
        }
        Ok(Facade{vis, name, trait_: None, ops})
    }
}

pub(crate) fn do_facade(input: TokenStream) -> TokenStream {
    match syn::parse2::<Facade>(input) {
        Ok(facade) => facade.gen(),
        Err(err) => err.to_compile_error(),
    }
}

#[cfg(test)]
mod t {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;

    use super::super::*;

    fn check(desired: &str, code: &str) {
        let ts = TokenStream::from_str(code).unwrap();
        let output = do_facade(ts).to_string();
        // Let proc_macro2 reformat the whitespace in the expected string
        let expected = TokenStream::from_str(desired).unwrap().to_string();
        assert_eq!(expected, output);
    }

    #[test]
    fn single_operation() {
        let desired = r#"
        pub struct Log;
        impl ::tagmock::Tag for Log {
            const NAME: & 'static str = "log";
        }
        pub struct ConsoleCalls<LogFn> {
            log: ::std::cell::RefCell<LogFn> ,
        }
        impl<LogFn> ::tagmock::Invoke<Log, (String,)> for ConsoleCalls<LogFn>
            where LogFn: FnMut(String) -> ()
        {
            type Output = ();
            fn invoke(&self, _tag: Log, args: (String,)) -> () {
                let (line,) = args;
                (&mut *self.log.borrow_mut())(line)
            }
        }
        pub struct StubConsole<LogFn> {
            calls: ConsoleCalls<LogFn> ,
        }
        #[allow(dead_code)]
        impl StubConsole< ::tagmock::Vacant> {
            pub fn builder() -> ConsoleBuilder< ::tagmock::Vacant> {
                ConsoleBuilder {
                    log: ::tagmock::Vacant,
                }
            }
        }
        #[allow(dead_code)]
        impl<LogFn> StubConsole<LogFn> {
            pub fn calls(&self) -> &ConsoleCalls<LogFn> {
                &self.calls
            }
        }
        pub struct ConsoleBuilder<LogFn> {
            log: LogFn,
        }
        impl<__F> ::tagmock::Register<Log, __F>
            for ConsoleBuilder< ::tagmock::Vacant>
            where __F: FnMut(String) -> ()
        {
            type Output = ConsoleBuilder<__F> ;
            fn on(self, _tag: Log, stub: __F) -> Self::Output {
                ConsoleBuilder {
                    log: stub,
                }
            }
        }
        #[allow(dead_code)]
        impl<LogFn> ConsoleBuilder<LogFn>
            where LogFn: FnMut(String) -> ()
        {
            pub fn build(self) -> StubConsole<LogFn> {
                StubConsole {
                    calls: ConsoleCalls {
                        log: ::std::cell::RefCell::new(self.log),
                    },
                }
            }
        }
        #[allow(dead_code)]
        impl<LogFn> StubConsole<LogFn>
            where LogFn: FnMut(String) -> ()
        {
            pub fn log(&self, line: String) -> () {
                ::tagmock::Invoke::invoke(&self.calls, Log, (line,))
            }
        }"#;
        let code = r#"
        pub Console {
            fn log(&self, line: String);
        }"#;
        check(desired, code);
    }

    #[test]
    fn cfg_operation() {
        let desired = r#"
        pub struct Read;
        impl ::tagmock::Tag for Read {
            const NAME: & 'static str = "read";
        }
        #[cfg(unix)]
        pub struct Watch;
        #[cfg(unix)]
        impl ::tagmock::Tag for Watch {
            const NAME: & 'static str = "watch";
        }
        #[cfg(all(not(unix)))]
        pub struct FsCalls<ReadFn> {
            read: ::std::cell::RefCell<ReadFn> ,
        }
        #[cfg(all(not(unix)))]
        impl<ReadFn> ::tagmock::Invoke<Read, ()> for FsCalls<ReadFn>
            where ReadFn: FnMut() -> u8
        {
            type Output = u8;
            fn invoke(&self, _tag: Read, args: ()) -> u8 {
                let () = args;
                (&mut *self.read.borrow_mut())()
            }
        }
        #[cfg(all(not(unix)))]
        pub struct StubFs<ReadFn> {
            calls: FsCalls<ReadFn> ,
        }
        #[cfg(all(not(unix)))]
        #[allow(dead_code)]
        impl StubFs< ::tagmock::Vacant> {
            pub fn builder() -> FsBuilder< ::tagmock::Vacant> {
                FsBuilder {
                    read: ::tagmock::Vacant,
                }
            }
        }
        #[cfg(all(not(unix)))]
        #[allow(dead_code)]
        impl<ReadFn> StubFs<ReadFn> {
            pub fn calls(&self) -> &FsCalls<ReadFn> {
                &self.calls
            }
        }
        #[cfg(all(not(unix)))]
        pub struct FsBuilder<ReadFn> {
            read: ReadFn,
        }
        #[cfg(all(not(unix)))]
        impl<__F> ::tagmock::Register<Read, __F>
            for FsBuilder< ::tagmock::Vacant>
            where __F: FnMut() -> u8
        {
            type Output = FsBuilder<__F> ;
            fn on(self, _tag: Read, stub: __F) -> Self::Output {
                FsBuilder {
                    read: stub,
                }
            }
        }
        #[cfg(all(not(unix)))]
        #[allow(dead_code)]
        impl<ReadFn> FsBuilder<ReadFn>
            where ReadFn: FnMut() -> u8
        {
            pub fn build(self) -> StubFs<ReadFn> {
                StubFs {
                    calls: FsCalls {
                        read: ::std::cell::RefCell::new(self.read),
                    },
                }
            }
        }
        #[cfg(all(not(unix)))]
        #[allow(dead_code)]
        impl<ReadFn> StubFs<ReadFn>
            where ReadFn: FnMut() -> u8
        {
            pub fn read(&self) -> u8 {
                ::tagmock::Invoke::invoke(&self.calls, Read, ())
            }
        }
        #[cfg(all(unix))]
        pub struct FsCalls<ReadFn, WatchFn> {
            read: ::std::cell::RefCell<ReadFn> ,
            watch: ::std::cell::RefCell<WatchFn> ,
        }
        #[cfg(all(unix))]
        impl<ReadFn, WatchFn> ::tagmock::Invoke<Read, ()>
            for FsCalls<ReadFn, WatchFn>
            where ReadFn: FnMut() -> u8
        {
            type Output = u8;
            fn invoke(&self, _tag: Read, args: ()) -> u8 {
                let () = args;
                (&mut *self.read.borrow_mut())()
            }
        }
        #[cfg(all(unix))]
        impl<ReadFn, WatchFn> ::tagmock::Invoke<Watch, ()>
            for FsCalls<ReadFn, WatchFn>
            where WatchFn: FnMut() -> ()
        {
            type Output = ();
            fn invoke(&self, _tag: Watch, args: ()) -> () {
                let () = args;
                (&mut *self.watch.borrow_mut())()
            }
        }
        #[cfg(all(unix))]
        pub struct StubFs<ReadFn, WatchFn> {
            calls: FsCalls<ReadFn, WatchFn> ,
        }
        #[cfg(all(unix))]
        #[allow(dead_code)]
        impl StubFs< ::tagmock::Vacant, ::tagmock::Vacant> {
            pub fn builder() -> FsBuilder< ::tagmock::Vacant, ::tagmock::Vacant>
            {
                FsBuilder {
                    read: ::tagmock::Vacant,
                    watch: ::tagmock::Vacant,
                }
            }
        }
        #[cfg(all(unix))]
        #[allow(dead_code)]
        impl<ReadFn, WatchFn> StubFs<ReadFn, WatchFn> {
            pub fn calls(&self) -> &FsCalls<ReadFn, WatchFn> {
                &self.calls
            }
        }
        #[cfg(all(unix))]
        pub struct FsBuilder<ReadFn, WatchFn> {
            read: ReadFn,
            watch: WatchFn,
        }
        #[cfg(all(unix))]
        impl<__F, WatchFn> ::tagmock::Register<Read, __F>
            for FsBuilder< ::tagmock::Vacant, WatchFn>
            where __F: FnMut() -> u8
        {
            type Output = FsBuilder<__F, WatchFn> ;
            fn on(self, _tag: Read, stub: __F) -> Self::Output {
                FsBuilder {
                    read: stub,
                    watch: self.watch,
                }
            }
        }
        #[cfg(all(unix))]
        impl<__F, ReadFn> ::tagmock::Register<Watch, __F>
            for FsBuilder<ReadFn, ::tagmock::Vacant>
            where __F: FnMut() -> ()
        {
            type Output = FsBuilder<ReadFn, __F> ;
            fn on(self, _tag: Watch, stub: __F) -> Self::Output {
                FsBuilder {
                    read: self.read,
                    watch: stub,
                }
            }
        }
        #[cfg(all(unix))]
        #[allow(dead_code)]
        impl<ReadFn, WatchFn> FsBuilder<ReadFn, WatchFn>
            where ReadFn: FnMut() -> u8, WatchFn: FnMut() -> ()
        {
            pub fn build(self) -> StubFs<ReadFn, WatchFn> {
                StubFs {
                    calls: FsCalls {
                        read: ::std::cell::RefCell::new(self.read),
                        watch: ::std::cell::RefCell::new(self.watch),
                    },
                }
            }
        }
        #[cfg(all(unix))]
        #[allow(dead_code)]
        impl<ReadFn, WatchFn> StubFs<ReadFn, WatchFn>
            where ReadFn: FnMut() -> u8, WatchFn: FnMut() -> ()
        {
            pub fn read(&self) -> u8 {
                ::tagmock::Invoke::invoke(&self.calls, Read, ())
            }
            pub fn watch(&self) -> () {
                ::tagmock::Invoke::invoke(&self.calls, Watch, ())
            }
        }"#;
        let code = r#"
        pub Fs {
            fn read(&self) -> u8;
            #[cfg(unix)]
            fn watch(&self);
        }"#;
        check(desired, code);
    }

    #[test]
    #[should_panic(expected = "Duplicate tag name")]
    fn colliding_tags() {
        let code = r#"
        pub Spider {
            fn crawl(&self, url: String) -> u16;
            fn crawl_(&self, url: String) -> u16;
        }"#;
        do_facade(TokenStream::from_str(code).unwrap());
    }

    #[test]
    #[should_panic(expected = "Duplicate operation name")]
    fn duplicate_operation() {
        let code = r#"
        pub Spider {
            fn crawl(&self, url: String) -> u16;
            fn crawl(&self, url: String) -> u16;
        }"#;
        do_facade(TokenStream::from_str(code).unwrap());
    }

    #[test]
    #[should_panic(expected = "generic interfaces")]
    fn generic_interface() {
        let code = r#"
        pub Cache<V> {
            fn get(&self, key: String) -> V;
        }"#;
        do_facade(TokenStream::from_str(code).unwrap());
    }

    #[test]
    #[should_panic(expected = "must not have bodies")]
    fn operation_with_body() {
        let code = r#"
        pub Console {
            fn log(&self, line: String) {}
        }"#;
        do_facade(TokenStream::from_str(code).unwrap());
    }
}
