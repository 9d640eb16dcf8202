use crate::attrs::{ContainerAttrs, FieldAttrs};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, format_ident, quote};
use syn::ext::IdentExt;
use syn::{Data, DataStruct, DeriveInput, Field, Fields, Path, parse_macro_input, parse_quote};

pub fn derive_mappable_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let fields = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(named),
            ..
        }) => &named.named,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "#[derive(Mappable)] only supports structs with named fields",
            ));
        }
    };

    let container = ContainerAttrs::parse(&input.attrs)?;
    let krate: Path = container
        .krate
        .clone()
        .unwrap_or_else(|| parse_quote!(::tessera_mapping));

    let ident = &input.ident;
    let type_label = ident.unraw().to_string();
    let attributes = type_attributes(&container, &krate);

    let members = fields
        .iter()
        .map(|field| member(field, &container, &krate))
        .collect::<syn::Result<Vec<_>>>()?;

    // Bound type parameters only. Bounding field types would send the trait
    // solver in circles on recursive types.
    let mut generics = input.generics.clone();
    let params: Vec<_> = input.generics.type_params().map(|p| p.ident.clone()).collect();
    let where_clause = generics.make_where_clause();
    for param in &params {
        where_clause
            .predicates
            .push(parse_quote!(#param: #krate::MapField));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #krate::Mappable for #ident #ty_generics #where_clause {
            fn descriptor() -> #krate::TypeDescriptor {
                #[allow(unused_imports)]
                use #krate::__private::{DescribeDeclared as _, DescribeOpaque as _};

                #krate::TypeDescriptor::of::<Self>(#type_label)
                    .with_attributes(#attributes)
                    #(.with_member(#members))*
            }
        }

        impl #impl_generics #krate::MapField for #ident #ty_generics #where_clause {
            fn shape() -> #krate::TypeShape {
                #krate::TypeShape::Object(<Self as #krate::Mappable>::descriptor)
            }
        }
    })
}

fn member(field: &Field, container: &ContainerAttrs, krate: &Path) -> syn::Result<TokenStream2> {
    let attrs = FieldAttrs::parse(&field.attrs)?;
    let ty = &field.ty;

    let rust_name = match &field.ident {
        Some(ident) => ident.unraw().to_string(),
        None => return Err(syn::Error::new_spanned(field, "expected a named field")),
    };
    let name = match (&attrs.rename, container.rename_all) {
        (Some(rename), _) => rename.clone(),
        (None, Some(rule)) => rule.apply(&rust_name),
        (None, None) => rust_name,
    };

    // Member types without a `MapField` impl describe as opaque objects.
    let described = quote! { (&#krate::__private::Member::<#ty>::new()).describe(#name) };
    if !attrs.has_overrides() {
        return Ok(described);
    }

    let overrides = field_overrides(&attrs, krate);
    Ok(quote! { #described.overrides(#overrides) })
}

fn field_overrides(attrs: &FieldAttrs, krate: &Path) -> TokenStream2 {
    let name = opt_string(&attrs.name);
    let kind = opt_variant(krate, "FieldKind", attrs.kind);
    let index = opt_variant(krate, "IndexOption", attrs.index);
    let store = opt(attrs.store);
    let format = opt_string(&attrs.format);
    let analyzer = opt_string(&attrs.analyzer);
    let index_analyzer = opt_string(&attrs.index_analyzer);
    let search_analyzer = opt_string(&attrs.search_analyzer);
    let ignore_above = opt(attrs.ignore_above);
    let boost = opt(attrs.boost);
    let include_in_all = opt(attrs.include_in_all);
    let opt_out = attrs.opt_out;
    let null_value = match &attrs.null_value {
        Some(lit) => quote! {
            ::core::option::Option::Some(#krate::__private::serde_json::Value::from(#lit))
        },
        None => quote! { ::core::option::Option::None },
    };

    quote! {
        #krate::FieldOverrides {
            name: #name,
            kind: #kind,
            attributes: #krate::FieldAttributes {
                format: #format,
                index: #index,
                store: #store,
                analyzer: #analyzer,
                index_analyzer: #index_analyzer,
                search_analyzer: #search_analyzer,
                ignore_above: #ignore_above,
                null_value: #null_value,
                boost: #boost,
                include_in_all: #include_in_all,
            },
            opt_out: #opt_out,
        }
    }
}

fn type_attributes(container: &ContainerAttrs, krate: &Path) -> TokenStream2 {
    let type_name = opt_string(&container.type_name);
    let index = opt_string(&container.index);
    let dynamic = opt_variant(krate, "DynamicMapping", container.dynamic);
    let date_detection = opt(container.date_detection);
    let numeric_detection = opt(container.numeric_detection);
    let index_analyzer = opt_string(&container.index_analyzer);
    let search_analyzer = opt_string(&container.search_analyzer);

    quote! {
        #krate::TypeAttributes {
            type_name: #type_name,
            index: #index,
            dynamic: #dynamic,
            date_detection: #date_detection,
            numeric_detection: #numeric_detection,
            index_analyzer: #index_analyzer,
            search_analyzer: #search_analyzer,
        }
    }
}

fn opt<T: ToTokens>(value: Option<T>) -> TokenStream2 {
    match value {
        Some(value) => quote! { ::core::option::Option::Some(#value) },
        None => quote! { ::core::option::Option::None },
    }
}

fn opt_string(value: &Option<String>) -> TokenStream2 {
    match value {
        Some(value) => quote! {
            ::core::option::Option::Some(::std::string::String::from(#value))
        },
        None => quote! { ::core::option::Option::None },
    }
}

fn opt_variant(krate: &Path, ty: &str, variant: Option<&str>) -> TokenStream2 {
    match variant {
        Some(variant) => {
            let ty = format_ident!("{}", ty);
            let variant = format_ident!("{}", variant);
            quote! { ::core::option::Option::Some(#krate::#ty::#variant) }
        }
        None => quote! { ::core::option::Option::None },
    }
}
