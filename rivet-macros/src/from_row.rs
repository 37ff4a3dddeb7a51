use crate::{FieldMetadata, TableMetadata};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

/// Body of `Entity::from_row`.
///
/// Types implementing `Default` start from the default value and overwrite the
/// columns present in the row. The others need every column in the row, fields
/// that are not columns get their own default.
pub(crate) fn from_row(table: &TableMetadata) -> TokenStream {
    let struct_name = &table.ident;
    let trait_name = format_ident!("{}RowFactoryTrait", struct_name);
    let factory_name = format_ident!("{}RowFactory", struct_name);
    let labels = table.columns().map(|c| &c.name).collect::<Vec<_>>();
    let assign_default = table.columns().map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        quote!(result.#ident = <#ty as ::rivet::AsValue>::try_from_value(__value__)?)
    });
    let holders = table.columns().map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        quote!(let mut #ident: ::std::option::Option<#ty> = None;)
    });
    let assign_holder = table.columns().map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        quote!(#ident = Some(<#ty as ::rivet::AsValue>::try_from_value(__value__)?))
    });
    let fields = table.fields.iter().map(|v| {
        let ident = v.ident();
        match v {
            FieldMetadata::Column(c) => {
                let name = &c.name;
                quote!(#ident: #ident.ok_or_else(|| __missing__(#name))?)
            }
            _ => quote!(#ident: ::std::default::Default::default()),
        }
    });
    quote! {
        trait #trait_name {
            fn from_row(row: ::rivet::RowLabeled) -> ::rivet::Result<#struct_name>;
        }
        struct #factory_name<T>(::std::marker::PhantomData<T>);
        #[allow(dead_code)]
        impl<T: ::std::default::Default + ::std::convert::Into<#struct_name>> #factory_name<T> {
            fn from_row(row: ::rivet::RowLabeled) -> ::rivet::Result<#struct_name> {
                let mut result: #struct_name = T::default().into();
                for (__label__, __value__) in ::std::iter::zip(row.labels.iter(), row.values.into_iter()) {
                    match __label__.as_str() {
                        #(#labels => #assign_default,)*
                        _ => {}
                    }
                }
                Ok(result)
            }
        }
        impl<T> #trait_name for #factory_name<T> {
            fn from_row(row: ::rivet::RowLabeled) -> ::rivet::Result<#struct_name> {
                #(#holders)*
                for (__label__, __value__) in ::std::iter::zip(row.labels.iter(), row.values.into_iter()) {
                    match __label__.as_str() {
                        #(#labels => #assign_holder,)*
                        _ => {}
                    }
                }
                let __missing__ = |name: &str| ::rivet::Error::msg(format!(
                    "Column `{}` of `{}` is missing from the row",
                    name,
                    stringify!(#struct_name),
                ));
                Ok(#struct_name {
                    #(#fields,)*
                })
            }
        }
        #factory_name::<#struct_name>::from_row(row)
    }
}
