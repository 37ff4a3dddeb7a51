mod decode_cascade;
mod decode_column;
mod decode_table;
mod from_row;

use decode_column::FieldMetadata;
use decode_table::{TableMetadata, decode_table};
use from_row::from_row;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use rivet_core::PrimaryKeyType;
use syn::{ItemStruct, parse_macro_input};

/// Map a struct onto a table.
///
/// Table attributes: `name`, `schema`, `primary_key = ("a", ..)` and any
/// number of `where_condition(name = "..", columns = ("a", ..))`.
/// Field attributes: `name`, `type`, `primary_key`, `auto_increment`,
/// `unique`, `ignore` and `cascade(..)` for fields holding related rows.
#[proc_macro_derive(Entity, attributes(rivet))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemStruct);
    match decode_table(&item) {
        Ok(table) => encode_entity(&table).into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn encode_columns(table: &TableMetadata) -> Vec<TokenStream2> {
    let table_name = &table.name;
    let schema_name = &table.schema;
    let primary_key = table.columns().filter(|c| c.primary_key).count();
    table
        .columns()
        .map(|c| {
            let name = &c.name;
            let field = c.ident.to_string();
            let column_type = &c.column_type;
            let value = &c.value;
            let nullable = c.nullable;
            let primary_key = match (c.primary_key, primary_key) {
                (false, _) => PrimaryKeyType::None,
                (true, 1) => PrimaryKeyType::PrimaryKey,
                (true, _) => PrimaryKeyType::PartOfPrimaryKey,
            };
            let unique = c.unique;
            let auto_increment = c.auto_increment;
            quote! {
                ::rivet::ColumnDef {
                    column_ref: ::rivet::ColumnRef {
                        name: #name,
                        table: #table_name,
                        schema: #schema_name,
                    },
                    field: #field,
                    column_type: #column_type,
                    value: #value,
                    nullable: #nullable,
                    primary_key: #primary_key,
                    unique: #unique,
                    auto_increment: #auto_increment,
                }
            }
        })
        .collect()
}

fn encode_where_defs(table: &TableMetadata) -> Vec<TokenStream2> {
    table
        .where_conditions
        .iter()
        .map(|v| {
            let name = &v.name;
            let columns = &v.columns;
            quote!(::rivet::WhereDef { name: #name, columns: &[#(#columns),*] })
        })
        .collect()
}

fn encode_cascades(table: &TableMetadata) -> Vec<TokenStream2> {
    table
        .related()
        .flat_map(|related| {
            let field = related.ident.to_string();
            let ty = &related.ty;
            related.cascades.iter().map(move |c| {
                let kind = &c.kind;
                let operation = &c.operation;
                let post = c.post;
                let where_condition = match &c.where_condition {
                    Some(v) => quote!(Some(#v)),
                    None => quote!(None),
                };
                let parameters = &c.parameters;
                let foreign_key = &c.foreign_key;
                quote! {
                    ::rivet::CascadeRule {
                        field: #field,
                        kind: #kind,
                        operation: #operation,
                        post: #post,
                        relationship: <#ty as ::rivet::Related>::RELATIONSHIP,
                        target: <<#ty as ::rivet::Related>::Row as ::rivet::Entity>::table(),
                        where_condition: #where_condition,
                        source_parameters: &[#(#parameters),*],
                        foreign_key: &[#(#foreign_key),*],
                    }
                }
            })
        })
        .collect()
}

fn encode_entity(table: &TableMetadata) -> TokenStream2 {
    let name = &table.ident;
    let table_name = &table.name;
    let schema_name = &table.schema;
    let columns = encode_columns(table);
    let where_defs = encode_where_defs(table);
    let where_defs_len = where_defs.len();
    let cascades = encode_cascades(table);
    let from_row = from_row(table);
    let field_names = table
        .columns()
        .map(|c| {
            let names = c.names();
            quote!(#(#names)|*)
        })
        .collect::<Vec<_>>();
    let field_idents = table.columns().map(|c| &c.ident).collect::<Vec<_>>();
    let field_types = table.columns().map(|c| &c.ty).collect::<Vec<_>>();
    let cascade = if cascades.is_empty() {
        TokenStream2::new()
    } else {
        let arms = table.related().map(|related| {
            let ident = &related.ident;
            let field = ident.to_string();
            let ty = &related.ty;
            quote! {
                #field => ::std::boxed::Box::pin(
                    ::rivet::CascadeOperation::new(
                        rule,
                        ::rivet::FieldAccessor::<#name, #ty>::new(
                            #field,
                            |s| &s.#ident,
                            |s| &mut s.#ident,
                        ),
                    )
                    .execute(executor, self),
                ),
            }
        });
        quote! {
            fn cascades() -> &'static [::rivet::CascadeRule] {
                static RESULT: ::std::sync::LazyLock<::std::boxed::Box<[::rivet::CascadeRule]>> =
                    ::std::sync::LazyLock::new(|| ::std::vec![#(#cascades),*].into_boxed_slice());
                &RESULT
            }

            fn cascade<'a, Exec: ::rivet::Executor>(
                &'a mut self,
                executor: &'a mut Exec,
                rule: &'static ::rivet::CascadeRule,
            ) -> ::rivet::future::BoxFuture<'a, ::rivet::Result<::rivet::RowsAffected>> {
                match rule.field {
                    #(#arms)*
                    _ => {
                        let error = ::rivet::Error::msg(format!(
                            "`{}` has no cascade on field `{}`",
                            stringify!(#name),
                            rule.field
                        ));
                        ::std::boxed::Box::pin(async move { Err(error) })
                    }
                }
            }
        }
    };
    quote! {
        impl ::rivet::Entity for #name {
            fn table() -> &'static ::rivet::TableRef {
                static TABLE: ::rivet::TableRef = ::rivet::TableRef::new(#table_name, #schema_name);
                &TABLE
            }

            fn columns() -> &'static [::rivet::ColumnDef] {
                static RESULT: ::std::sync::LazyLock<::std::boxed::Box<[::rivet::ColumnDef]>> =
                    ::std::sync::LazyLock::new(|| ::std::vec![#(#columns),*].into_boxed_slice());
                &RESULT
            }

            fn where_defs() -> &'static [::rivet::WhereDef] {
                static RESULT: [::rivet::WhereDef; #where_defs_len] = [#(#where_defs),*];
                &RESULT
            }

            fn from_row(row: ::rivet::RowLabeled) -> ::rivet::Result<Self> {
                #from_row
            }

            fn get_field(&self, name: &str) -> ::rivet::Result<::rivet::Value> {
                match name {
                    #(#field_names => Ok(::rivet::AsValue::as_value(::std::clone::Clone::clone(&self.#field_idents))),)*
                    _ => Err(::rivet::Error::msg(format!(
                        "`{}` has no column field `{}`",
                        stringify!(#name),
                        name
                    ))),
                }
            }

            fn set_field(&mut self, name: &str, value: ::rivet::Value) -> ::rivet::Result<()> {
                match name {
                    #(#field_names => {
                        self.#field_idents = ::rivet::Context::with_context(
                            <#field_types as ::rivet::AsValue>::try_from_value(value),
                            || format!("While setting `{}.{}`", stringify!(#name), name),
                        )?;
                        Ok(())
                    })*
                    _ => Err(::rivet::Error::msg(format!(
                        "`{}` has no column field `{}`",
                        stringify!(#name),
                        name
                    ))),
                }
            }

            #cascade
        }
    }
}
