use crate::{TableRef, Value};
use proc_macro2::TokenStream;
use quote::{ToTokens, TokenStreamExt, quote};

/// Fully qualified reference to a table column.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef {
    /// Column name.
    pub name: &'static str,
    /// Table name.
    pub table: &'static str,
    /// Schema name (may be empty).
    pub schema: &'static str,
}

impl ColumnRef {
    pub fn table(&self) -> TableRef {
        TableRef::new(self.table, self.schema)
    }
}

impl ToTokens for ColumnRef {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let name = self.name;
        let table = self.table;
        let schema = self.schema;
        tokens.append_all(quote! {
            ::rivet::ColumnRef {
                name: #name,
                table: #table,
                schema: #schema,
            }
        });
    }
}

/// Indicates how (or if) a column participates in the primary key.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKeyType {
    /// Single-column primary key.
    PrimaryKey,
    /// Member of a composite primary key.
    PartOfPrimaryKey,
    /// Not part of the primary key.
    #[default]
    None,
}

impl ToTokens for PrimaryKeyType {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        use PrimaryKeyType::*;
        tokens.append_all(match self {
            PrimaryKey => quote!(::rivet::PrimaryKeyType::PrimaryKey),
            PartOfPrimaryKey => quote!(::rivet::PrimaryKeyType::PartOfPrimaryKey),
            None => quote!(::rivet::PrimaryKeyType::None),
        });
    }
}

/// Mapping of one persisted field to its table column.
#[derive(Default, Debug, Clone)]
pub struct ColumnDef {
    /// Column identity.
    pub column_ref: ColumnRef,
    /// Rust field backing the column.
    pub field: &'static str,
    /// Explicit SQL type override (empty => infer from `value`).
    pub column_type: &'static str,
    /// Empty `Value` describing the column type.
    pub value: Value,
    pub nullable: bool,
    pub primary_key: PrimaryKeyType,
    pub unique: bool,
    /// Identity column assigned by the store, never written by inserts or updates.
    pub auto_increment: bool,
}

impl ColumnDef {
    pub fn name(&self) -> &'static str {
        self.column_ref.name
    }
    pub fn table(&self) -> &'static str {
        self.column_ref.table
    }
    pub fn schema(&self) -> &'static str {
        self.column_ref.schema
    }
    pub fn is_primary_key(&self) -> bool {
        self.primary_key != PrimaryKeyType::None
    }
    /// True when either the column or the field is called `name`.
    pub fn is_named(&self, name: &str) -> bool {
        self.column_ref.name == name || self.field == name
    }
}

impl<'a> From<&'a ColumnDef> for &'a ColumnRef {
    fn from(value: &'a ColumnDef) -> Self {
        &value.column_ref
    }
}

impl ToTokens for ColumnDef {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let column_ref = &self.column_ref;
        let field = self.field;
        let column_type = self.column_type;
        let value = &self.value;
        let nullable = self.nullable;
        let primary_key = &self.primary_key;
        let unique = self.unique;
        let auto_increment = self.auto_increment;
        tokens.append_all(quote! {
            ::rivet::ColumnDef {
                column_ref: #column_ref,
                field: #field,
                column_type: #column_type,
                value: #value,
                nullable: #nullable,
                primary_key: #primary_key,
                unique: #unique,
                auto_increment: #auto_increment,
            }
        });
    }
}
