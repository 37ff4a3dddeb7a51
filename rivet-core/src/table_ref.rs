use crate::quote_cow;
use proc_macro2::TokenStream;
use quote::{ToTokens, TokenStreamExt, quote};
use std::{
    borrow::Cow,
    fmt::{self, Display},
};

/// Schema qualified table name.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: Cow<'static, str>,
    pub schema: Cow<'static, str>,
}

impl TableRef {
    pub const fn new(name: &'static str, schema: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            schema: Cow::Borrowed(schema),
        }
    }
    pub fn full_name(&self) -> String {
        let mut result = String::with_capacity(self.schema.len() + self.name.len() + 1);
        if !self.schema.is_empty() {
            result.push_str(&self.schema);
            result.push('.');
        }
        result.push_str(&self.name);
        result
    }
}

impl Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.schema.is_empty() {
            write!(f, "{}.", self.schema)?;
        }
        f.write_str(&self.name)
    }
}

impl ToTokens for TableRef {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let name = quote_cow(&self.name);
        let schema = quote_cow(&self.schema);
        tokens.append_all(quote! {
            ::rivet::TableRef {
                name: #name,
                schema: #schema,
            }
        });
    }
}
