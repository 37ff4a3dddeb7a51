use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use std::{borrow::Cow, cmp::min};
use syn::Path;

pub fn quote_cow<T: ToOwned + ToTokens + ?Sized>(value: &Cow<T>) -> TokenStream
where
    <T as ToOwned>::Owned: ToTokens,
{
    match value {
        Cow::Borrowed(v) => quote! { ::std::borrow::Cow::Borrowed(#v) },
        Cow::Owned(v) => quote! { ::std::borrow::Cow::Borrowed(#v) },
    }
}

/// Compare the trailing segments of `path` with `expect`, so that `Vec`, `vec::Vec`
/// and `std::vec::Vec` all match `["std", "vec", "Vec"]`.
pub fn matches_path(path: &Path, expect: &[&str]) -> bool {
    let len = min(path.segments.len(), expect.len());
    path.segments
        .iter()
        .rev()
        .take(len)
        .map(|v| &v.ident)
        .eq(expect.iter().rev().take(len))
}

pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Cut `value` after 497 characters, marking the cut with `...`.
pub fn truncate_str(value: &str) -> Cow<'_, str> {
    match value.char_indices().nth(497) {
        Some((i, _)) => Cow::Owned(format!("{}...", value[..i].trim_end())),
        None => Cow::Borrowed(value.trim_end()),
    }
}

/// Printable version of a possibly long query.
#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        $crate::truncate_str(::std::convert::AsRef::<str>::as_ref(&$query))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separated_by_skips_empty_items() {
        let mut out = String::from("(");
        separated_by(
            &mut out,
            ["a", "", "b"],
            |out, v| out.push_str(v),
            ", ",
        );
        out.push(')');
        assert_eq!(out, "(a, b)");
    }

    #[test]
    fn matches_path_suffix() {
        let path: Path = syn::parse_quote!(std::vec::Vec);
        assert!(matches_path(&path, &["std", "vec", "Vec"]));
        let path: Path = syn::parse_quote!(Vec);
        assert!(matches_path(&path, &["std", "vec", "Vec"]));
        let path: Path = syn::parse_quote!(other::Vec);
        assert!(!matches_path(&path, &["std", "vec", "Vec"]));
    }

    #[test]
    fn truncate_long_query() {
        let long = "x".repeat(600);
        let printed = format!("{}", truncate_long!(long));
        assert_eq!(printed.len(), 500);
        let wide = "é".repeat(600);
        assert_eq!(truncate_long!(wide).chars().count(), 500);
        assert!(printed.ends_with("..."));
        assert_eq!(format!("{}", truncate_long!("SELECT 1;")), "SELECT 1;");
    }
}
