//! Per-field code generation.
//!
//! Each loadable field becomes a [`FieldSpec`], which knows how to emit the
//! field's runtime descriptor (`::envi::Field`) and its zero-value check.
//!
//! A field is loadable when it is `pub` and not marked `skip`. Other fields
//! are invisible to the loader and need no attribute.

use proc_macro2::TokenStream as QuoteStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::token::Comma;
use syn::{Field, Ident, Result as SynResult, Visibility};

use crate::parse::{FieldAttr, Parser};

/// A loadable field and its parsed attribute.
pub struct FieldSpec<'a> {
    ident: &'a Ident,
    attr: FieldAttr,
}

impl<'a> FieldSpec<'a> {
    /// Collects the loadable fields of a struct, in declaration order.
    pub fn collect(fields: &'a Punctuated<Field, Comma>) -> SynResult<Vec<Self>> {
        let mut specs = Vec::with_capacity(fields.len());

        for field in fields {
            if !matches!(field.vis, Visibility::Public(_)) {
                continue;
            }

            let Some(ident) = field.ident.as_ref() else {
                continue;
            };

            if let Some(attr) = Parser::parse_field_attr(field)? {
                specs.push(Self { ident, attr });
            }
        }

        Ok(specs)
    }

    /// The name used in error messages and validation paths.
    fn name(&self) -> String {
        self.ident.unraw().to_string()
    }

    /// `::envi::Field::new("name", Tags { .. }, &mut self.name)`
    pub fn descriptor(&self) -> QuoteStream {
        let ident = self.ident;
        let name = self.name();

        let env = quote_option(self.attr.env.as_deref());
        let default = quote_option(self.attr.default.as_deref());
        let format = quote_option(self.attr.format.as_deref());
        let required = self.attr.required;
        let watch = self.attr.watch;

        quote! {
            ::envi::Field::new(
                #name,
                ::envi::Tags {
                    env: #env,
                    default: #default,
                    format: #format,
                    required: #required,
                    watch: #watch,
                },
                &mut self.#ident,
            )
        }
    }

    /// `::envi::Kind::is_zero(&self.name)`
    pub fn zero_check(&self) -> QuoteStream {
        let ident = self.ident;
        quote! { ::envi::Kind::is_zero(&self.#ident) }
    }
}

fn quote_option(value: Option<&str>) -> QuoteStream {
    match value {
        Some(value) => quote! { ::core::option::Option::Some(#value) },
        None => quote! { ::core::option::Option::None },
    }
}

#[cfg(test)]
mod tests {
    use syn::{FieldsNamed, parse_quote};

    use super::*;

    #[test]
    fn test_collect_skips_private_and_skipped() {
        let fields: FieldsNamed = parse_quote! {{
            #[envi(default = "a")]
            pub visible: String,
            hidden: String,
            pub(crate) internal: String,
            #[envi(skip)]
            pub skipped: String,
        }};

        let specs = FieldSpec::collect(&fields.named).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name(), "visible");
    }

    #[test]
    fn test_raw_identifier_name() {
        let fields: FieldsNamed = parse_quote! {{
            #[envi(default = "json")]
            pub r#type: String,
        }};

        let specs = FieldSpec::collect(&fields.named).unwrap();
        assert_eq!(specs[0].name(), "type");
    }

    #[test]
    fn test_descriptor_tokens() {
        let fields: FieldsNamed = parse_quote! {{
            #[envi(env = "HOST", required)]
            pub host: String,
        }};

        let specs = FieldSpec::collect(&fields.named).unwrap();
        let tokens = specs[0].descriptor().to_string();

        assert!(tokens.contains("\"host\""));
        assert!(tokens.contains("Some (\"HOST\")"));
        assert!(tokens.contains("required : true"));
        assert!(tokens.contains("watch : false"));
    }
}
