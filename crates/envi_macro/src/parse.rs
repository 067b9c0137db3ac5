//! Attribute parsing for `#[envi(env = "VAR", default = "value", required, watch)]`
//!
//! This module extracts configuration from field and struct attributes. It
//! uses syn's `ParseNestedMeta`, which gives comma handling and precise error
//! spans for free, and adds duplicate option detection on top.
//!
//! # Supported Syntax
//!
//! ## Field-level attributes
//!
//! ```ignore
//! #[envi(env = "HOST", default = "localhost")]          // Env with fallback
//! #[envi(default = "8080")]                              // Default only
//! #[envi(env = "TOKEN", required)]                       // Must end up non-zero
//! #[envi(env = "DB_FILE", default = "db.json", type = "json")]
//! #[envi(env = "DB_FILE", default = "db.yaml", watch)]  // Watched<T> field
//! #[envi(skip)]                                          // Not loaded
//! ```
//!
//! `type` is not checked here: an unknown format is reported by the loader,
//! with the field's name, when the field is populated.
//!
//! ## Struct-level attributes
//!
//! ```ignore
//! #[envi(serde)]      // Decode JSON/YAML through the struct's serde impls
//! ```

use std::collections::HashSet;

use syn::meta::ParseNestedMeta;
use syn::{Attribute, DeriveInput, Error as SynError, Field, LitStr, Result as SynResult};

/// The attribute name shared by fields and structs.
const ATTR: &str = "envi";

/// The parsed result of a field's `#[envi(...)]` attribute.
#[derive(Clone, Debug, Default)]
pub struct FieldAttr {
    /// Environment variable holding the value (or the file path).
    pub env: Option<String>,

    /// Default value (or default file path).
    pub default: Option<String>,

    /// File format of a record field, passed through verbatim.
    pub format: Option<String>,

    pub required: bool,

    pub watch: bool,
}

/// The parsed result of a struct's `#[envi(...)]` attribute.
#[derive(Clone, Debug, Default)]
pub struct ContainerAttr {
    /// Generate `Config::decode` through serde.
    pub serde: bool,
}

/// Builder for `#[envi(...)]` field attributes.
///
/// Options are accumulated one at a time by [`Parser::parse_meta`], then
/// checked for conflicting combinations in [`Parser::build`].
#[derive(Default)]
pub struct Parser {
    env: Option<String>,
    default: Option<String>,
    format: Option<String>,
    required: bool,
    watch: bool,
    skip: bool,

    /// Options seen so far, for duplicate detection.
    seen: HashSet<&'static str>,
}

impl Parser {
    /// Parse the `#[envi(...)]` attribute of a field.
    ///
    /// Returns `None` for fields marked `skip`. A field without the
    /// attribute yields an empty [`FieldAttr`]; the loader rejects it at
    /// runtime if it has neither `env` nor `default`.
    pub fn parse_field_attr(field: &Field) -> SynResult<Option<FieldAttr>> {
        let mut parser = Self::default();
        let mut found: Option<&Attribute> = None;

        for attr in &field.attrs {
            if !attr.path().is_ident(ATTR) {
                continue;
            }

            if found.is_some() {
                return Err(SynError::new_spanned(
                    attr,
                    "Duplicate `#[envi(...)]` attribute, merge the options into one",
                ));
            }

            attr.parse_nested_meta(|meta| parser.parse_meta(meta))?;
            found = Some(attr);
        }

        match found {
            Some(attr) => parser.build(attr),
            None => Ok(Some(FieldAttr::default())),
        }
    }

    /// Parse a single option from the attribute.
    #[expect(
        clippy::needless_pass_by_value,
        reason = "ParseNestedMeta is passed by value per syn's parse_nested_meta callback signature"
    )]
    fn parse_meta(&mut self, meta: ParseNestedMeta) -> SynResult<()> {
        let ident = meta
            .path
            .get_ident()
            .ok_or_else(|| meta.error("Expected identifier"))?;
        let name = ident.to_string();

        let key: &'static str = match name.as_str() {
            "env" => "env",
            "default" => "default",
            "type" => "type",
            "required" => "required",
            "watch" => "watch",
            "skip" => "skip",
            _ => return Err(meta.error(format!("Unknown option `{name}`"))),
        };

        // #[envi(env = "X", env = "Y")]
        if !self.seen.insert(key) {
            return Err(meta.error(format!("Duplicate option: `{key}`")));
        }

        match key {
            "env" => {
                let lit: LitStr = meta.value()?.parse()?;
                if lit.value().is_empty() {
                    return Err(SynError::new_spanned(lit, "`env` must name a variable"));
                }
                self.env = Some(lit.value());
            }
            "default" => {
                let lit: LitStr = meta.value()?.parse()?;
                self.default = Some(lit.value());
            }
            "type" => {
                let lit: LitStr = meta.value()?.parse()?;
                self.format = Some(lit.value());
            }
            "required" => self.required = true,
            "watch" => self.watch = true,
            "skip" => self.skip = true,
            _ => unreachable!("option keys are matched above"),
        }

        Ok(())
    }

    fn build(self, attr: &Attribute) -> SynResult<Option<FieldAttr>> {
        if self.skip {
            if self.seen.len() > 1 {
                return Err(SynError::new_spanned(
                    attr,
                    "`skip` cannot be combined with other options",
                ));
            }
            return Ok(None);
        }

        Ok(Some(FieldAttr {
            env: self.env,
            default: self.default,
            format: self.format,
            required: self.required,
            watch: self.watch,
        }))
    }
}

impl ContainerAttr {
    /// Parse the struct-level `#[envi(...)]` attribute, if any.
    pub fn parse_from_struct(input: &DeriveInput) -> SynResult<Self> {
        let mut result = Self::default();
        let mut seen: HashSet<&'static str> = HashSet::new();

        for attr in input.attrs.iter().filter(|a| a.path().is_ident(ATTR)) {
            attr.parse_nested_meta(|meta| {
                let key = if meta.path.is_ident("serde") {
                    "serde"
                } else {
                    let name = meta
                        .path
                        .get_ident()
                        .map_or_else(|| "?".to_string(), ToString::to_string);
                    return Err(meta.error(format!("Unknown struct option `{name}`")));
                };

                if !seen.insert(key) {
                    return Err(meta.error(format!("Duplicate option: `{key}`")));
                }

                result.serde = true;
                Ok(())
            })?;
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;

    fn field(input: Field) -> SynResult<Option<FieldAttr>> {
        Parser::parse_field_attr(&input)
    }

    #[test]
    fn test_parse_all_options() {
        let attr = field(parse_quote! {
            #[envi(env = "DB_FILE", default = "db.json", type = "json", required, watch)]
            pub db: Db
        })
        .unwrap()
        .unwrap();

        assert_eq!(attr.env.as_deref(), Some("DB_FILE"));
        assert_eq!(attr.default.as_deref(), Some("db.json"));
        assert_eq!(attr.format.as_deref(), Some("json"));
        assert!(attr.required);
        assert!(attr.watch);
    }

    #[test]
    fn test_missing_attribute_is_empty() {
        let attr = field(parse_quote! { pub name: String }).unwrap().unwrap();
        assert!(attr.env.is_none());
        assert!(attr.default.is_none());
    }

    #[test]
    fn test_skip() {
        let attr = field(parse_quote! {
            #[envi(skip)]
            pub cache: Vec<u8>
        })
        .unwrap();
        assert!(attr.is_none());
    }

    #[test]
    fn test_skip_with_other_options_fails() {
        let err = field(parse_quote! {
            #[envi(skip, default = "x")]
            pub name: String
        })
        .unwrap_err();
        assert!(err.to_string().contains("skip"));
    }

    #[test]
    fn test_duplicate_option() {
        let err = field(parse_quote! {
            #[envi(env = "A", env = "B")]
            pub name: String
        })
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate option"));
    }

    #[test]
    fn test_unknown_option() {
        let err = field(parse_quote! {
            #[envi(var = "A")]
            pub name: String
        })
        .unwrap_err();
        assert!(err.to_string().contains("Unknown option `var`"));
    }

    #[test]
    fn test_container_serde() {
        let input: DeriveInput = parse_quote! {
            #[envi(serde)]
            pub struct Db { pub user: String }
        };
        assert!(ContainerAttr::parse_from_struct(&input).unwrap().serde);

        let input: DeriveInput = parse_quote! {
            #[envi(prefix = "X")]
            pub struct Db { pub user: String }
        };
        assert!(ContainerAttr::parse_from_struct(&input).is_err());
    }
}
