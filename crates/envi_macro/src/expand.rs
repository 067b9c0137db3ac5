//! Code generation orchestration for the `Config` derive macro.
//!
//! The [`Expander`] validates the input, collects the loadable fields and
//! emits two impls:
//!
//! | Impl | Purpose |
//! |------|---------|
//! | `::envi::Config` | field descriptors, type name, and `decode` when `#[envi(serde)]` is set |
//! | `::envi::Kind` | lets the struct appear as a nested record (directly, in `Option`, `Box` or `Watched`) |

use proc_macro2::TokenStream as QuoteStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::token::Comma;
use syn::{Data, DeriveInput, Error as SynError, Field, Fields, Result as SynResult};

use crate::field::FieldSpec;
use crate::parse::ContainerAttr;

/// The main orchestrator for macro expansion.
pub struct Expander;

impl Expander {
    /// Main entry point for expanding the derive macro.
    pub fn expand(input: &DeriveInput) -> SynResult<QuoteStream> {
        let struct_name = &input.ident;
        let type_name = struct_name.to_string();
        let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

        let container = ContainerAttr::parse_from_struct(input)?;
        let fields = Self::extract_struct_fields(input)?;
        let specs = FieldSpec::collect(fields)?;

        let descriptors = specs.iter().map(FieldSpec::descriptor);
        let zero_checks = specs.iter().map(FieldSpec::zero_check);

        let decode_impl = if container.serde {
            quote! {
                fn decode(
                    &mut self,
                    format: ::envi::Format,
                    content: &str,
                    origin: &::std::path::Path,
                ) -> ::core::result::Result<(), ::envi::DecodeError> {
                    ::envi::codec::merge_into(self, format, content, origin)
                }
            }
        } else {
            quote! {}
        };

        Ok(quote! {
            impl #impl_generics ::envi::Config for #struct_name #ty_generics #where_clause {
                fn fields(&mut self) -> ::std::vec::Vec<::envi::Field<'_>> {
                    ::std::vec![#(#descriptors),*]
                }

                fn type_name(&self) -> &'static str {
                    #type_name
                }

                #decode_impl
            }

            impl #impl_generics ::envi::Kind for #struct_name #ty_generics #where_clause {
                fn slot(&mut self) -> ::envi::Slot<'_> {
                    ::envi::Slot::Record(self)
                }

                fn is_zero(&self) -> bool {
                    true #(&& #zero_checks)*
                }
            }
        })
    }

    /// Validates that the input is a struct with named fields and returns them.
    fn extract_struct_fields(input: &DeriveInput) -> SynResult<&Punctuated<Field, Comma>> {
        match &input.data {
            Data::Struct(data_struct) => match &data_struct.fields {
                // Named fields: struct Foo { bar: i32 }
                Fields::Named(fields_named) => Ok(&fields_named.named),

                // Tuple struct: struct Foo(i32)
                Fields::Unnamed(_) => Err(SynError::new_spanned(
                    input,
                    "Config does not support tuple structs",
                )),

                // Unit struct: struct Foo;
                Fields::Unit => Err(SynError::new_spanned(
                    input,
                    "Config does not support unit structs",
                )),
            },

            Data::Enum(_) => Err(SynError::new_spanned(
                input,
                "Config can only be derived for structs, not enums",
            )),

            Data::Union(_) => Err(SynError::new_spanned(
                input,
                "Config can only be derived for structs, not unions",
            )),
        }
    }
}
