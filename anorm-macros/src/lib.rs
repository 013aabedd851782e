mod decode_field;
mod entity_name;
mod from_row;

use decode_field::{FieldMetadata, decode_field};
use entity_name::entity_name;
use from_row::from_row;
use proc_macro::TokenStream;
use quote::quote;
use syn::{Fields, ItemStruct, parse_macro_input, spanned::Spanned};

/// Implements `anorm::Entity` for a struct with named fields.
///
/// Fields accept `#[orm("pk{T} c{column} ig{T} ug{T} def{...} join{...}")]`, the struct
/// accepts `#[orm(name = "...")]` to change the name the table naming strategy starts from.
#[proc_macro_derive(Entity, attributes(orm))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemStruct);
    match entity(&item) {
        Ok(v) => v.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn entity(item: &ItemStruct) -> syn::Result<proc_macro2::TokenStream> {
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new(
            item.generics.span(),
            "Entity cannot be derived for a generic struct",
        ));
    }
    let Fields::Named(named) = &item.fields else {
        return Err(syn::Error::new(
            item.span(),
            "Entity can only be derived for a struct with named fields",
        ));
    };
    let name = &item.ident;
    let entity_name = entity_name(item)?;
    let fields = named
        .named
        .iter()
        .map(decode_field)
        .collect::<syn::Result<Vec<_>>>()?;
    let field_defs = fields.iter().map(|f| field_def(name, f));
    let from_row = from_row(&fields);
    Ok(quote! {
        impl ::anorm::Entity for #name {
            fn entity_name() -> &'static str {
                #entity_name
            }

            fn fields() -> &'static [::anorm::FieldDef<Self>] {
                static FIELDS: ::std::sync::LazyLock<Box<[::anorm::FieldDef<#name>]>> =
                    ::std::sync::LazyLock::new(|| vec![#(#field_defs),*].into_boxed_slice());
                &FIELDS
            }

            fn from_row(row: ::anorm::RowLabeled) -> ::anorm::Result<Self> {
                #from_row
            }
        }
    })
}

fn field_def(entity: &syn::Ident, field: &FieldMetadata) -> proc_macro2::TokenStream {
    let FieldMetadata {
        ident,
        name,
        tag,
        ty,
    } = field;
    quote! {
        ::anorm::FieldDef {
            name: #name,
            tag: #tag,
            kind: <#ty as ::anorm::AsValue>::KIND,
            get: |entity: &#entity| ::anorm::AsValue::as_value(::std::clone::Clone::clone(&entity.#ident)),
            example: |entity: &#entity| ::anorm::example_value(&entity.#ident),
            set: |entity: &mut #entity, value: ::anorm::Value| -> ::anorm::Result<()> {
                entity.#ident = <#ty as ::anorm::AsValue>::try_from_value(value)?;
                Ok(())
            },
        }
    }
}
