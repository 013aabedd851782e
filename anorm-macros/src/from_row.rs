use crate::decode_field::FieldMetadata;
use proc_macro2::TokenStream;
use quote::quote;

/// Body of `Entity::from_row`: every field is looked up by name in the row labels, a missing
/// label produces the zero value of the field type.
pub(crate) fn from_row(fields: &[FieldMetadata]) -> TokenStream {
    let assignments = fields.iter().map(|f| {
        let ident = &f.ident;
        let name = &f.name;
        let ty = &f.ty;
        quote! {
            #ident: match row.get_column(#name) {
                Some(value) => ::anorm::Context::with_context(
                    <#ty as ::anorm::AsValue>::try_from_value(value.clone()),
                    || format!("While decoding column `{}` of `{}`", #name, <Self as ::anorm::Entity>::entity_name()),
                )?,
                None => <#ty as ::anorm::AsValue>::zero()?,
            }
        }
    });
    quote! {
        Ok(Self {
            #(#assignments,)*
        })
    }
}
