use syn::{Field, Ident, LitStr, Type, ext::IdentExt, spanned::Spanned};

pub(crate) struct FieldMetadata {
    pub(crate) ident: Ident,
    /// Field name without the raw identifier prefix.
    pub(crate) name: String,
    /// Content of `#[orm("...")]`, empty when missing.
    pub(crate) tag: String,
    pub(crate) ty: Type,
}

pub(crate) fn decode_field(field: &Field) -> syn::Result<FieldMetadata> {
    let Some(ident) = field.ident.clone() else {
        return Err(syn::Error::new(field.span(), "Field must have a name"));
    };
    let mut tag = None::<String>;
    for attr in field.attrs.iter().filter(|v| v.path().is_ident("orm")) {
        if tag.is_some() {
            return Err(syn::Error::new(
                attr.span(),
                format!("Field `{}` declares `#[orm(...)]` more than once", ident),
            ));
        }
        let value: LitStr = attr.parse_args().map_err(|e| {
            syn::Error::new(
                e.span(),
                "Expected a string literal: #[orm(\"pk{T} c{column}\")]",
            )
        })?;
        tag = Some(value.value());
    }
    Ok(FieldMetadata {
        name: ident.unraw().to_string(),
        ident,
        tag: tag.unwrap_or_default(),
        ty: field.ty.clone(),
    })
}
