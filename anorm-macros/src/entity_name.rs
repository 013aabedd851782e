use syn::{ItemStruct, LitStr, ext::IdentExt};

/// `#[orm(name = "...")]` on the struct, otherwise the struct name.
pub(crate) fn entity_name(item: &ItemStruct) -> syn::Result<String> {
    let mut name = None::<String>;
    for attr in item.attrs.iter().filter(|v| v.path().is_ident("orm")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("Unknown attribute, expected `name = \"...\"`"))
            }
        })?;
    }
    Ok(name.unwrap_or_else(|| item.ident.unraw().to_string()))
}
