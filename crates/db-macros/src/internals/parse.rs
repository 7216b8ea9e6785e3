use syn::{punctuated::Punctuated, Attribute, Expr, Field, Ident, Lit, LitStr, Meta, Token};
use super::types::{
    FieldData, ForeignKeyInfo, get_option_inner_type, is_option_type, map_rust_type_to_sql
};

/// `#[table_name = "badges"]`
pub fn parse_table_name_attr(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    for attr in attrs {
        if !attr.path().is_ident("table_name") {
            continue;
        }
        if let Meta::NameValue(mnv) = &attr.meta {
            if let Expr::Lit(expr_lit) = &mnv.value {
                if let Lit::Str(lit_str) = &expr_lit.lit {
                    return Ok(Some(lit_str.value()));
                }
            }
        }
        return Err(syn::Error::new_spanned(
            attr,
            "table_name attribute must be a name-value pair like #[table_name = \"my_table\"]",
        ));
    }
    Ok(None)
}

/// `#[unique_together(user_id, checkin_date)]`, may be repeated.
pub fn parse_unique_together_attrs(attrs: &[Attribute]) -> syn::Result<Vec<Vec<String>>> {
    let mut groups = Vec::new();
    for attr in attrs.iter().filter(|a| a.path().is_ident("unique_together")) {
        let columns = attr.parse_args_with(Punctuated::<Ident, Token![,]>::parse_terminated)?;
        if columns.len() < 2 {
            return Err(syn::Error::new_spanned(attr, "unique_together needs at least two columns"));
        }
        groups.push(columns.iter().map(|c| c.to_string()).collect());
    }
    Ok(groups)
}

/// `#[foreign_key(referenced_table = "badges", related_rust_type = "Badge")]`
pub fn parse_foreign_key_attr(field: &Field) -> syn::Result<Option<ForeignKeyInfo>> {
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("foreign_key")) {
        let mut referenced_table = None;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("referenced_table") {
                let value: LitStr = meta.value()?.parse()?;
                referenced_table = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("related_rust_type") {
                let _: LitStr = meta.value()?.parse()?;
                Ok(())
            } else {
                Err(meta.error("unknown foreign_key option"))
            }
        })?;

        return match referenced_table {
            Some(referenced_table) => Ok(Some(ForeignKeyInfo { referenced_table })),
            None => Err(syn::Error::new_spanned(attr, "foreign_key requires referenced_table")),
        };
    }
    Ok(None)
}

pub fn has_unique_attr(field: &Field) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident("unique"))
}

pub fn has_indexed_attr(field: &Field) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident("indexed"))
}

/// Gathers all relevant data from the struct's fields.
pub fn get_fields_data(fields: &Punctuated<Field, Token![,]>) -> syn::Result<Vec<FieldData>> {
    let mut fields_data = Vec::with_capacity(fields.len());
    for field in fields {
        let field_ident = field.ident.as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "SqlxObject requires named fields"))?;
        let field_ty = &field.ty;
        let is_option = is_option_type(field_ty);
        let type_for_sql = get_option_inner_type(field_ty).unwrap_or_else(|| field_ty.clone());

        fields_data.push(FieldData {
            name: field_ident.to_string(),
            ty: field_ty.clone(),
            is_option,
            is_pk: field_ident == "id",
            sql_type: map_rust_type_to_sql(&type_for_sql),
            foreign_key: parse_foreign_key_attr(field)?,
            unique: has_unique_attr(field),
            indexed: has_indexed_attr(field),
        });
    }

    if !fields_data.iter().any(|f| f.is_pk) {
        return Err(syn::Error::new_spanned(fields, "SqlxObject requires an `id: Uuid` field"));
    }
    Ok(fields_data)
}
