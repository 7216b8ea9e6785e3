mod internals;

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DataStruct, DeriveInput, Fields};

use internals::{codegen, parse};

/// Derives `SqlxSchema`, `SqlxCrud` and `SqlxFilterQuery` for a struct with an
/// `id: Uuid` primary key.
///
/// Field attributes: `#[unique]`, `#[indexed]`,
/// `#[foreign_key(referenced_table = "...", related_rust_type = "...")]`.
/// Struct attributes: `#[table_name = "..."]`, `#[unique_together(a, b)]`.
#[proc_macro_derive(SqlxObject, attributes(table_name, unique, indexed, foreign_key, unique_together))]
pub fn sqlx_object_derive(input: TokenStream) -> TokenStream {
    let input_ast = parse_macro_input!(input as DeriveInput);
    match expand_sqlx_object(&input_ast) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_sqlx_object(input_ast: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let struct_name = &input_ast.ident;
    let row_struct_name = format_ident!("{}RowSqlx", struct_name);

    let fields = match &input_ast.data {
        Data::Struct(DataStruct { fields: Fields::Named(fields_named), .. }) => &fields_named.named,
        _ => return Err(syn::Error::new_spanned(struct_name, "SqlxObject can only be derived for structs with named fields")),
    };

    let table_name_str = parse::parse_table_name_attr(&input_ast.attrs)?
        .unwrap_or_else(|| struct_name.to_string().to_lowercase());
    let unique_together = parse::parse_unique_together_attrs(&input_ast.attrs)?;
    let fields_data = parse::get_fields_data(fields)?;

    for group in &unique_together {
        for column in group {
            if !fields_data.iter().any(|f| &f.name == column) {
                return Err(syn::Error::new_spanned(
                    struct_name,
                    format!("unique_together references unknown column `{}`", column),
                ));
            }
        }
    }

    let row_struct = codegen::generate_row_struct(&row_struct_name, &fields_data);
    let schema_impl = codegen::generate_sqlx_schema_impl(
        struct_name, &row_struct_name, &table_name_str, &fields_data, &unique_together,
    );
    let crud_impl = codegen::generate_sqlx_crud_impl(struct_name, &fields_data);
    let filter_impl = codegen::generate_sqlx_filter_query_impl(struct_name);

    Ok(quote! {
        #row_struct
        #schema_impl
        #crud_impl
        #filter_impl
    })
}
