use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Ident, LitStr, Type, parse_quote};
use super::types::{FieldData, get_option_inner_type};

pub fn generate_row_struct(row_struct_name: &Ident, fields_data: &[FieldData]) -> TokenStream {
    let row_struct_fields_defs: Vec<TokenStream> = fields_data.iter().map(|field| {
        let field_ident = format_ident!("{}", field.name);
        let row_field_ty: Type = if field.is_text_mapped() {
            if field.is_option { parse_quote!(Option<String>) } else { parse_quote!(String) }
        } else {
            field.ty.clone()
        };
        quote! { pub #field_ident: #row_field_ty }
    }).collect();

    quote! {
        #[derive(::sqlx::FromRow, Debug, Clone)]
        #[automatically_derived]
        pub struct #row_struct_name {
            #(#row_struct_fields_defs),*
        }
    }
}

pub fn generate_sqlx_schema_impl(
    struct_name: &Ident,
    row_struct_name: &Ident,
    table_name_str: &str,
    fields_data: &[FieldData],
    unique_together: &[Vec<String>],
) -> TokenStream {
    let all_sql_column_names_str_lits: Vec<LitStr> = fields_data.iter()
        .map(|f| LitStr::new(&f.name, proc_macro2::Span::call_site()))
        .collect();

    let from_row_assignments = generate_from_row_assignments(fields_data);

    let (create_table_sql_query, create_index_sqls) = generate_create_table_sql(table_name_str, fields_data, unique_together);
    let drop_table_sql_query = format!("DROP TABLE IF EXISTS \"{}\" CASCADE", table_name_str);
    let insert_sql_query = generate_insert_sql(table_name_str, fields_data);

    quote! {
        #[automatically_derived]
        impl ::hotwheels_database::SqlxSchema for #struct_name {
            type Id = ::sqlx::types::Uuid;
            type Row = #row_struct_name;

            const TABLE_NAME: &'static str = #table_name_str;
            const ID_COLUMN_NAME: &'static str = "id";
            const COLUMNS: &'static [&'static str] = &[#( #all_sql_column_names_str_lits ),*];
            const INDEXES_SQL: &'static [&'static str] = &[#( #create_index_sqls ),*];

            fn get_id_value(&self) -> Self::Id { self.id }

            fn from_row(row: Self::Row) -> Self {
                Self {
                    #(#from_row_assignments),*
                }
            }

            fn insert_sql() -> String { #insert_sql_query.to_string() }
            fn create_table_sql() -> String { #create_table_sql_query.to_string() }
            fn drop_table_sql() -> String { #drop_table_sql_query.to_string() }
        }
    }
}

pub fn generate_sqlx_crud_impl(struct_name: &Ident, fields_data: &[FieldData]) -> TokenStream {
    let insert_bindings = generate_bind_streams(fields_data);

    quote! {
        #[automatically_derived]
        #[::async_trait::async_trait]
        impl ::hotwheels_database::SqlxCrud for #struct_name {
            fn bind_insert<'q>(
                &self,
                query: ::sqlx::query::QueryAs<'q, ::sqlx::Postgres, <Self as ::hotwheels_database::SqlxSchema>::Row, ::sqlx::postgres::PgArguments>
            ) -> ::sqlx::query::QueryAs<'q, ::sqlx::Postgres, <Self as ::hotwheels_database::SqlxSchema>::Row, ::sqlx::postgres::PgArguments> {
                query #(#insert_bindings)*
            }
        }
    }
}

pub fn generate_sqlx_filter_query_impl(struct_name: &Ident) -> TokenStream {
    quote! {
        #[automatically_derived]
        impl ::hotwheels_database::SqlxFilterQuery for #struct_name {}
    }
}

fn generate_from_row_assignments(fields_data: &[FieldData]) -> Vec<TokenStream> {
    fields_data.iter().map(|field| {
        let field_ident = format_ident!("{}", field.name);
        if field.is_text_mapped() {
            let target_ty = get_option_inner_type(&field.ty).unwrap_or_else(|| field.ty.clone());
            if field.is_option {
                quote! { #field_ident: row.#field_ident.map(|s| s.parse().unwrap_or_else(|_| <#target_ty>::default())) }
            } else {
                quote! { #field_ident: row.#field_ident.parse().unwrap_or_else(|_| <#target_ty>::default()) }
            }
        } else {
            quote! { #field_ident: row.#field_ident }
        }
    }).collect()
}

fn generate_create_table_sql(
    table_name_str: &str,
    fields_data: &[FieldData],
    unique_together: &[Vec<String>],
) -> (String, Vec<LitStr>) {
    let mut create_table_parts: Vec<String> = Vec::new();
    let mut constraint_clauses: Vec<String> = Vec::new();
    let mut create_index_sqls: Vec<LitStr> = Vec::new();

    for field in fields_data {
        let mut col_def_parts = vec![format!("\"{}\"", field.name)];

        if field.is_pk {
            col_def_parts.push("UUID PRIMARY KEY DEFAULT gen_random_uuid()".to_string());
        } else if field.name == "created_at" {
            col_def_parts.push("BIGINT NOT NULL DEFAULT floor(extract(epoch from now()))".to_string());
        } else {
            col_def_parts.push(field.sql_type.clone());
            if !field.is_option {
                col_def_parts.push("NOT NULL".to_string());
            }
        }

        if field.unique {
            col_def_parts.push("UNIQUE".to_string());
        }

        if field.indexed {
            let index_sql = format!(
                "CREATE INDEX IF NOT EXISTS \"idx_{table}_{col}\" ON \"{table}\"(\"{col}\")",
                table = table_name_str,
                col = field.name
            );
            create_index_sqls.push(LitStr::new(&index_sql, proc_macro2::Span::call_site()));
        }

        create_table_parts.push(col_def_parts.join(" "));

        if let Some(fk_info) = &field.foreign_key {
            let on_delete = if field.is_option { "SET NULL" } else { "CASCADE" };
            constraint_clauses.push(format!(
                "FOREIGN KEY (\"{}\") REFERENCES \"{}\"(\"id\") ON DELETE {}",
                field.name, fk_info.referenced_table, on_delete
            ));
        }
    }

    for columns in unique_together {
        let quoted = columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ");
        constraint_clauses.push(format!(
            "CONSTRAINT \"uq_{}_{}\" UNIQUE ({})",
            table_name_str, columns.join("_"), quoted
        ));
    }

    create_table_parts.extend(constraint_clauses);
    let create_table_sql_query = format!("CREATE TABLE IF NOT EXISTS \"{}\" ({})", table_name_str, create_table_parts.join(", "));

    (create_table_sql_query, create_index_sqls)
}

fn generate_insert_sql(table_name_str: &str, fields_data: &[FieldData]) -> String {
    let insert_col_sql_names: Vec<String> = fields_data.iter()
        .filter(|f| !f.is_db_managed())
        .map(|f| format!("\"{}\"", f.name))
        .collect();

    let insert_bind_placeholders_sql = (1..=insert_col_sql_names.len())
        .map(|i| format!("${}", i))
        .collect::<Vec<String>>()
        .join(", ");

    let all_sql_columns_joined_str = fields_data.iter()
        .map(|f| format!("\"{}\"", f.name))
        .collect::<Vec<String>>()
        .join(", ");

    format!(
        "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING {}",
        table_name_str, insert_col_sql_names.join(", "), insert_bind_placeholders_sql, all_sql_columns_joined_str
    )
}

fn generate_bind_streams(fields_data: &[FieldData]) -> Vec<TokenStream> {
    fields_data.iter()
        .filter(|f| !f.is_db_managed())
        .map(|field| {
            let field_ident = format_ident!("{}", field.name);
            if field.is_text_mapped() {
                if field.is_option {
                    quote! { .bind(self.#field_ident.as_ref().map(|v| v.to_string())) }
                } else {
                    quote! { .bind(self.#field_ident.to_string()) }
                }
            } else {
                quote! { .bind(self.#field_ident.clone()) }
            }
        })
        .collect()
}
