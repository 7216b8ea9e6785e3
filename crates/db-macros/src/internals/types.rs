use quote::ToTokens;
use syn::{GenericArgument, PathArguments, Type};

#[derive(Debug)]
pub struct ForeignKeyInfo {
    pub referenced_table: String,
}

pub struct FieldData {
    pub name: String,
    pub ty: syn::Type,
    pub is_option: bool,
    pub is_pk: bool,
    pub sql_type: String,
    pub foreign_key: Option<ForeignKeyInfo>,
    pub unique: bool,
    pub indexed: bool,
}

impl FieldData {
    /// `created_at` is filled by the database and never bound on insert.
    pub fn is_db_managed(&self) -> bool {
        self.is_pk || self.name == "created_at"
    }

    /// Non-simple types round-trip through TEXT via `Display` / `FromStr`.
    pub fn is_text_mapped(&self) -> bool {
        let inner = get_option_inner_type(&self.ty).unwrap_or_else(|| self.ty.clone());
        !is_simple_type(&inner)
    }
}

impl std::fmt::Debug for FieldData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldData")
            .field("name", &self.name)
            .field("ty", &self.ty.to_token_stream().to_string())
            .field("is_option", &self.is_option)
            .field("is_pk", &self.is_pk)
            .field("sql_type", &self.sql_type)
            .field("foreign_key", &self.foreign_key)
            .field("unique", &self.unique)
            .field("indexed", &self.indexed)
            .finish()
    }
}

pub fn is_option_type(ty: &Type) -> bool {
    get_option_inner_type(ty).is_some()
}

pub fn get_option_inner_type(ty: &Type) -> Option<Type> {
    if let Type::Path(type_path) = ty {
        if let Some(last_segment) = type_path.path.segments.last() {
            if last_segment.ident == "Option" {
                if let PathArguments::AngleBracketed(angle_args) = &last_segment.arguments {
                    if angle_args.args.len() == 1 {
                        if let GenericArgument::Type(inner_ty) = &angle_args.args[0] {
                            return Some(inner_ty.clone());
                        }
                    }
                }
            }
        }
    }
    None
}

pub fn get_fully_qualified_type_string(ty: &Type) -> String {
    quote::quote!(#ty).to_string().replace(' ', "")
}

pub fn is_simple_type(ty: &Type) -> bool {
    let type_str = get_fully_qualified_type_string(ty);
    matches!(type_str.as_str(),
        "String" | "i32" | "i64" | "f64" | "bool" |
        "Uuid" | "::sqlx::types::Uuid" | "sqlx::types::Uuid" |
        "NaiveDate" | "::chrono::NaiveDate" | "chrono::NaiveDate" |
        "sqlx::types::chrono::NaiveDate" | "::sqlx::types::chrono::NaiveDate"
    )
}

/// Maps a (non-optional) Rust field type onto its PostgreSQL column type.
/// Anything that is not a known scalar is stored as TEXT.
pub fn map_rust_type_to_sql(ty: &Type) -> String {
    let type_str = get_fully_qualified_type_string(ty);
    match type_str.as_str() {
        "String" => "TEXT",
        "i32" => "INTEGER",
        "i64" => "BIGINT",
        "f64" => "DOUBLE PRECISION",
        "bool" => "BOOLEAN",
        "Uuid" | "::sqlx::types::Uuid" | "sqlx::types::Uuid" => "UUID",
        s if s.ends_with("NaiveDate") => "DATE",
        _ => "TEXT",
    }
    .to_string()
}
