use hotwheels_database::{SqlxObject, SqlxSchema};
use sqlx::types::chrono::NaiveDate;
use sqlx::types::Uuid;
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, Default, PartialEq, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Finish {
    #[default]
    Matte,
    Gloss,
}

#[derive(Debug, Clone, SqlxObject)]
#[table_name = "stamps"]
#[unique_together(owner_id, stamped_on)]
pub struct Stamp {
    pub id: Uuid,

    #[indexed]
    pub owner_id: Uuid,
    pub stamped_on: NaiveDate,
    pub level: i32,

    #[foreign_key(referenced_table = "cards", related_rust_type = "Card")]
    pub card_id: Option<Uuid>,
    pub finish: Finish,

    pub created_at: i64,
}

#[derive(Debug, Clone, SqlxObject)]
#[table_name = "cards"]
pub struct Card {
    pub id: Uuid,
    #[unique]
    pub code: String,
    pub note: Option<String>,
}

#[test]
fn create_table_sql_carries_constraints() {
    assert_eq!(
        Stamp::create_table_sql(),
        "CREATE TABLE IF NOT EXISTS \"stamps\" (\
         \"id\" UUID PRIMARY KEY DEFAULT gen_random_uuid(), \
         \"owner_id\" UUID NOT NULL, \
         \"stamped_on\" DATE NOT NULL, \
         \"level\" INTEGER NOT NULL, \
         \"card_id\" UUID, \
         \"finish\" TEXT NOT NULL, \
         \"created_at\" BIGINT NOT NULL DEFAULT floor(extract(epoch from now())), \
         FOREIGN KEY (\"card_id\") REFERENCES \"cards\"(\"id\") ON DELETE SET NULL, \
         CONSTRAINT \"uq_stamps_owner_id_stamped_on\" UNIQUE (\"owner_id\", \"stamped_on\"))"
    );
    assert_eq!(
        Stamp::INDEXES_SQL,
        &["CREATE INDEX IF NOT EXISTS \"idx_stamps_owner_id\" ON \"stamps\"(\"owner_id\")"]
    );
}

#[test]
fn insert_sql_skips_database_managed_columns() {
    assert_eq!(
        Stamp::insert_sql(),
        "INSERT INTO \"stamps\" (\"owner_id\", \"stamped_on\", \"level\", \"card_id\", \"finish\") \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING \"id\", \"owner_id\", \"stamped_on\", \"level\", \"card_id\", \"finish\", \"created_at\""
    );
    assert_eq!(Card::insert_sql(), "INSERT INTO \"cards\" (\"code\", \"note\") VALUES ($1, $2) RETURNING \"id\", \"code\", \"note\"");
}

#[test]
fn unique_field_and_nullable_text() {
    assert_eq!(
        Card::create_table_sql(),
        "CREATE TABLE IF NOT EXISTS \"cards\" (\"id\" UUID PRIMARY KEY DEFAULT gen_random_uuid(), \"code\" TEXT NOT NULL UNIQUE, \"note\" TEXT)"
    );
    assert_eq!(Card::drop_table_sql(), "DROP TABLE IF EXISTS \"cards\" CASCADE");
}

#[test]
fn row_conversion_parses_text_columns() {
    let row = StampRowSqlx {
        id: Uuid::nil(),
        owner_id: Uuid::nil(),
        stamped_on: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        level: 4,
        card_id: None,
        finish: "GLOSS".to_string(),
        created_at: 1_714_521_600,
    };
    let stamp = Stamp::from_row(row);
    assert_eq!(stamp.finish, Finish::Gloss);
    assert_eq!(stamp.level, 4);

    let row = StampRowSqlx {
        finish: "satin".to_string(),
        ..StampRowSqlx {
            id: Uuid::nil(),
            owner_id: Uuid::nil(),
            stamped_on: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            level: 1,
            card_id: None,
            finish: String::new(),
            created_at: 0,
        }
    };
    assert_eq!(Stamp::from_row(row).finish, Finish::Matte);
}
