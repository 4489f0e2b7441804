#[cfg(test)]
mod tests {
    use crate::column_type::ColumnType;
    use crate::datasource::DboSource;
    use crate::flavor::Flavor;
    use crate::formatter::{Escaper, introspect_list_type, introspect_type, truthy};
    use crate::value::{DEFERRED_ID_MARKER, SqlValue};
    use pretty_assertions::assert_eq;
    use time::macros::{date, datetime};

    fn mysql() -> DboSource {
        DboSource::with_flavor(Flavor::MySQL)
    }

    #[test]
    fn value_table() {
        let db = mysql();
        let int = ColumnType::Integer;
        let float = ColumnType::Float;
        let cases: Vec<(SqlValue, Option<&ColumnType>, &str)> = vec![
            (SqlValue::Null, None, "NULL"),
            (SqlValue::Null, Some(&int), "NULL"),
            (true.into(), None, "'1'"),
            (false.into(), None, "'0'"),
            (true.into(), Some(&int), "1"),
            (5.into(), None, "5"),
            ("5".into(), None, "'5'"),
            ("5".into(), Some(&int), "5"),
            ("+5".into(), Some(&int), "+5"),
            ("-5".into(), Some(&int), "-5"),
            ("".into(), Some(&int), "NULL"),
            ("abc".into(), Some(&int), "'abc'"),
            (1.5.into(), None, "1.5"),
            ("1.5".into(), Some(&float), "1.5"),
            ("1e3".into(), Some(&float), "1e3"),
            ("".into(), None, "''"),
            ("O'Reilly".into(), None, "'O\\'Reilly'"),
            (SqlValue::identifier("Post.id"), None, "`Post`.`id`"),
            (SqlValue::expression("NOW()"), None, "NOW()"),
            (DEFERRED_ID_MARKER.into(), Some(&int), DEFERRED_ID_MARKER),
        ];
        for (value, column, expected) in cases {
            assert_eq!(db.value(&value, column), expected, "{value:?}");
        }
    }

    #[test]
    fn booleans_follow_truthiness() {
        let db = mysql();
        let boolean = ColumnType::Boolean;
        assert_eq!(db.value(&"false".into(), Some(&boolean)), "'1'");
        assert_eq!(db.value(&"0".into(), Some(&boolean)), "'0'");
        assert_eq!(db.value(&"".into(), Some(&boolean)), "'0'");
        assert!(truthy(&"false".into()));
        assert!(!truthy(&SqlValue::Null));
        assert!(db.boolean(&1.into()));
    }

    #[test]
    fn set_and_enum_are_always_quoted() {
        let db = mysql();
        let set = ColumnType::Set("set('1','2')".into());
        assert_eq!(db.value(&"1".into(), Some(&set)), "'1'");
    }

    #[test]
    fn string_escaping_per_flavor() {
        let pg = DboSource::with_flavor(Flavor::PostgreSQL);
        assert_eq!(pg.value(&"O'Reilly".into(), None), "'O''Reilly'");
        assert_eq!(mysql().quote_string("a\nb"), "'a\\nb'");
    }

    #[test]
    fn binary_literals_per_flavor() {
        let data = SqlValue::Bytes(vec![0xDE, 0xAD]);
        assert_eq!(mysql().value(&data, None), "X'DEAD'");
        let pg = DboSource::with_flavor(Flavor::PostgreSQL);
        assert_eq!(pg.value(&data, None), "'\\xDEAD'::bytea");
        let mssql = DboSource::with_flavor(Flavor::SQLServer);
        assert_eq!(mssql.value(&data, None), "0xDEAD");
        assert_eq!(mysql().value(&SqlValue::Bytes(vec![]), None), "NULL");
    }

    #[test]
    fn temporal_values_follow_column_type() {
        let db = mysql();
        let d: SqlValue = date!(2024 - 01 - 02).into();
        assert_eq!(db.value(&d, None), "'2024-01-02'");

        let dt: SqlValue = datetime!(2024-01-02 03:04:05).into();
        assert_eq!(db.value(&dt, None), "'2024-01-02 03:04:05'");
        assert_eq!(db.value(&dt, Some(&ColumnType::Date)), "'2024-01-02'");
        assert_eq!(db.value(&dt, Some(&ColumnType::Time)), "'03:04:05'");
        assert_eq!(db.value(&"".into(), Some(&ColumnType::Datetime)), "NULL");
    }

    #[test]
    fn list_type_is_introspected_once() {
        let db = mysql();
        let ints: Vec<SqlValue> = vec!["1".into(), 2.into()];
        assert_eq!(introspect_list_type(&ints), ColumnType::Integer);
        assert_eq!(db.values(&ints, None), vec!["1".to_string(), "2".to_string()]);

        let mixed: Vec<SqlValue> = vec!["1".into(), "a".into()];
        assert_eq!(introspect_list_type(&mixed), ColumnType::String);
        assert_eq!(db.values(&mixed, None), vec!["'1'".to_string(), "'a'".to_string()]);

        let floats: Vec<SqlValue> = vec![1.into(), "2.5".into()];
        assert_eq!(introspect_list_type(&floats), ColumnType::Float);
    }

    #[test]
    fn introspect_scalar_types() {
        assert_eq!(introspect_type(&true.into()), ColumnType::Boolean);
        assert_eq!(introspect_type(&1.into()), ColumnType::Integer);
        assert_eq!(introspect_type(&"x".repeat(256).into()), ColumnType::Text);
        assert_eq!(introspect_type(&"x".into()), ColumnType::String);
    }

    #[derive(Debug, Clone)]
    struct UpperEscaper;

    impl Escaper for UpperEscaper {
        fn escape(&self, raw: &str) -> String {
            raw.to_uppercase()
        }
    }

    #[test]
    fn custom_escaper_replaces_flavor_escaping() {
        let db = mysql().with_escaper(UpperEscaper);
        assert_eq!(db.value(&"abc".into(), None), "'ABC'");
    }
}
