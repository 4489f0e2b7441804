#[cfg(test)]
mod tests {
    use crate::column_type::ColumnType;
    use crate::flavor::{Flavor, default_flavor, set_default_flavor_scoped};
    use pretty_assertions::assert_eq;

    #[test]
    fn flavor_display() {
        let cases = vec![
            (Flavor::MySQL, "MySQL"),
            (Flavor::PostgreSQL, "PostgreSQL"),
            (Flavor::SQLite, "SQLite"),
            (Flavor::SQLServer, "SQLServer"),
        ];

        for (f, expected) in cases {
            assert_eq!(f.to_string(), expected);
        }
    }

    #[test]
    fn flavor_quote() {
        assert_eq!(Flavor::MySQL.quote("id"), "`id`");
        assert_eq!(Flavor::PostgreSQL.quote("id"), "\"id\"");
        assert_eq!(Flavor::SQLServer.quote("id"), "[id]");
    }

    #[test]
    fn flavor_limit() {
        let cases = vec![
            (Flavor::MySQL, 5, 2, Some("LIMIT 2, 5")),
            (Flavor::MySQL, 5, 0, Some("LIMIT 5")),
            (Flavor::SQLite, 10, 20, Some("LIMIT 20, 10")),
            (Flavor::PostgreSQL, 5, 2, Some("LIMIT 5 OFFSET 2")),
            (
                Flavor::SQLServer,
                5,
                2,
                Some("OFFSET 2 ROWS FETCH NEXT 5 ROWS ONLY"),
            ),
            (Flavor::MySQL, 0, 2, None),
        ];

        for (f, limit, offset, expected) in cases {
            assert_eq!(f.limit(limit, offset).as_deref(), expected, "{f}");
        }
    }

    #[test]
    fn flavor_native_types() {
        let int = Flavor::MySQL.native_type(&ColumnType::Integer).map(|t| t.name);
        assert_eq!(int, Some("int"));
        let ts = Flavor::PostgreSQL
            .native_type(&ColumnType::Datetime)
            .map(|t| t.name);
        assert_eq!(ts, Some("timestamp"));
        assert_eq!(
            Flavor::MySQL.native_type(&ColumnType::Set("set('a','b')".into())),
            None
        );
    }

    #[test]
    fn default_flavor_scoped_restores() {
        let before = {
            let _guard = set_default_flavor_scoped(Flavor::PostgreSQL);
            assert_eq!(default_flavor(), Flavor::PostgreSQL);
            Flavor::PostgreSQL
        };
        assert_eq!(before, Flavor::PostgreSQL);
        let _guard = set_default_flavor_scoped(Flavor::MySQL);
        assert_eq!(default_flavor(), Flavor::MySQL);
    }
}
