#[cfg(test)]
mod tests {
    use crate::column_type::ColumnType;
    use crate::datasource::DboSource;
    use crate::flavor::Flavor;
    use crate::schema::{
        Column, Index, IndexType, PRIMARY, Schema, SchemaError, Table, TableParameters,
    };
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn users() -> Table {
        Table::new("users")
            .column("id", Column::new(ColumnType::Integer).primary())
            .column("name", Column::new(ColumnType::String).length(50).not_null())
    }

    #[test]
    fn column_definitions() {
        let db = DboSource::with_flavor(Flavor::MySQL);
        let cases = vec![
            (
                Column::new(ColumnType::Integer).primary(),
                "`c` int(11) NOT NULL AUTO_INCREMENT",
            ),
            (
                Column::new(ColumnType::String).length(50).not_null(),
                "`c` varchar(50) NOT NULL",
            ),
            (Column::new(ColumnType::String), "`c` varchar(255) DEFAULT NULL"),
            (
                Column::new(ColumnType::Integer).unsigned().default_value("0").not_null(),
                "`c` int(11) unsigned DEFAULT 0 NOT NULL",
            ),
            (Column::new(ColumnType::Timestamp), "`c` timestamp NULL"),
            (
                Column::new(ColumnType::Datetime).default_value("CURRENT_TIMESTAMP"),
                "`c` datetime DEFAULT CURRENT_TIMESTAMP",
            ),
            (
                Column::new(ColumnType::Text)
                    .charset("utf8mb4")
                    .collate("utf8mb4_bin")
                    .comment("body"),
                "`c` text CHARACTER SET utf8mb4 COLLATE utf8mb4_bin DEFAULT NULL COMMENT 'body'",
            ),
        ];
        for (column, expected) in cases {
            assert_eq!(db.build_column("c", &column), expected);
        }
    }

    #[test]
    fn integer_primary_keys_per_flavor() {
        let column = Column::new(ColumnType::Integer).primary();
        let cases = vec![
            (Flavor::PostgreSQL, "\"id\" serial NOT NULL"),
            (Flavor::SQLite, "\"id\" integer PRIMARY KEY AUTOINCREMENT"),
            (Flavor::SQLServer, "[id] int IDENTITY (1, 1) NOT NULL"),
        ];
        for (flavor, expected) in cases {
            let db = DboSource::with_flavor(flavor);
            assert_eq!(db.build_column("id", &column), expected, "{flavor:?}");
        }
    }

    #[test]
    fn create_table_mysql() {
        let db = DboSource::with_flavor(Flavor::MySQL);
        assert_eq!(
            db.create_table(&users()).unwrap(),
            "CREATE TABLE `users` (\n\t`id` int(11) NOT NULL AUTO_INCREMENT,\n\t\
             `name` varchar(50) NOT NULL,\n\tPRIMARY KEY (`id`)\n);"
        );

        let table = users()
            .index("name_idx", Index::new(["name"]).unique())
            .parameters(TableParameters {
                engine: Some("InnoDB".into()),
                charset: Some("utf8mb4".into()),
                ..TableParameters::default()
            });
        assert_eq!(
            db.create_table(&table).unwrap(),
            "CREATE TABLE `users` (\n\t`id` int(11) NOT NULL AUTO_INCREMENT,\n\t\
             `name` varchar(50) NOT NULL,\n\tPRIMARY KEY (`id`),\n\t\
             UNIQUE KEY `name_idx` (`name`)\n) DEFAULT CHARSET=utf8mb4 ENGINE=InnoDB;"
        );
    }

    #[test]
    fn create_table_postgres_moves_indexes_out() {
        let db = DboSource::with_flavor(Flavor::PostgreSQL);
        let table = users().index("name_idx", Index::new(["name"]));
        assert_eq!(
            db.create_table(&table).unwrap(),
            "CREATE TABLE \"users\" (\n\t\"id\" serial NOT NULL,\n\t\
             \"name\" varchar(50) NOT NULL,\n\tPRIMARY KEY (\"id\")\n);\n\
             CREATE INDEX \"name_idx\" ON \"users\" (\"name\");"
        );
    }

    #[test]
    fn create_table_sqlite_inlines_autoincrement() {
        let db = DboSource::with_flavor(Flavor::SQLite);
        assert_eq!(
            db.create_table(&users()).unwrap(),
            "CREATE TABLE \"users\" (\n\t\"id\" integer PRIMARY KEY AUTOINCREMENT,\n\t\
             \"name\" varchar(50) NOT NULL\n);"
        );
    }

    #[test]
    fn composite_integer_keys_are_not_auto_increment() {
        let table = Table::new("posts_tags")
            .column("post_id", Column::new(ColumnType::Integer).primary())
            .column("tag_id", Column::new(ColumnType::Integer).primary());
        let cases = vec![
            (
                Flavor::MySQL,
                "CREATE TABLE `posts_tags` (\n\t`post_id` int(11) NOT NULL,\n\t\
                 `tag_id` int(11) NOT NULL,\n\tPRIMARY KEY (`post_id`, `tag_id`)\n);",
            ),
            (
                Flavor::PostgreSQL,
                "CREATE TABLE \"posts_tags\" (\n\t\"post_id\" integer NOT NULL,\n\t\
                 \"tag_id\" integer NOT NULL,\n\tPRIMARY KEY (\"post_id\", \"tag_id\")\n);",
            ),
            (
                Flavor::SQLite,
                "CREATE TABLE \"posts_tags\" (\n\t\"post_id\" integer NOT NULL,\n\t\
                 \"tag_id\" integer NOT NULL,\n\tPRIMARY KEY (\"post_id\", \"tag_id\")\n);",
            ),
            (
                Flavor::SQLServer,
                "CREATE TABLE [posts_tags] (\n\t[post_id] int NOT NULL,\n\t\
                 [tag_id] int NOT NULL,\n\tPRIMARY KEY ([post_id], [tag_id])\n);",
            ),
        ];
        for (flavor, expected) in cases {
            let db = DboSource::with_flavor(flavor);
            assert_eq!(db.create_table(&table).unwrap(), expected, "{flavor:?}");
        }
    }

    #[test]
    fn explicit_primary_index_on_integer_column_inlines_on_sqlite() {
        let table = Table::new("tags")
            .column("id", Column::new(ColumnType::Integer).not_null())
            .column("name", Column::new(ColumnType::String).length(50).not_null())
            .index(PRIMARY, Index::new(["id"]));
        let db = DboSource::with_flavor(Flavor::SQLite);
        assert_eq!(
            db.create_table(&table).unwrap(),
            "CREATE TABLE \"tags\" (\n\t\"id\" integer PRIMARY KEY AUTOINCREMENT,\n\t\
             \"name\" varchar(50) NOT NULL\n);"
        );
    }

    #[test]
    fn create_table_validates_first() {
        let db = DboSource::with_flavor(Flavor::MySQL);
        assert_eq!(
            db.create_table(&Table::new("empty")).unwrap_err(),
            SchemaError::NoColumns("empty".into())
        );
    }

    #[test]
    fn mysql_index_variants() {
        let db = DboSource::with_flavor(Flavor::MySQL);
        let mut indexes = IndexMap::new();
        indexes.insert(PRIMARY.to_string(), Index::new(["id"]).unique());
        indexes.insert(
            "body_ft".to_string(),
            Index::new(["body"]).kind(IndexType::Fulltext),
        );
        indexes.insert(
            "title_prefix".to_string(),
            Index::new(["title"]).prefix_length("title", 10),
        );
        let sql = db.build_index("posts", &indexes);
        assert_eq!(
            sql.inline,
            vec![
                "PRIMARY KEY (`id`)".to_string(),
                "FULLTEXT KEY `body_ft` (`body`)".to_string(),
                "KEY `title_prefix` (`title`(10))".to_string(),
            ]
        );
        assert!(sql.statements.is_empty());
    }

    #[test]
    fn schema_wide_create_and_drop() {
        let schema = Schema::new()
            .table(users())
            .table(Table::new("tags").column("id", Column::new(ColumnType::Integer).primary()));

        let db = DboSource::with_flavor(Flavor::MySQL);
        assert_eq!(
            db.drop_schema(&schema, None).unwrap(),
            "DROP TABLE IF EXISTS `users`;\nDROP TABLE IF EXISTS `tags`;"
        );
        assert_eq!(
            db.drop_schema(&schema, Some("tags")).unwrap(),
            "DROP TABLE IF EXISTS `tags`;"
        );
        assert_eq!(
            db.create_schema(&schema, Some("ghosts")).unwrap_err(),
            SchemaError::UnknownTable("ghosts".into())
        );
        assert_eq!(db.create_schema(&schema, None).unwrap().matches("CREATE TABLE").count(), 2);

        let mssql = DboSource::with_flavor(Flavor::SQLServer);
        assert_eq!(mssql.drop_schema(&schema, Some("tags")).unwrap(), "DROP TABLE [tags];");
    }

    #[test]
    fn alter_mysql_adds_column_and_index() {
        let a = Schema::new().table(Table::new("users").column("id", Column::new(ColumnType::Integer).primary()));
        let b = Schema::new().table(users().index("name_idx", Index::new(["name"])));
        let db = DboSource::with_flavor(Flavor::MySQL);
        assert_eq!(
            db.alter_schema(&a.compare(&b), None).unwrap(),
            "ALTER TABLE `users`\n\tADD `name` varchar(50) NOT NULL AFTER `id`,\n\t\
             ADD KEY `name_idx` (`name`);"
        );
    }

    #[test]
    fn alter_mysql_rebuilds_primary_key() {
        let a = Table::new("t")
            .column("id", Column::new(ColumnType::Integer).not_null())
            .column("name", Column::new(ColumnType::String))
            .index("idx_a", Index::new(["name"]))
            .index(PRIMARY, Index::new(["id"]).unique());
        let b = Table::new("t")
            .column("id", Column::new(ColumnType::Integer).primary())
            .column("name", Column::new(ColumnType::String).primary())
            .index("idx_a", Index::new(["name"]).unique());
        let diff = Schema::new().table(a).compare(&Schema::new().table(b));

        let db = DboSource::with_flavor(Flavor::MySQL);
        assert_eq!(
            db.alter_schema(&diff, Some("t")).unwrap(),
            "ALTER TABLE `t`\n\tCHANGE `name` `name` varchar(255) NOT NULL,\n\t\
             DROP PRIMARY KEY,\n\tDROP KEY `idx_a`,\n\t\
             ADD PRIMARY KEY (`id`, `name`),\n\tADD UNIQUE KEY `idx_a` (`name`);"
        );
    }

    #[test]
    fn alter_postgres_and_sqlserver() {
        let a = Schema::new().table(users().column("legacy", Column::new(ColumnType::Text)));
        let b = Schema::new().table(
            Table::new("users")
                .column("id", Column::new(ColumnType::Integer).primary())
                .column("name", Column::new(ColumnType::String).length(80).not_null())
                .index("name_idx", Index::new(["name"])),
        );
        let diff = a.compare(&b);

        let pg = DboSource::with_flavor(Flavor::PostgreSQL);
        assert_eq!(
            pg.alter_schema(&diff, None).unwrap(),
            "ALTER TABLE \"users\"\n\tDROP COLUMN \"legacy\",\n\t\
             ALTER COLUMN \"name\" TYPE varchar(80),\n\t\
             ALTER COLUMN \"name\" SET NOT NULL,\n\t\
             ALTER COLUMN \"name\" DROP DEFAULT;\n\
             CREATE INDEX \"name_idx\" ON \"users\" (\"name\");"
        );

        let mssql = DboSource::with_flavor(Flavor::SQLServer);
        assert_eq!(
            mssql.alter_schema(&diff, None).unwrap(),
            "ALTER TABLE [users] DROP COLUMN [legacy];\n\
             ALTER TABLE [users] ALTER COLUMN [name] nvarchar(80) NOT NULL;\n\
             CREATE INDEX [name_idx] ON [users] ([name]);"
        );
    }

    #[test]
    fn sqlite_refuses_column_changes() {
        let a = Schema::new().table(users());
        let b = Schema::new().table(
            Table::new("users")
                .column("id", Column::new(ColumnType::Integer).primary())
                .column("name", Column::new(ColumnType::String).length(80)),
        );
        let db = DboSource::with_flavor(Flavor::SQLite);
        assert_eq!(
            db.alter_schema(&a.compare(&b), None).unwrap_err(),
            SchemaError::Unsupported {
                flavor: Flavor::SQLite,
                operation: "change a column",
                table: "users".into(),
            }
        );

        let c = Schema::new().table(users().column("bio", Column::new(ColumnType::Text)));
        assert_eq!(
            db.alter_schema(&a.compare(&c), None).unwrap(),
            "ALTER TABLE \"users\" ADD COLUMN \"bio\" text DEFAULT NULL;"
        );
    }

    #[test]
    fn alter_rejects_unknown_table_filter() {
        let a = Schema::new().table(users());
        let db = DboSource::with_flavor(Flavor::MySQL);
        assert_eq!(
            db.alter_schema(&a.compare(&a), Some("users")).unwrap_err(),
            SchemaError::UnknownTable("users".into())
        );
    }
}
