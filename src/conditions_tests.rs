#[cfg(test)]
mod tests {
    use crate::column_type::ColumnType;
    use crate::datasource::DboSource;
    use crate::expr::Expr;
    use crate::flavor::Flavor;
    use crate::model::Model;
    use crate::value::SqlValue;
    use crate::conditions;
    use pretty_assertions::assert_eq;

    fn mysql() -> DboSource {
        DboSource::with_flavor(Flavor::MySQL)
    }

    fn where_(db: &DboSource, expr: &Expr) -> String {
        db.conditions(expr, true, true, None)
    }

    #[test]
    fn constants_and_empty() {
        let db = mysql();
        assert_eq!(where_(&db, &Expr::Bool(true)), " WHERE 1 = 1");
        assert_eq!(where_(&db, &Expr::Bool(false)), " WHERE 0 = 1");
        assert_eq!(where_(&db, &Expr::default()), " WHERE 1 = 1");
        assert_eq!(where_(&db, &Expr::raw("   ")), " WHERE 1 = 1");
        assert_eq!(db.conditions(&Expr::default(), true, false, None), "1 = 1");
    }

    #[test]
    fn simple_comparisons() {
        let db = mysql();
        let cond = conditions! {
            "Post.title" => "Hello",
            "Post.views >" => 10,
            "Post.title LIKE" => "%foo%",
        };
        assert_eq!(
            where_(&db, &cond),
            " WHERE `Post`.`title` = 'Hello' AND `Post`.`views` > 10 AND `Post`.`title` LIKE '%foo%'"
        );
    }

    #[test]
    fn list_values_become_membership() {
        let db = mysql();
        let cases = vec![
            (conditions! { "Post.id" => vec![1, 2, 3] }, "`Post`.`id` IN (1, 2, 3)"),
            (conditions! { "Post.id" => vec![1] }, "`Post`.`id` = (1)"),
            (conditions! { "Post.id !=" => vec![1, 2] }, "`Post`.`id` NOT IN (1, 2)"),
            (conditions! { "Post.id NOT IN" => vec![1] }, "`Post`.`id` NOT IN (1)"),
            (conditions! { "Post.id" => Vec::<i64>::new() }, "`Post`.`id` IS NULL"),
            (conditions! { "Post.id !=" => Vec::<i64>::new() }, "`Post`.`id` IS NOT NULL"),
        ];
        for (cond, expected) in cases {
            assert_eq!(db.conditions(&cond, true, false, None), expected);
        }
    }

    #[test]
    fn null_comparisons() {
        let db = mysql();
        let cond = conditions! {
            "Post.deleted" => SqlValue::Null,
            "Post.published !=" => (),
        };
        assert_eq!(
            db.conditions(&cond, true, false, None),
            "`Post`.`deleted` IS NULL AND `Post`.`published` IS NOT NULL"
        );
    }

    #[test]
    fn boolean_groups() {
        let db = mysql();
        let or = conditions! {
            "OR" => conditions! { "Post.a" => 1, "Post.b" => 2 },
        };
        assert_eq!(
            db.conditions(&or, true, false, None),
            "((`Post`.`a` = 1) OR (`Post`.`b` = 2))"
        );

        let not = Expr::not(conditions! { "a" => 1, "b" => 2 });
        assert_eq!(
            db.conditions(&not, true, false, None),
            "(NOT (`a` = 1) AND NOT (`b` = 2))"
        );

        let single_not = Expr::not(conditions! { "a" => 1 });
        assert_eq!(db.conditions(&single_not, true, false, None), "NOT (`a` = 1)");

        let single_or = Expr::or(conditions! { "a" => 1 });
        assert_eq!(db.conditions(&single_or, true, false, None), "`a` = 1");
    }

    #[test]
    fn empty_groups_are_dropped() {
        let db = mysql();
        let cond = conditions! {
            "OR" => Expr::map(),
            "Post.id" => 1,
        };
        assert_eq!(db.conditions(&cond, true, false, None), "`Post`.`id` = 1");
        assert_eq!(where_(&db, &Expr::or(Expr::map())), " WHERE 1 = 1");
    }

    #[test]
    fn between_with_and_without_placeholders() {
        let db = mysql();
        let plain = conditions! { "Post.views BETWEEN" => vec![1, 10] };
        assert_eq!(
            db.conditions(&plain, true, false, None),
            "`Post`.`views` BETWEEN 1 AND 10"
        );

        let bound = conditions! {
            "Post.created BETWEEN ? AND ?" => vec!["2020-01-01", "2020-12-31"],
        };
        assert_eq!(
            db.conditions(&bound, true, false, None),
            "`Post`.`created` BETWEEN '2020-01-01' AND '2020-12-31'"
        );
    }

    #[test]
    fn raw_fragments_are_quoted() {
        let db = mysql();
        let cond = Expr::all([
            Expr::raw("Post.id = Comment.post_id"),
            Expr::from(conditions! { "Comment.status" => "approved" }),
        ]);
        assert_eq!(
            db.conditions(&cond, true, false, None),
            "`Post`.`id` = `Comment`.`post_id` AND `Comment`.`status` = 'approved'"
        );
        assert_eq!(
            db.conditions(&Expr::raw("Post.id = 1"), false, false, None),
            "Post.id = 1"
        );
    }

    #[test]
    fn clause_keywords_are_not_prefixed() {
        let db = mysql();
        assert_eq!(
            where_(&db, &Expr::raw("WHERE Post.id = 1")),
            " WHERE `Post`.`id` = 1"
        );
    }

    #[test]
    fn typed_columns_drive_formatting() {
        let db = mysql();
        let model = Model::new("Post")
            .typed_column("id", ColumnType::Integer)
            .typed_column("title", ColumnType::String);
        let cond = conditions! { "Post.id" => "5", "Post.title" => "5" };
        assert_eq!(
            db.conditions(&cond, true, false, Some(&model)),
            "`Post`.`id` = 5 AND `Post`.`title` = '5'"
        );
    }

    #[test]
    fn virtual_fields_are_substituted() {
        let db = mysql();
        let model = Model::new("User").virtual_field("full_name", "CONCAT(User.first, ' ', User.last)");
        let cond = conditions! { "User.full_name" => "Ada Lovelace" };
        assert_eq!(
            db.conditions(&cond, true, false, Some(&model)),
            "(CONCAT(`User`.`first`, ' ', `User`.`last`)) = 'Ada Lovelace'"
        );
    }

    #[test]
    fn not_operator_wraps_condition() {
        let db = mysql();
        let cond = conditions! { "Post.id NOT" => vec![1, 2] };
        assert_eq!(
            db.conditions(&cond, true, false, None),
            "NOT (`Post`.`id` IN (1, 2))"
        );
    }

    #[test]
    fn unknown_operator_gets_implicit_equals() {
        let db = mysql();
        let cond = conditions! { "Post.title SOUNDS" => "x" };
        assert_eq!(
            db.conditions(&cond, true, false, None),
            "`Post`.`title` SOUNDS = 'x'"
        );
    }

    #[test]
    fn having_is_empty_without_conditions() {
        let db = mysql();
        assert_eq!(db.having(None, true, None), "");
        let having = conditions! { "COUNT(Post.id) >" => 1 };
        assert_eq!(
            db.having(Some(&having), true, None),
            " HAVING COUNT(`Post`.`id`) > 1"
        );
    }

    #[test]
    fn keys_to_string_returns_members() {
        let db = mysql();
        let cond = conditions! { "a" => 1, "OR" => Expr::map(), "b" => 2 };
        assert_eq!(
            db.condition_keys_to_string(&cond, true, None),
            vec!["`a` = 1".to_string(), "`b` = 2".to_string()]
        );
    }
}
