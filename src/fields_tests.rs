#[cfg(test)]
mod tests {
    use crate::column_type::ColumnType;
    use crate::datasource::DboSource;
    use crate::fields::Order;
    use crate::field_list;
    use crate::flavor::Flavor;
    use crate::model::Model;
    use pretty_assertions::assert_eq;

    fn mysql() -> DboSource {
        DboSource::with_flavor(Flavor::MySQL)
    }

    fn post() -> Model {
        Model::new("Post")
            .typed_column("id", ColumnType::Integer)
            .typed_column("title", ColumnType::String)
            .virtual_field("two", "1 + 1")
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn all_fields_include_virtual_fields_last() {
        let db = mysql();
        assert_eq!(
            db.fields(&post(), None, &[], true),
            strings(&["`Post`.`id`", "`Post`.`title`", "(1 + 1) AS `Post__two`"])
        );
        assert_eq!(
            db.fields(&post(), None, &field_list!["*"], true),
            strings(&["*", "(1 + 1) AS `Post__two`"])
        );
    }

    #[test]
    fn requested_virtual_fields_move_to_the_end() {
        let db = mysql();
        assert_eq!(
            db.fields(&post(), None, &field_list!["two", "Post.title"], true),
            strings(&["`Post`.`title`", "(1 + 1) AS `Post__two`"])
        );
    }

    #[test]
    fn select_field_shapes() {
        let db = mysql();
        let model = post();
        let cases = vec![
            ("COUNT(*)", "COUNT(*)"),
            ("MAX(views)", "MAX(`Post`.`views`)"),
            ("MAX(Post.views) AS top", "MAX(`Post`.`views`) AS `top`"),
            ("DISTINCT Post.title", "DISTINCT `Post`.`title`"),
            ("title", "`Post`.`title`"),
            ("Author.name", "`Author`.`name`"),
        ];
        for (input, expected) in cases {
            assert_eq!(
                db.fields(&model, None, &field_list![input], true),
                strings(&[expected]),
                "{input}"
            );
        }
    }

    #[test]
    fn comma_lists_are_split_and_deduplicated() {
        let db = mysql();
        assert_eq!(
            db.fields(&post(), None, &field_list!["Post.id, Post.title", "id"], true),
            strings(&["`Post`.`id`", "`Post`.`title`"])
        );
    }

    #[test]
    fn explicit_alias_and_unquoted_mode() {
        let db = mysql();
        assert_eq!(
            db.fields(&post(), Some("P"), &field_list!["id"], true),
            strings(&["`P`.`id`"])
        );
        assert_eq!(
            db.fields(&post(), None, &field_list!["Post.title"], false),
            strings(&["Post.title"])
        );
    }

    #[test]
    fn order_items() {
        let db = mysql();
        let cases: Vec<(Vec<Order>, &str)> = vec![
            (vec![], ""),
            (vec!["Post.title".into()], " ORDER BY `Post`.`title` ASC"),
            (vec!["title DESC".into()], " ORDER BY `title` DESC"),
            (
                vec!["Post.title desc, Post.id".into()],
                " ORDER BY `Post`.`title` desc, `Post`.`id` ASC",
            ),
            (
                vec![Order::desc("Post.created"), Order::expression("RAND()")],
                " ORDER BY `Post`.`created` DESC, RAND()",
            ),
            (
                vec!["FIELD(Post.id, 3, 1)".into()],
                " ORDER BY FIELD(`Post`.`id`, 3, 1) ASC",
            ),
            (
                vec!["(Post.views)*Post.views".into()],
                " ORDER BY (`Post`.`views`)*`Post`.`views` ASC",
            ),
        ];
        for (items, expected) in cases {
            assert_eq!(db.order(&items, "ASC", None), expected, "{items:?}");
        }
    }

    #[test]
    fn order_by_virtual_field() {
        let db = mysql();
        let model = Model::new("User").virtual_field("full", "CONCAT(User.first, User.last)");
        assert_eq!(
            db.order(&[("full", "DESC").into()], "ASC", Some(&model)),
            " ORDER BY (CONCAT(`User`.`first`, `User`.`last`)) DESC"
        );
    }

    #[test]
    fn group_by() {
        let db = mysql();
        assert_eq!(db.group(&[], None), "");
        assert_eq!(
            db.group(&field_list!["Post.category_id, Post.year"], None),
            " GROUP BY `Post`.`category_id`, `Post`.`year`"
        );
        assert_eq!(
            db.group(&field_list!["Post.two"], Some(&post())),
            " GROUP BY (1 + 1)"
        );
    }

    #[test]
    fn calculate_aggregates() {
        let db = mysql();
        let model = post();
        assert_eq!(db.calculate(&model, "count", &[]), "COUNT(*) AS `count`");
        assert_eq!(
            db.calculate(&model, "count", &["Post.id", "total"]),
            "COUNT(`Post`.`id`) AS `total`"
        );
        assert_eq!(
            db.calculate(&model, "max", &["Post.views"]),
            "MAX(`Post`.`views`) AS `views`"
        );
        assert_eq!(db.calculate(&model, "sum", &["two"]), "SUM(1 + 1) AS `two`");
        assert_eq!(
            db.calculate(&model, "count", &["DISTINCT Post.id"]),
            "COUNT(DISTINCT `Post`.`id`) AS `count`"
        );
    }

    #[test]
    fn fields_are_memoized() {
        let db = mysql();
        let before = db.method_cache_len();
        let first = db.fields(&post(), None, &[], true);
        let after = db.method_cache_len();
        assert!(after > before);
        assert_eq!(db.fields(&post(), None, &[], true), first);
    }
}
