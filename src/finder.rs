//! 魔术查找方法：把 `findByTitle`、`findAllByTitleOrStatus` 这类方法名解析为条件。

use heck::ToSnakeCase;

use crate::datasource::DboSource;
use crate::expr::{Expr, Operand};
use crate::model::Model;
use crate::statement::QueryData;
use crate::value::SqlValue;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FinderError {
    #[error("`{0}` is not a findBy/findAllBy method")]
    NotAFinder(String),
    #[error("`{method}` expects {expected} argument(s), got {got}")]
    ArgumentCount {
        method: String,
        expected: usize,
        got: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinderKind {
    First,
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Finder {
    pub kind: FinderKind,
    /// 解析出的字段名（snake_case，不含别名）。
    pub fields: Vec<String>,
    pub conditions: Expr,
}

/// 解析查找方法名；每个字段消耗一个参数，条件键为 `<alias>.<field>`。
pub fn parse_finder(method: &str, alias: &str, args: Vec<SqlValue>) -> Result<Finder, FinderError> {
    let lower = method.to_ascii_lowercase();
    let (kind, rest) = if lower.starts_with("findallby") {
        (FinderKind::All, &method[9..])
    } else if lower.starts_with("findby") {
        (FinderKind::First, &method[6..])
    } else {
        return Err(FinderError::NotAFinder(method.to_string()));
    };

    let snake = rest.to_snake_case();
    if snake.is_empty() {
        return Err(FinderError::NotAFinder(method.to_string()));
    }
    let or = snake.contains("_or_");
    let fields: Vec<String> = snake
        .split(if or { "_or_" } else { "_and_" })
        .map(str::to_string)
        .collect();

    if args.len() != fields.len() {
        return Err(FinderError::ArgumentCount {
            method: method.to_string(),
            expected: fields.len(),
            got: args.len(),
        });
    }

    let entries: Vec<(String, Operand)> = fields
        .iter()
        .zip(args)
        .map(|(field, value)| (format!("{alias}.{field}"), Operand::Value(value)))
        .collect();
    let conditions = if or {
        Expr::or(Expr::Map(entries))
    } else {
        Expr::Map(entries)
    };

    Ok(Finder {
        kind,
        fields,
        conditions,
    })
}

impl Finder {
    /// 转为查询描述；`First` 限定一行。
    pub fn to_query(&self) -> QueryData {
        let query = QueryData::new().conditions(self.conditions.clone());
        match self.kind {
            FinderKind::First => query.limit(1),
            FinderKind::All => query,
        }
    }
}

impl DboSource {
    /// 解析查找方法并渲染模型上的 SELECT。
    pub fn find_by_sql(
        &self,
        model: &Model,
        method: &str,
        args: Vec<SqlValue>,
    ) -> Result<String, FinderError> {
        let finder = parse_finder(method, &model.alias, args)?;
        let mut query = finder.to_query();
        query.fields = self.fields(model, None, &[], true);
        Ok(self.build_association_query(model, &query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn find_by_single_field() {
        let finder = parse_finder("findByTitle", "Post", vec!["Hello".into()]).unwrap();
        assert_eq!(finder.kind, FinderKind::First);
        assert_eq!(
            finder.conditions,
            Expr::Map(vec![(
                "Post.title".to_string(),
                Operand::Value(SqlValue::from("Hello"))
            )])
        );
    }

    #[test]
    fn or_combinator_wraps_group() {
        let finder =
            parse_finder("findAllByTitleOrAuthorId", "Post", vec!["a".into(), 3.into()]).unwrap();
        assert_eq!(finder.kind, FinderKind::All);
        assert_eq!(finder.fields, vec!["title".to_string(), "author_id".to_string()]);
        assert!(matches!(
            &finder.conditions,
            Expr::Map(entries) if entries.len() == 1 && entries[0].0 == "OR"
        ));
    }

    #[test]
    fn argument_count_is_checked() {
        let err = parse_finder("findByTitleAndStatus", "Post", vec!["a".into()]).unwrap_err();
        assert_eq!(
            err,
            FinderError::ArgumentCount {
                method: "findByTitleAndStatus".into(),
                expected: 2,
                got: 1
            }
        );
        assert!(matches!(
            parse_finder("save", "Post", vec![]),
            Err(FinderError::NotAFinder(_))
        ));
    }

    #[test]
    fn find_by_renders_a_limited_select() {
        use crate::column_type::ColumnType;
        use crate::flavor::Flavor;

        let db = DboSource::with_flavor(Flavor::MySQL);
        let model = Model::new("Post")
            .typed_column("id", ColumnType::Integer)
            .typed_column("title", ColumnType::String);
        assert_eq!(
            db.find_by_sql(&model, "findByTitle", vec!["Hi".into()]).unwrap(),
            "SELECT `Post`.`id`, `Post`.`title` FROM `posts` AS `Post` \
             WHERE `Post`.`title` = 'Hi' LIMIT 1"
        );
        assert_eq!(
            db.find_by_sql(&model, "findAllById", vec!["7".into()]).unwrap(),
            "SELECT `Post`.`id`, `Post`.`title` FROM `posts` AS `Post` WHERE `Post`.`id` = 7"
        );
    }
}
