//! 宏集合：用字面量形式书写条件映射。
//!
//! ```
//! use dbo_source::{Expr, conditions};
//!
//! let cond = conditions! {
//!     "Post.published" => true,
//!     "OR" => conditions! { "Post.views >" => 10, "Post.sticky" => 1 },
//! };
//! assert!(matches!(cond, Expr::Map(ref entries) if entries.len() == 2));
//! ```

/// 构造 [`Expr::Map`](crate::Expr::Map)，右值通过 `Operand::from` 转换。
#[macro_export]
macro_rules! conditions {
    () => {
        $crate::Expr::Map(::std::vec::Vec::new())
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::Expr::Map(::std::vec![
            $( (::std::string::String::from($key), $crate::Operand::from($value)) ),+
        ])
    };
}

/// 构造字段列表（`Vec<String>`）。
#[macro_export]
macro_rules! field_list {
    () => {
        ::std::vec::Vec::<::std::string::String>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$( ::std::string::String::from($value) ),+]
    };
}
