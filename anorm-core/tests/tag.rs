#[cfg(test)]
mod tests {
    use anorm_core::{JoinRef, JoinType, Tag};

    #[test]
    fn full_tag() {
        let tag = Tag::parse(
            "pk{T} c{user_id} ig{T} ug{F} def{user_id INT NOT NULL} join{left,a,b,c,d}",
        );
        assert_eq!(
            tag,
            Tag {
                primary_key: true,
                column: "user_id".into(),
                insert_ignore: true,
                update_ignore: false,
                definition: "user_id INT NOT NULL".into(),
                join: "left,a,b,c,d".into(),
            }
        );
    }

    #[test]
    fn flags_need_literal_t() {
        let tag = Tag::parse("pk{t} ig{true} ug{T}");
        assert!(!tag.primary_key);
        assert!(!tag.insert_ignore);
        assert!(tag.update_ignore);
    }

    #[test]
    fn malformed_pairs() {
        assert_eq!(Tag::parse(""), Tag::default());
        assert_eq!(Tag::parse("c{} pk"), Tag::default());
        assert_eq!(Tag::parse("nothing to see"), Tag::default());
        assert_eq!(Tag::parse("c{unclosed"), Tag::default());
        let tag = Tag::parse("c{a{b}} pk{T}");
        assert_eq!(tag.column, "");
        assert!(tag.primary_key);
        let tag = Tag::parse("unknown{x}c{name}");
        assert_eq!(tag.column, "name");
        let tag = Tag::parse("xpk{T}");
        assert!(!tag.primary_key);
    }

    #[test]
    fn join_ref() {
        assert_eq!(
            JoinRef::parse("title", " inner , dept_id , department , id , title "),
            Some(JoinRef::new(
                "title",
                JoinType::Inner,
                "dept_id",
                "department",
                "id",
                "title"
            ))
        );
        assert_eq!(
            JoinRef::parse("title", "LEFT,a,b,c,d").map(|v| v.join_type),
            Some(JoinType::Left)
        );
        assert_eq!(
            JoinRef::parse("title", "Full,a,b,c,d").map(|v| v.join_type),
            Some(JoinType::Full)
        );
        assert_eq!(JoinRef::parse("title", "left,a,b,c"), None);
        assert_eq!(JoinRef::parse("title", "left,a,b,c,d,e"), None);
        assert_eq!(JoinRef::parse("title", "outer,a,b,c,d"), None);
    }

    #[test]
    fn join_type_sql() {
        assert_eq!(JoinType::Inner.to_string(), "INNER JOIN");
        assert_eq!(JoinType::Left.to_string(), "LEFT JOIN");
        assert_eq!(JoinType::Right.to_string(), "RIGHT JOIN");
        assert_eq!(JoinType::Full.to_string(), "FULL JOIN");
        assert_eq!(JoinType::parse("right"), Some(JoinType::Right));
        assert_eq!(JoinType::parse("cross"), None);
    }
}
