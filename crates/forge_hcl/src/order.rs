//! Canonical ordering of encoded fragments.
//!
//! Within a body, attributes come before blocks and each group is sorted by
//! name. Object keys and block labels are sorted; tuple elements and
//! repeated blocks keep their given order.

use crate::encoder::{BlockFragment, Expr, Fragment};

/// Order a body and everything nested inside it.
pub fn order(fragments: Vec<Fragment>) -> Vec<Fragment> {
    let mut ordered: Vec<Fragment> = fragments.into_iter().map(order_fragment).collect();
    ordered.sort_by(|a, b| {
        a.kind()
            .cmp(&b.kind())
            .then_with(|| a.name().cmp(b.name()))
    });
    ordered
}

fn order_fragment(fragment: Fragment) -> Fragment {
    match fragment {
        Fragment::Attribute { name, expr } => Fragment::Attribute {
            name,
            expr: order_expr(expr),
        },
        Fragment::Blocks { name, blocks } => Fragment::Blocks {
            name,
            blocks: order_blocks(blocks),
        },
    }
}

fn order_blocks(blocks: Vec<BlockFragment>) -> Vec<BlockFragment> {
    let mut ordered: Vec<BlockFragment> = blocks
        .into_iter()
        .map(|block| BlockFragment {
            labels: block.labels,
            body: order(block.body),
        })
        .collect();
    // stable: unlabelled repeated blocks stay in list order
    ordered.sort_by(|a, b| a.labels.cmp(&b.labels));
    ordered
}

/// Sort object keys recursively.
pub fn order_expr(expr: Expr) -> Expr {
    match expr {
        Expr::Tuple(items) => Expr::Tuple(items.into_iter().map(order_expr).collect()),
        Expr::Object(entries) => {
            let mut entries: Vec<(String, Expr)> = entries
                .into_iter()
                .map(|(key, value)| (key, order_expr(value)))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Expr::Object(entries)
        }
        scalar => scalar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(name: &str) -> Fragment {
        Fragment::Attribute {
            name: name.to_string(),
            expr: Expr::Bool(true),
        }
    }

    fn blocks(name: &str, blocks: Vec<BlockFragment>) -> Fragment {
        Fragment::Blocks {
            name: name.to_string(),
            blocks,
        }
    }

    fn names(fragments: &[Fragment]) -> Vec<&str> {
        fragments.iter().map(Fragment::name).collect()
    }

    #[test]
    fn test_attributes_before_blocks_then_by_name() {
        let ordered = order(vec![
            blocks("b_block", vec![]),
            attr("zeta"),
            blocks("a_block", vec![]),
            attr("alpha"),
        ]);
        assert_eq!(names(&ordered), vec!["alpha", "zeta", "a_block", "b_block"]);
    }

    #[test]
    fn test_object_keys_sorted_tuple_order_kept() {
        let expr = Expr::Tuple(vec![
            Expr::Number("3".into()),
            Expr::Object(vec![
                ("c".into(), Expr::Number("0".into())),
                ("a".into(), Expr::Number("2".into())),
                ("b".into(), Expr::Number("1".into())),
            ]),
            Expr::Number("1".into()),
        ]);
        let Expr::Tuple(items) = order_expr(expr) else {
            panic!("expected tuple");
        };
        assert_eq!(items[0], Expr::Number("3".into()));
        assert_eq!(items[2], Expr::Number("1".into()));
        let Expr::Object(entries) = &items[1] else {
            panic!("expected object");
        };
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_labelled_blocks_sorted_repeated_blocks_kept() {
        let labelled = order(vec![blocks(
            "listener",
            vec![
                BlockFragment { labels: vec!["web".into()], body: vec![] },
                BlockFragment { labels: vec!["admin".into()], body: vec![] },
            ],
        )]);
        let Fragment::Blocks { blocks: ordered, .. } = &labelled[0] else {
            panic!("expected blocks");
        };
        assert_eq!(ordered[0].labels, vec!["admin".to_string()]);

        let repeated = order(vec![blocks(
            "principals",
            vec![
                BlockFragment { labels: vec![], body: vec![attr("z")] },
                BlockFragment { labels: vec![], body: vec![attr("a")] },
            ],
        )]);
        let Fragment::Blocks { blocks: kept, .. } = &repeated[0] else {
            panic!("expected blocks");
        };
        assert_eq!(names(&kept[0].body), vec!["z"]);
        assert_eq!(names(&kept[1].body), vec!["a"]);
    }

    #[test]
    fn test_nested_bodies_are_ordered() {
        let ordered = order(vec![blocks(
            "statement",
            vec![BlockFragment {
                labels: vec![],
                body: vec![blocks("condition", vec![]), attr("effect"), attr("actions")],
            }],
        )]);
        let Fragment::Blocks { blocks, .. } = &ordered[0] else {
            panic!("expected blocks");
        };
        assert_eq!(names(&blocks[0].body), vec!["actions", "effect", "condition"]);
    }
}
