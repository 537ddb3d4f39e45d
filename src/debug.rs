use crate::parser::{Operator, ParseTree};

/// Print a parse tree sideways: rightmost children at the top, one indent
/// level per tree depth, so the page reads like the tree rotated a quarter
/// turn counter-clockwise.
pub fn print_tree(tree: &ParseTree) {
    print_level(tree, 0);
}

fn print_level(tree: &ParseTree, level: usize) {
    let mid = tree.children.len().div_ceil(2);
    for child in tree.children[mid..].iter().rev() {
        print_level(child, level + 1);
    }
    println!("{:indent$}{}", "", node_label(tree), indent = 2 * level);
    for child in tree.children[..mid].iter().rev() {
        print_level(child, level + 1);
    }
}

fn node_label(tree: &ParseTree) -> String {
    match tree.op {
        Operator::Lit | Operator::Var | Operator::ArrayVar | Operator::Type => {
            format!("{:?}: {}", tree.op, tree.name())
        }
        op => format!("{op:?}"),
    }
}
