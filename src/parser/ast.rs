use super::locations::Location;
use super::tokenizer::Token;

/// The closed set of parse tree operators. Every operator has a fixed
/// declared arity; `None` marks the variadic list carriers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Operator {
    Program,
    Block,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Neg,
    Lit,
    Var,
    ArrayVar,
    Assign,
    Input,
    Decl,
    ArrayDecl,
    Bounds,
    Bound,
    RecDef,
    RecDecl,
    RecAccess,
    FieldList,
    If,
    While,
    FunDef,
    ParamList,
    RefParam,
    Type,
    FunCall,
    ArgList,
}

impl Operator {
    pub fn arity(self) -> Option<usize> {
        match self {
            Self::Program
            | Self::Block
            | Self::Bounds
            | Self::FieldList
            | Self::ParamList
            | Self::ArgList
            | Self::ArrayVar => None,
            Self::Lit | Self::Var | Self::Type => Some(0),
            Self::Neg | Self::Input | Self::Decl | Self::RefParam => Some(1),
            Self::Add
            | Self::Sub
            | Self::Mul
            | Self::Div
            | Self::Pow
            | Self::Assign
            | Self::ArrayDecl
            | Self::Bound
            | Self::RecDef
            | Self::RecDecl
            | Self::RecAccess
            | Self::If
            | Self::While
            | Self::FunCall => Some(2),
            Self::FunDef => Some(4),
        }
    }
}

/// A homogeneous parse tree node: an operator, the token it came from, and
/// an ordered list of children that never grows past the operator's arity.
#[derive(Clone)]
pub struct ParseTree {
    pub(crate) op: Operator,
    pub(crate) token: Option<Token>,
    pub(crate) children: Vec<ParseTree>,
}

impl ParseTree {
    pub(crate) fn new(op: Operator) -> Self {
        Self {
            op,
            token: None,
            children: Vec::new(),
        }
    }

    pub(crate) fn with_token(op: Operator, token: Token) -> Self {
        Self {
            op,
            token: Some(token),
            children: Vec::new(),
        }
    }

    /// Add a left-hand child.
    pub(crate) fn add_left(&mut self, child: ParseTree) {
        self.children.insert(0, child);
    }

    /// Add a right-hand child.
    pub(crate) fn add_right(&mut self, child: ParseTree) {
        self.children.push(child);
    }

    /// Graft a finished subtree onto the leftmost open slot of an operator
    /// chain. Chains of binary operators are built right-recursively with
    /// only their right operands filled in; walking down the first-child
    /// pointers to the first node still below its declared arity and
    /// inserting there restores left-associative shape.
    pub(crate) fn graft_left(&mut self, subtree: ParseTree) {
        if self.has_room() {
            self.add_left(subtree);
            return;
        }
        self.children[0].graft_left(subtree);
    }

    fn has_room(&self) -> bool {
        self.op.arity().is_none_or(|n| self.children.len() < n)
    }

    /// The source position of the token this node was built from.
    pub(crate) fn loc(&self) -> Location {
        self.token.as_ref().map(|t| t.loc).unwrap_or_default()
    }

    /// The identifier text of the token this node was built from.
    pub(crate) fn name(&self) -> &str {
        self.token.as_ref().map(|t| t.lexeme.as_str()).unwrap_or_default()
    }
}

impl std::fmt::Debug for ParseTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.op {
            Operator::Lit => return write!(f, "Lit({})", self.name()),
            Operator::Var => return write!(f, "Var(\"{}\")", self.name()),
            Operator::Type => return write!(f, "Type({})", self.name()),
            Operator::ArrayVar => write!(f, "ArrayVar(\"{}\"", self.name())?,
            _ => {
                write!(f, "{:?}", self.op)?;
                if self.children.is_empty() {
                    return Ok(());
                }
                f.write_str("(")?;
            }
        }
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 || self.op == Operator::ArrayVar {
                f.write_str(", ")?;
            }
            write!(f, "{child:?}")?;
        }
        f.write_str(")")
    }
}
