/// Expression tree types
///
/// A compiled expression is an arena of [`Node`]s addressed by [`NodeId`],
/// with a single root. Operator tables (precedence, associativity) live here
/// as static data shared by every query.
use crate::value::Value;
use std::fmt;

/// Index of a node inside an expression arena
pub type NodeId = usize;

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// `!` and `NOT`; the two differ only in precedence
    Not,
    /// `-x`
    Negate,
    /// `~x`
    BitNot,
    /// `BINARY x`, the textual form of `x`
    Binary,
}

/// Infix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// `^`
    BitXor,
    /// `*`
    Mul,
    /// `/`, always fractional
    Div,
    /// `DIV`, truncating
    IntDiv,
    /// `%` and `MOD`
    Mod,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `=`
    Eq,
    /// `<=>`
    NullSafeEq,
    /// `!=` and `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `IS`
    Is,
    /// `IS NOT`
    IsNot,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `REGEXP`
    Regexp,
    /// `NOT REGEXP`
    NotRegexp,
    /// `AND` and `&&`
    And,
    /// `XOR`
    Xor,
    /// `OR` and `||`
    Or,
}

/// Aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    /// Non-null values, or rows for `count(*)`
    Count,
    /// Total of numeric values
    Sum,
    /// Mean of numeric values
    Avg,
    /// Smallest value
    Min,
    /// Largest value
    Max,
}

impl AggregateFunction {
    /// Looks up an aggregate by (case-insensitive) name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Some(AggregateFunction::Count),
            "sum" => Some(AggregateFunction::Sum),
            "avg" => Some(AggregateFunction::Avg),
            "min" => Some(AggregateFunction::Min),
            "max" => Some(AggregateFunction::Max),
            _ => None,
        }
    }
}

/// Binding strength of each precedence level; higher binds tighter.
pub mod strength {
    /// `!`, unary `-`, `~`, `BINARY`
    pub const UNARY: u8 = 14;
    /// `^`
    pub const POW: u8 = 13;
    /// `*`, `/`, `DIV`, `%`, `MOD`
    pub const MULTIPLICATIVE: u8 = 12;
    /// `+`, `-`
    pub const ADDITIVE: u8 = 11;
    /// `<<`, `>>`
    pub const SHIFT: u8 = 10;
    /// `&`
    pub const BIT_AND: u8 = 9;
    /// `|`
    pub const BIT_OR: u8 = 8;
    /// Comparisons, `IS`, `LIKE`, `REGEXP`, `IN`, `BETWEEN`
    pub const COMPARISON: u8 = 7;
    /// `NOT`
    pub const NOT: u8 = 6;
    /// `AND`, `&&`
    pub const AND: u8 = 5;
    /// `XOR`
    pub const XOR: u8 = 4;
    /// `OR`, `||`
    pub const OR: u8 = 3;
    /// `:=`
    pub const ASSIGN: u8 = 2;
}

impl BinaryOperator {
    /// Precedence level of the operator
    pub fn strength(self) -> u8 {
        use BinaryOperator::*;
        match self {
            BitXor => strength::POW,
            Mul | Div | IntDiv | Mod => strength::MULTIPLICATIVE,
            Add | Sub => strength::ADDITIVE,
            Shl | Shr => strength::SHIFT,
            BitAnd => strength::BIT_AND,
            BitOr => strength::BIT_OR,
            Eq | NullSafeEq | Ne | Lt | Le | Gt | Ge | Is | IsNot | Like | NotLike | Regexp
            | NotRegexp => strength::COMPARISON,
            And => strength::AND,
            Xor => strength::XOR,
            Or => strength::OR,
        }
    }
}

/// A node of a compiled expression
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Constant value
    Literal(Value),
    /// Column reference
    Field(String),
    /// `*` inside `count(*)`
    Star,
    /// Prefix operator application
    Unary {
        /// Operator
        op: UnaryOperator,
        /// Operand
        operand: NodeId,
    },
    /// Infix operator application
    Binary {
        /// Operator
        op: BinaryOperator,
        /// Left operand
        left: NodeId,
        /// Right operand
        right: NodeId,
    },
    /// `expr [NOT] BETWEEN low AND high`
    Between {
        /// Whether `NOT` was given
        negated: bool,
        /// Tested value
        expr: NodeId,
        /// Inclusive lower bound
        low: NodeId,
        /// Inclusive upper bound
        high: NodeId,
    },
    /// `expr [NOT] IN (list)`
    InList {
        /// Whether `NOT` was given
        negated: bool,
        /// Tested value
        expr: NodeId,
        /// Candidates
        list: Vec<NodeId>,
    },
    /// Parenthesised list; only ever the right side of `IN`
    List(Vec<NodeId>),
    /// Scalar function call
    Call {
        /// Lowercased function name
        name: String,
        /// Arguments in order
        args: Vec<NodeId>,
    },
    /// Aggregate call, computed once per scope
    Aggregate {
        /// Aggregate function
        function: AggregateFunction,
        /// Argument, or a `Star` node for `count(*)`
        arg: NodeId,
    },
    /// Searched or simple `CASE`
    Case {
        /// Subject of a simple `CASE`
        operand: Option<NodeId>,
        /// `WHEN`/`THEN` pairs in order
        branches: Vec<(NodeId, NodeId)>,
        /// `ELSE` result
        otherwise: Option<NodeId>,
    },
    /// `name := value`
    Assign {
        /// Assigned name
        target: String,
        /// Assigned value, also the result
        value: NodeId,
    },
}

impl Node {
    /// Direct children of this node
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Node::Literal(_) | Node::Field(_) | Node::Star => Vec::new(),
            Node::Unary { operand, .. } => vec![*operand],
            Node::Binary { left, right, .. } => vec![*left, *right],
            Node::Between {
                expr, low, high, ..
            } => vec![*expr, *low, *high],
            Node::InList { expr, list, .. } => {
                let mut out = vec![*expr];
                out.extend(list);
                out
            }
            Node::List(items) => items.clone(),
            Node::Call { args, .. } => args.clone(),
            Node::Aggregate { arg, .. } => vec![*arg],
            Node::Case {
                operand,
                branches,
                otherwise,
            } => {
                let mut out: Vec<NodeId> = operand.iter().copied().collect();
                for (when, then) in branches {
                    out.push(*when);
                    out.push(*then);
                }
                out.extend(otherwise);
                out
            }
            Node::Assign { value, .. } => vec![*value],
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Not => write!(f, "NOT"),
            UnaryOperator::Negate => write!(f, "-"),
            UnaryOperator::BitNot => write!(f, "~"),
            UnaryOperator::Binary => write!(f, "BINARY"),
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BinaryOperator::BitXor => "^",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::IntDiv => "DIV",
            BinaryOperator::Mod => "%",
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Shl => "<<",
            BinaryOperator::Shr => ">>",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::Eq => "=",
            BinaryOperator::NullSafeEq => "<=>",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::Is => "IS",
            BinaryOperator::IsNot => "IS NOT",
            BinaryOperator::Like => "LIKE",
            BinaryOperator::NotLike => "NOT LIKE",
            BinaryOperator::Regexp => "REGEXP",
            BinaryOperator::NotRegexp => "NOT REGEXP",
            BinaryOperator::And => "AND",
            BinaryOperator::Xor => "XOR",
            BinaryOperator::Or => "OR",
        };
        write!(f, "{}", text)
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateFunction::Count => write!(f, "COUNT"),
            AggregateFunction::Sum => write!(f, "SUM"),
            AggregateFunction::Avg => write!(f, "AVG"),
            AggregateFunction::Min => write!(f, "MIN"),
            AggregateFunction::Max => write!(f, "MAX"),
        }
    }
}
