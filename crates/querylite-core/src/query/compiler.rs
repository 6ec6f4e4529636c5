/// Expression compiler
///
/// Turns expression text into an arena-indexed tree with a classic
/// dual-stack precedence parser: operands go on one stack, operators and
/// open groups (parentheses, function calls, `IN` lists, `CASE`) on the
/// other. Before an operator is pushed, every stacked operator binding at
/// least as tightly is applied, so equal precedence associates left.
use super::ast::*;
use super::functions;
use super::lexer::{Lexer, Token};
use crate::error::{Error, Result};
use crate::value::Value;

/// Deepest operator nesting an expression may have
pub const MAX_EXPRESSION_DEPTH: usize = 256;

/// A compiled expression, ready to be evaluated against any table
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    text: String,
    nodes: Vec<Node>,
    root: NodeId,
}

impl Expression {
    /// Compiles expression text.
    pub fn compile(text: &str) -> Result<Self> {
        let tokens = Lexer::new(text).tokenize()?;
        let (nodes, root) = Compiler::new(tokens).compile()?;
        tracing::trace!(expression = text, nodes = nodes.len(), "compiled expression");
        Ok(Self {
            text: text.trim().to_string(),
            nodes,
            root,
        })
    }

    /// The source text, trimmed
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Id of the top node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The node stored under `id`
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Every node in creation order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Whether any aggregate call appears in the expression
    pub fn has_aggregate(&self) -> bool {
        self.nodes
            .iter()
            .any(|n| matches!(n, Node::Aggregate { .. }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaseState {
    Start,
    AfterWhen,
    AfterThen,
    AfterElse,
}

/// Entries of the operator stack
#[derive(Debug)]
enum StackItem {
    Unary(UnaryOperator, u8),
    Binary(BinaryOperator),
    In {
        negated: bool,
    },
    Between {
        negated: bool,
        armed: bool,
    },
    Assign,
    Paren {
        base: usize,
    },
    Call {
        name: String,
        base: usize,
    },
    List {
        base: usize,
    },
    Case {
        base: usize,
        state: CaseState,
        operand: Option<NodeId>,
        branches: Vec<(NodeId, NodeId)>,
        pending: Option<NodeId>,
    },
}

impl StackItem {
    /// Binding strength for operators; `None` for group frames.
    fn strength(&self) -> Option<u8> {
        match self {
            StackItem::Unary(_, s) => Some(*s),
            StackItem::Binary(op) => Some(op.strength()),
            StackItem::In { .. } | StackItem::Between { .. } => Some(strength::COMPARISON),
            StackItem::Assign => Some(strength::ASSIGN),
            _ => None,
        }
    }
}

struct Compiler {
    tokens: Vec<Token>,
    position: usize,
    nodes: Vec<Node>,
    operands: Vec<NodeId>,
    operators: Vec<StackItem>,
}

impl Compiler {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
            nodes: Vec::new(),
            operands: Vec::new(),
            operators: Vec::new(),
        }
    }

    fn compile(mut self) -> Result<(Vec<Node>, NodeId)> {
        let mut expect_operand = true;

        loop {
            let token = self.next();
            if expect_operand {
                expect_operand = self.operand_position(token)?;
            } else {
                match token {
                    Token::Eof => break,
                    token => expect_operand = self.operator_position(token)?,
                }
            }
        }

        self.reduce_while(|_| true)?;
        match self.operators.last() {
            None => {}
            Some(StackItem::Case { .. }) => return Err(syntax("CASE without END")),
            Some(_) => return Err(syntax("unclosed '('")),
        }
        if self.operands.len() != 1 {
            return Err(syntax("malformed expression"));
        }
        let root = self.operands[0];
        self.validate_stars(root)?;
        self.check_depth()?;
        Ok((self.nodes, root))
    }

    /// Handles a token where an operand is expected. Returns whether the
    /// next token is again expected to start an operand.
    fn operand_position(&mut self, token: Token) -> Result<bool> {
        match token {
            Token::Integer(i) => self.push_operand(Node::Literal(Value::Integer(i))),
            Token::Float(f) => self.push_operand(Node::Literal(Value::Float(f))),
            Token::String(s) => self.push_operand(Node::Literal(Value::String(s))),
            Token::Boolean(b) => self.push_operand(Node::Literal(Value::Boolean(b))),
            Token::Null => self.push_operand(Node::Literal(Value::Null)),
            Token::Identifier(name) => {
                if self.peek() != &Token::LeftParen {
                    self.push_operand(Node::Field(name));
                    return Ok(false);
                }
                self.next();
                let base = self.operands.len();
                self.operators.push(StackItem::Call { name, base });
                if self.peek() == &Token::RightParen {
                    self.next();
                    self.close_group()?;
                    return Ok(false);
                }
                return Ok(true);
            }
            Token::Asterisk => self.push_operand(Node::Star),
            Token::LeftParen => {
                let base = self.operands.len();
                self.operators.push(StackItem::Paren { base });
                return Ok(true);
            }
            Token::Minus => {
                self.operators
                    .push(StackItem::Unary(UnaryOperator::Negate, strength::UNARY));
                return Ok(true);
            }
            Token::Plus => return Ok(true),
            Token::Bang => {
                self.operators
                    .push(StackItem::Unary(UnaryOperator::Not, strength::UNARY));
                return Ok(true);
            }
            Token::Tilde => {
                self.operators
                    .push(StackItem::Unary(UnaryOperator::BitNot, strength::UNARY));
                return Ok(true);
            }
            Token::Binary => {
                self.operators
                    .push(StackItem::Unary(UnaryOperator::Binary, strength::UNARY));
                return Ok(true);
            }
            Token::Not => {
                self.operators
                    .push(StackItem::Unary(UnaryOperator::Not, strength::NOT));
                return Ok(true);
            }
            Token::Case => {
                let base = self.operands.len();
                self.operators.push(StackItem::Case {
                    base,
                    state: CaseState::Start,
                    operand: None,
                    branches: Vec::new(),
                    pending: None,
                });
                return Ok(true);
            }
            Token::When | Token::Then | Token::Else | Token::End => {
                return self.case_keyword(token);
            }
            Token::Interval => {
                return Err(Error::NotImplemented(
                    "INTERVAL arithmetic is not supported".to_string(),
                ))
            }
            Token::Eof => return Err(syntax("unexpected end of expression")),
            other => return Err(syntax(&format!("expected expression, found {}", other))),
        }
        Ok(false)
    }

    /// Handles a token where an operator is expected. Returns whether the
    /// next token is expected to start an operand.
    fn operator_position(&mut self, token: Token) -> Result<bool> {
        let op = match token {
            Token::Caret => BinaryOperator::BitXor,
            Token::Asterisk => BinaryOperator::Mul,
            Token::Slash => BinaryOperator::Div,
            Token::Div => BinaryOperator::IntDiv,
            Token::Percent | Token::Mod => BinaryOperator::Mod,
            Token::Plus => BinaryOperator::Add,
            Token::Minus => BinaryOperator::Sub,
            Token::Shl => BinaryOperator::Shl,
            Token::Shr => BinaryOperator::Shr,
            Token::Ampersand => BinaryOperator::BitAnd,
            Token::Pipe => BinaryOperator::BitOr,
            Token::Eq => BinaryOperator::Eq,
            Token::NullSafeEq => BinaryOperator::NullSafeEq,
            Token::Ne => BinaryOperator::Ne,
            Token::Lt => BinaryOperator::Lt,
            Token::Le => BinaryOperator::Le,
            Token::Gt => BinaryOperator::Gt,
            Token::Ge => BinaryOperator::Ge,
            Token::Like => BinaryOperator::Like,
            Token::Regexp => BinaryOperator::Regexp,
            Token::AndAnd => BinaryOperator::And,
            Token::Xor => BinaryOperator::Xor,
            Token::Or | Token::OrOr => BinaryOperator::Or,
            Token::And => {
                if !self.arm_between()? {
                    self.push_binary(BinaryOperator::And)?;
                }
                return Ok(true);
            }
            Token::Is => {
                if self.peek() == &Token::Not {
                    self.next();
                    BinaryOperator::IsNot
                } else {
                    BinaryOperator::Is
                }
            }
            Token::Not => match self.next() {
                Token::Like => BinaryOperator::NotLike,
                Token::Regexp => BinaryOperator::NotRegexp,
                Token::In => {
                    self.push_in(true)?;
                    return Ok(true);
                }
                Token::Between => {
                    self.push_between(true)?;
                    return Ok(true);
                }
                other => {
                    return Err(syntax(&format!(
                        "expected LIKE, REGEXP, IN or BETWEEN after NOT, found {}",
                        other
                    )))
                }
            },
            Token::In => {
                self.push_in(false)?;
                return Ok(true);
            }
            Token::Between => {
                self.push_between(false)?;
                return Ok(true);
            }
            Token::Assign => {
                self.reduce_while(|s| s > strength::ASSIGN)?;
                self.operators.push(StackItem::Assign);
                return Ok(true);
            }
            Token::Collate => {
                // The collation applies to the operand just read and does
                // not change its value.
                return match self.next() {
                    Token::Identifier(_) | Token::String(_) => Ok(false),
                    other => Err(syntax(&format!(
                        "expected collation name, found {}",
                        other
                    ))),
                };
            }
            Token::Comma => {
                self.reduce_while(|_| true)?;
                return match self.operators.last() {
                    Some(StackItem::Call { .. }) | Some(StackItem::List { .. }) => Ok(true),
                    _ => Err(syntax("unexpected ','")),
                };
            }
            Token::RightParen => {
                self.close_group()?;
                return Ok(false);
            }
            Token::When | Token::Then | Token::Else | Token::End => {
                return self.case_keyword(token);
            }
            other => return Err(syntax(&format!("expected operator, found {}", other))),
        };
        self.push_binary(op)?;
        Ok(true)
    }

    fn push_binary(&mut self, op: BinaryOperator) -> Result<()> {
        let incoming = op.strength();
        self.reduce_while(|s| s >= incoming)?;
        self.operators.push(StackItem::Binary(op));
        Ok(())
    }

    fn push_in(&mut self, negated: bool) -> Result<()> {
        self.reduce_while(|s| s >= strength::COMPARISON)?;
        self.operators.push(StackItem::In { negated });
        if self.next() != Token::LeftParen {
            return Err(syntax("expected '(' after IN"));
        }
        if self.peek() == &Token::RightParen {
            return Err(syntax("empty IN list"));
        }
        let base = self.operands.len();
        self.operators.push(StackItem::List { base });
        Ok(())
    }

    fn push_between(&mut self, negated: bool) -> Result<()> {
        self.reduce_while(|s| s >= strength::COMPARISON)?;
        self.operators.push(StackItem::Between {
            negated,
            armed: false,
        });
        Ok(())
    }

    /// Consumes an `AND` as the separator of a pending `BETWEEN`, if any.
    fn arm_between(&mut self) -> Result<bool> {
        let pending = self
            .operators
            .iter()
            .rev()
            .take_while(|item| item.strength().is_some())
            .any(|item| matches!(item, StackItem::Between { armed: false, .. }));
        if !pending {
            return Ok(false);
        }
        while !matches!(
            self.operators.last(),
            Some(StackItem::Between { armed: false, .. })
        ) {
            self.reduce_top()?;
        }
        if let Some(StackItem::Between { armed, .. }) = self.operators.last_mut() {
            *armed = true;
        }
        Ok(true)
    }

    /// Applies stacked operators while `pred` accepts their strength,
    /// stopping at the first group frame.
    fn reduce_while<F: Fn(u8) -> bool>(&mut self, pred: F) -> Result<()> {
        while let Some(s) = self.operators.last().and_then(StackItem::strength) {
            if !pred(s) {
                break;
            }
            self.reduce_top()?;
        }
        Ok(())
    }

    fn reduce_top(&mut self) -> Result<()> {
        let node = match self.operators.pop() {
            Some(StackItem::Unary(op, _)) => {
                let operand = self.pop_operand()?;
                Node::Unary { op, operand }
            }
            Some(StackItem::Binary(op)) => {
                let right = self.pop_operand()?;
                let left = self.pop_operand()?;
                Node::Binary { op, left, right }
            }
            Some(StackItem::In { negated }) => {
                let right = self.pop_operand()?;
                let expr = self.pop_operand()?;
                match &self.nodes[right] {
                    Node::List(items) => Node::InList {
                        negated,
                        expr,
                        list: items.clone(),
                    },
                    _ => return Err(syntax("IN expects a parenthesised list")),
                }
            }
            Some(StackItem::Between {
                negated,
                armed: true,
            }) => {
                let high = self.pop_operand()?;
                let low = self.pop_operand()?;
                let expr = self.pop_operand()?;
                Node::Between {
                    negated,
                    expr,
                    low,
                    high,
                }
            }
            Some(StackItem::Between { armed: false, .. }) => {
                return Err(syntax("BETWEEN without AND"))
            }
            Some(StackItem::Assign) => {
                let value = self.pop_operand()?;
                let target = self.pop_operand()?;
                let name = match &self.nodes[target] {
                    Node::Field(name) => name.clone(),
                    _ => return Err(syntax("left side of ':=' must be a name")),
                };
                // The target is a name, not a field reference.
                self.nodes[target] = Node::Literal(Value::Null);
                Node::Assign {
                    target: name,
                    value,
                }
            }
            _ => return Err(syntax("unmatched '('")),
        };
        self.push_operand(node);
        Ok(())
    }

    /// Handles `)`: closes the innermost parenthesis, call or list.
    fn close_group(&mut self) -> Result<()> {
        self.reduce_while(|_| true)?;
        match self.operators.pop() {
            Some(StackItem::Paren { base }) => {
                if self.operands.len() != base + 1 {
                    return Err(syntax("empty parentheses"));
                }
                Ok(())
            }
            Some(StackItem::Call { name, base }) => {
                let args = self.operands.split_off(base);
                let node = build_call(&self.nodes, name, args)?;
                self.push_operand(node);
                Ok(())
            }
            Some(StackItem::List { base }) => {
                let items = self.operands.split_off(base);
                self.push_operand(Node::List(items));
                Ok(())
            }
            Some(StackItem::Case { .. }) => Err(syntax("CASE without END")),
            _ => Err(syntax("unmatched ')'")),
        }
    }

    /// Handles WHEN / THEN / ELSE / END. Returns whether an operand follows.
    fn case_keyword(&mut self, token: Token) -> Result<bool> {
        self.reduce_while(|_| true)?;
        let (base, state, mut operand, mut branches, mut pending) = match self.operators.pop() {
            Some(StackItem::Case {
                base,
                state,
                operand,
                branches,
                pending,
            }) => (base, state, operand, branches, pending),
            _ => return Err(syntax(&format!("{} outside CASE", token))),
        };
        let segment = self.operands.split_off(base);
        let single = |segment: &[NodeId]| -> Result<NodeId> {
            match segment {
                [id] => Ok(*id),
                _ => Err(syntax(&format!("expected one expression before {}", token))),
            }
        };

        let next_state = match (&token, state) {
            (Token::When, CaseState::Start) => {
                if segment.len() > 1 {
                    return Err(syntax("expected one expression before WHEN"));
                }
                operand = segment.first().copied();
                CaseState::AfterWhen
            }
            (Token::When, CaseState::AfterThen) | (Token::Else, CaseState::AfterThen) => {
                let when = pending.take().ok_or_else(|| syntax("THEN without WHEN"))?;
                branches.push((when, single(&segment)?));
                if token == Token::When {
                    CaseState::AfterWhen
                } else {
                    CaseState::AfterElse
                }
            }
            (Token::Then, CaseState::AfterWhen) => {
                pending = Some(single(&segment)?);
                CaseState::AfterThen
            }
            (Token::End, CaseState::AfterThen) => {
                let when = pending.take().ok_or_else(|| syntax("THEN without WHEN"))?;
                branches.push((when, single(&segment)?));
                self.push_operand(Node::Case {
                    operand,
                    branches,
                    otherwise: None,
                });
                return Ok(false);
            }
            (Token::End, CaseState::AfterElse) => {
                let otherwise = Some(single(&segment)?);
                self.push_operand(Node::Case {
                    operand,
                    branches,
                    otherwise,
                });
                return Ok(false);
            }
            _ => return Err(syntax(&format!("unexpected {} in CASE", token))),
        };

        self.operators.push(StackItem::Case {
            base,
            state: next_state,
            operand,
            branches,
            pending,
        });
        Ok(true)
    }

    /// `*` may only appear as the argument of `count`.
    /// Children always sit before their parent in the arena.
    fn check_depth(&self) -> Result<()> {
        let mut depths = vec![0usize; self.nodes.len()];
        for (id, node) in self.nodes.iter().enumerate() {
            let depth = 1 + node
                .children()
                .iter()
                .map(|&c| depths.get(c).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);
            if depth > MAX_EXPRESSION_DEPTH {
                return Err(syntax("expression nested too deeply"));
            }
            depths[id] = depth;
        }
        Ok(())
    }

    fn validate_stars(&self, root: NodeId) -> Result<()> {
        if matches!(self.nodes[root], Node::Star) {
            return Err(syntax("'*' is only valid in count(*)"));
        }
        for node in &self.nodes {
            let allowed = matches!(
                node,
                Node::Aggregate {
                    function: AggregateFunction::Count,
                    ..
                }
            );
            if !allowed
                && node
                    .children()
                    .iter()
                    .any(|&c| matches!(self.nodes[c], Node::Star))
            {
                return Err(syntax("'*' is only valid in count(*)"));
            }
        }
        Ok(())
    }

    fn push_operand(&mut self, node: Node) {
        self.nodes.push(node);
        self.operands.push(self.nodes.len() - 1);
    }

    fn pop_operand(&mut self) -> Result<NodeId> {
        self.operands
            .pop()
            .ok_or_else(|| syntax("missing operand"))
    }

    fn next(&mut self) -> Token {
        let token = self.tokens.get(self.position).cloned().unwrap_or(Token::Eof);
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }
}

fn build_call(nodes: &[Node], name: String, args: Vec<NodeId>) -> Result<Node> {
    if let Some(function) = AggregateFunction::from_name(&name) {
        if args.len() != 1 {
            return Err(Error::Arity {
                function: name,
                expected: "exactly 1".to_string(),
                found: args.len(),
            });
        }
        if matches!(nodes[args[0]], Node::Star) && function != AggregateFunction::Count {
            return Err(syntax("'*' is only valid in count(*)"));
        }
        return Ok(Node::Aggregate {
            function,
            arg: args[0],
        });
    }
    let name = name.to_ascii_lowercase();
    functions::check_arity(&name, args.len())?;
    Ok(Node::Call { name, args })
}

fn syntax(msg: &str) -> Error {
    Error::Syntax(msg.to_string())
}
