use std::fmt;

use serde_json::Value;

/// All math operators
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MathOperator {
    /// +
    Add,
    /// -
    Sub,
    /// *
    Mul,
    /// /
    Div,
    /// %
    Modulo,
    /// **
    Power,
    /// &, string concatenation
    Concat,
}

impl fmt::Display for MathOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match *self {
                MathOperator::Add => "+",
                MathOperator::Sub => "-",
                MathOperator::Mul => "*",
                MathOperator::Div => "/",
                MathOperator::Modulo => "%",
                MathOperator::Power => "**",
                MathOperator::Concat => "&",
            }
        )
    }
}

/// `&&` and `||`, which share the same precedence
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogicOperator {
    /// &&
    And,
    /// ||
    Or,
}

impl fmt::Display for LogicOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match *self {
                LogicOperator::And => "&&",
                LogicOperator::Or => "||",
            }
        )
    }
}

/// All comparison operators
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ComparisonOperator {
    /// >
    Gt,
    /// >=
    Gte,
    /// <
    Lt,
    /// <=
    Lte,
    /// ==
    Eq,
    /// !=
    NotEq,
    /// ===
    StrictEq,
    /// !==
    StrictNotEq,
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match *self {
                ComparisonOperator::Gt => ">",
                ComparisonOperator::Gte => ">=",
                ComparisonOperator::Lt => "<",
                ComparisonOperator::Lte => "<=",
                ComparisonOperator::Eq => "==",
                ComparisonOperator::NotEq => "!=",
                ComparisonOperator::StrictEq => "===",
                ComparisonOperator::StrictNotEq => "!==",
            }
        )
    }
}

/// Prefix operators
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
    /// !
    Not,
    /// -
    Neg,
}

/// A filter applied with `|`, eg `| truncate(3)`
#[derive(Clone, Debug, PartialEq)]
pub struct FilterCall {
    pub name: String,
    pub args: Vec<Expr>,
}

/// An expression is the node found in `{{ }}` blocks, tag arguments and filter arguments.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Strings, numbers, booleans and null
    Literal(Value),
    /// A bare name, looked up in the current loop item then in the global data
    Variable(String),
    /// A name starting with `html_`
    RawHtml(String),
    /// `object.property`
    Property { object: Box<Expr>, property: String },
    /// `object[property]`
    ComputedProperty { object: Box<Expr>, property: Box<Expr> },
    Unary { operator: UnaryOperator, right: Box<Expr> },
    /// `+ - * / % ** &`
    Binary { operator: MathOperator, left: Box<Expr>, right: Box<Expr> },
    Logical { operator: LogicOperator, left: Box<Expr>, right: Box<Expr> },
    Comparison { operator: ComparisonOperator, left: Box<Expr>, right: Box<Expr> },
    Ternary { condition: Box<Expr>, if_true: Box<Expr>, if_false: Box<Expr> },
    Array(Vec<Expr>),
    /// Object literal, keys in source order
    Object(Vec<(String, Expr)>),
    /// `expression | filter(args)`. A chain `a | f | g` nests as `g(f(a))`
    Filter { expression: Box<Expr>, filter: FilterCall },
    /// `@index`
    IndexRef,
    /// `@key`
    KeyRef,
    /// `this`
    This,
}

impl Expr {
    pub fn literal(value: impl Into<Value>) -> Expr {
        Expr::Literal(value.into())
    }

    pub fn variable(name: &str) -> Expr {
        Expr::Variable(name.to_string())
    }

    pub fn boxed(self) -> Box<Expr> {
        Box::new(self)
    }
}

/// One step of a `#set` property chain
#[derive(Clone, Debug, PartialEq)]
pub enum Accessor {
    /// `.name`
    Property(String),
    /// `[expr]`
    Computed(Expr),
}

/// Set a variable in the global data `{{#set user.name = "hey"}}`
#[derive(Clone, Debug, PartialEq)]
pub struct Set {
    /// The top level name being assigned
    pub name: String,
    /// Where to go inside `name` before assigning, empty for a plain assignment
    pub path: Vec<Accessor>,
    pub value: Expr,
}

/// `{{#if}}...{{#elseif}}...{{#else}}...{{/if}}`
#[derive(Clone, Debug, PartialEq)]
pub struct If {
    /// The `#if` condition and body followed by every `#elseif`, in source order
    pub conditions: Vec<(Expr, Vec<Node>)>,
    /// The optional `#else` block
    pub otherwise: Option<Vec<Node>>,
}

/// `{{#not cond}}...{{/not}}`, rendered when the condition is falsy
#[derive(Clone, Debug, PartialEq)]
pub struct Not {
    pub condition: Expr,
    pub body: Vec<Node>,
}

/// `{{#eachN items}}...{{/eachN}}`
#[derive(Clone, Debug, PartialEq)]
pub struct Each {
    /// The tag name, including its numeric suffix: `each`, `each1`...
    pub tag: String,
    /// Expression being iterated on
    pub iterable: Expr,
    pub body: Vec<Node>,
}

/// All the nodes that can be encountered in a template
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// Some actual text
    Text(String),
    /// A `{{ }}` interpolation
    VariableBlock(Expr),
    /// `{{ html_name }}`, written without escaping
    RawHtml(String),
    /// The `{{#set val = something}}` tag
    Set(Set),
    If(If),
    Not(Not),
    Each(Each),
    /// The `{{#include("path")}}` tag, the path being any expression
    Include(Expr),
}
