use crate::errors::{Error, Result as TemplateResult};

/// The AST of stencil templates
#[doc(hidden)]
pub mod ast;
pub mod lexer;


use self::ast::*;
use self::lexer::{tokenize, Token, TokenKind};

/// Tokenizes and parses a template source into its list of top level nodes
pub fn parse(input: &str) -> TemplateResult<Vec<Node>> {
    let tokens = tokenize(input)?;
    Parser::new(&tokens).parse_template()
}

/// Recursive descent parser over the tokens of a single template
pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
}

impl<'a> Parser<'a> {
    /// The token list must end with an `Eof` token, as produced by the lexer
    pub fn new(tokens: &'a [Token]) -> Parser<'a> {
        Parser { tokens, current: 0 }
    }

    pub fn parse_template(&mut self) -> TemplateResult<Vec<Node>> {
        let (nodes, stop) = self.parse_nodes()?;
        if stop.kind != TokenKind::Eof {
            return Err(self.error_at(
                stop,
                format!("Unexpected `{}` outside of any block", stop.lexeme),
            ));
        }
        Ok(nodes)
    }

    fn peek(&self) -> &'a Token {
        let tokens: &'a [Token] = self.tokens;
        // the lexer always terminates the list with Eof and we never advance past it
        &tokens[self.current.min(tokens.len() - 1)]
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            return true;
        }
        false
    }

    fn expect(&mut self, kind: TokenKind) -> TemplateResult<&'a Token> {
        let token = self.peek();
        if token.kind != kind {
            return Err(self.unexpected(token, &kind.to_string()));
        }
        Ok(self.advance())
    }

    fn error_at(&self, token: &Token, message: impl ToString) -> Error {
        Error::syntax(message, token.line, token.position)
    }

    fn unexpected(&self, token: &Token, expected: &str) -> Error {
        if token.kind == TokenKind::Eof {
            return self.error_at(token, format!("Unexpected end of template, expected {}", expected));
        }
        self.error_at(token, format!("Unexpected `{}`, expected {}", token.lexeme, expected))
    }

    /// Parses text and statements until a tag that ends the current block
    /// (`#elseif`, `#else` or a closing tag) or the end of the template.
    /// Nested blocks are parsed recursively so only tags at the current level stop it.
    /// The stopping tag is consumed and returned, the `}}` after it is not.
    fn parse_nodes(&mut self) -> TemplateResult<(Vec<Node>, &'a Token)> {
        let mut nodes = vec![];

        loop {
            let token = self.advance();
            match token.kind {
                TokenKind::Text => nodes.push(Node::Text(token.lexeme.clone())),
                TokenKind::Eof => return Ok((nodes, token)),
                TokenKind::ExprStart => {
                    let next = self.peek();
                    match next.kind {
                        TokenKind::ElseIf | TokenKind::Else | TokenKind::Close => {
                            self.advance();
                            return Ok((nodes, next));
                        }
                        _ => nodes.push(self.parse_statement()?),
                    }
                }
                _ => return Err(self.unexpected(token, "text or `{{`")),
            }
        }
    }

    /// Parses what follows a `{{`, up to and including the `}}`
    fn parse_statement(&mut self) -> TemplateResult<Node> {
        let token = self.peek();
        match token.kind {
            TokenKind::Set => self.parse_set(),
            TokenKind::If => self.parse_if(),
            TokenKind::Not => self.parse_not(),
            TokenKind::Each => self.parse_each(),
            TokenKind::Include => self.parse_include(),
            TokenKind::RawHtml
                if self.tokens.get(self.current + 1).map(|t| t.kind) == Some(TokenKind::ExprEnd) =>
            {
                self.advance();
                self.advance();
                Ok(Node::RawHtml(token.lexeme.clone()))
            }
            _ => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::ExprEnd)?;
                Ok(Node::VariableBlock(expr))
            }
        }
    }

    fn parse_set(&mut self) -> TemplateResult<Node> {
        self.expect(TokenKind::Set)?;

        let name_token = self.advance();
        let name = match name_token.kind {
            TokenKind::Identifier | TokenKind::RawHtml => name_token.lexeme.clone(),
            _ => return Err(self.unexpected(name_token, "a variable name after `#set`")),
        };

        let mut path = vec![];
        loop {
            if self.matches(TokenKind::Dot) {
                for property in self.parse_property_name()? {
                    path.push(Accessor::Property(property));
                }
            } else if self.matches(TokenKind::LeftBracket) {
                let index = self.parse_expression()?;
                self.expect(TokenKind::RightBracket)?;
                path.push(Accessor::Computed(index));
            } else {
                break;
            }
        }

        self.expect(TokenKind::Assign)?;
        let value = self.parse_expression()?;
        self.expect(TokenKind::ExprEnd)?;

        Ok(Node::Set(Set { name, path, value }))
    }

    fn parse_if(&mut self) -> TemplateResult<Node> {
        let if_token = self.expect(TokenKind::If)?;
        let mut condition = self.parse_expression()?;
        self.expect(TokenKind::ExprEnd)?;

        let mut conditions = vec![];
        loop {
            let (body, stop) = self.parse_nodes()?;
            conditions.push((condition, body));

            match stop.kind {
                TokenKind::ElseIf => {
                    condition = self.parse_expression()?;
                    self.expect(TokenKind::ExprEnd)?;
                }
                TokenKind::Else => {
                    self.expect(TokenKind::ExprEnd)?;
                    let (body, stop) = self.parse_nodes()?;
                    self.expect_close(if_token, stop, "if")?;
                    return Ok(Node::If(If { conditions, otherwise: Some(body) }));
                }
                _ => {
                    self.expect_close(if_token, stop, "if")?;
                    return Ok(Node::If(If { conditions, otherwise: None }));
                }
            }
        }
    }

    fn parse_not(&mut self) -> TemplateResult<Node> {
        let not_token = self.expect(TokenKind::Not)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::ExprEnd)?;

        let (body, stop) = self.parse_nodes()?;
        self.expect_close(not_token, stop, "not")?;

        Ok(Node::Not(Not { condition, body }))
    }

    fn parse_each(&mut self) -> TemplateResult<Node> {
        let each_token = self.expect(TokenKind::Each)?;
        let tag = each_token.tag_name().to_string();
        let iterable = self.parse_expression()?;
        self.expect(TokenKind::ExprEnd)?;

        let (body, stop) = self.parse_nodes()?;
        self.expect_close(each_token, stop, &tag)?;

        Ok(Node::Each(Each { tag, iterable, body }))
    }

    fn parse_include(&mut self) -> TemplateResult<Node> {
        self.expect(TokenKind::Include)?;
        let path = self.parse_expression()?;
        self.expect(TokenKind::ExprEnd)?;

        Ok(Node::Include(path))
    }

    /// Checks that a block opened by `opening` was ended by `{{/name}}` and consumes the `}}`
    fn expect_close(&mut self, opening: &Token, stop: &Token, name: &str) -> TemplateResult<()> {
        match stop.kind {
            TokenKind::Close if stop.tag_name() == name => {
                self.expect(TokenKind::ExprEnd)?;
                Ok(())
            }
            TokenKind::Eof => Err(self.error_at(
                opening,
                format!("Unterminated `{}` tag: expected `{{{{/{}}}}}`", opening.lexeme, name),
            )),
            _ => Err(self.error_at(
                stop,
                format!("Unexpected `{}` inside `{}`, expected `{{{{/{}}}}}`", stop.lexeme, opening.lexeme, name),
            )),
        }
    }

    pub fn parse_expression(&mut self) -> TemplateResult<Expr> {
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> TemplateResult<Expr> {
        let condition = self.parse_logic()?;

        if self.matches(TokenKind::Question) {
            let if_true = self.parse_ternary()?;
            self.expect(TokenKind::Colon)?;
            let if_false = self.parse_ternary()?;
            return Ok(Expr::Ternary {
                condition: condition.boxed(),
                if_true: if_true.boxed(),
                if_false: if_false.boxed(),
            });
        }

        Ok(condition)
    }

    // `&&` and `||` have the same precedence and are left associative
    fn parse_logic(&mut self) -> TemplateResult<Expr> {
        let mut left = self.parse_comparison()?;

        loop {
            let operator = match self.peek().kind {
                TokenKind::And => LogicOperator::And,
                TokenKind::Or => LogicOperator::Or,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::Logical { operator, left: left.boxed(), right: right.boxed() };
        }

        Ok(left)
    }

    fn parse_comparison(&mut self) -> TemplateResult<Expr> {
        let mut left = self.parse_additive()?;

        loop {
            let operator = match self.peek().kind {
                TokenKind::Greater => ComparisonOperator::Gt,
                TokenKind::GreaterEqual => ComparisonOperator::Gte,
                TokenKind::Less => ComparisonOperator::Lt,
                TokenKind::LessEqual => ComparisonOperator::Lte,
                TokenKind::Equal => ComparisonOperator::Eq,
                TokenKind::NotEqual => ComparisonOperator::NotEq,
                TokenKind::StrictEqual => ComparisonOperator::StrictEq,
                TokenKind::StrictNotEqual => ComparisonOperator::StrictNotEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::Comparison { operator, left: left.boxed(), right: right.boxed() };
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> TemplateResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let operator = match self.peek().kind {
                TokenKind::Plus => MathOperator::Add,
                TokenKind::Minus => MathOperator::Sub,
                TokenKind::Ampersand => MathOperator::Concat,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary { operator, left: left.boxed(), right: right.boxed() };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> TemplateResult<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let operator = match self.peek().kind {
                TokenKind::Star => MathOperator::Mul,
                TokenKind::Slash => MathOperator::Div,
                TokenKind::Percent => MathOperator::Modulo,
                TokenKind::StarStar => MathOperator::Power,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary { operator, left: left.boxed(), right: right.boxed() };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> TemplateResult<Expr> {
        let operator = match self.peek().kind {
            TokenKind::Bang => UnaryOperator::Not,
            TokenKind::Minus => UnaryOperator::Neg,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let right = self.parse_unary()?;

        Ok(Expr::Unary { operator, right: right.boxed() })
    }

    /// A primary followed by any `.prop`/`[expr]` accesses and then any `| filter`s
    fn parse_postfix(&mut self) -> TemplateResult<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.matches(TokenKind::Dot) {
                for property in self.parse_property_name()? {
                    expr = Expr::Property { object: expr.boxed(), property };
                }
            } else if self.matches(TokenKind::LeftBracket) {
                let property = self.parse_expression()?;
                self.expect(TokenKind::RightBracket)?;
                expr = Expr::ComputedProperty { object: expr.boxed(), property: property.boxed() };
            } else {
                break;
            }
        }

        while self.matches(TokenKind::Pipe) {
            let filter = self.parse_filter()?;
            expr = Expr::Filter { expression: expr.boxed(), filter };
        }

        Ok(expr)
    }

    // `items.0.1` is lexed as `items`, `.`, `0.1` so a number can stand for two segments
    fn parse_property_name(&mut self) -> TemplateResult<Vec<String>> {
        let token = self.advance();
        match token.kind {
            TokenKind::Identifier
            | TokenKind::RawHtml
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null
            | TokenKind::This => Ok(vec![token.lexeme.clone()]),
            TokenKind::Number => Ok(token.lexeme.split('.').map(str::to_string).collect()),
            _ => Err(self.unexpected(token, "a property name after `.`")),
        }
    }

    fn parse_filter(&mut self) -> TemplateResult<FilterCall> {
        let name_token = self.advance();
        if name_token.kind != TokenKind::Identifier {
            return Err(self.unexpected(name_token, "a filter name after `|`"));
        }

        let mut args = vec![];
        if self.matches(TokenKind::LeftParen) {
            if !self.matches(TokenKind::RightParen) {
                loop {
                    args.push(self.parse_expression()?);
                    if self.matches(TokenKind::Comma) {
                        continue;
                    }
                    self.expect(TokenKind::RightParen)?;
                    break;
                }
            }
        }

        Ok(FilterCall { name: name_token.lexeme.clone(), args })
    }

    fn parse_primary(&mut self) -> TemplateResult<Expr> {
        let token = self.advance();

        let expr = match token.kind {
            TokenKind::Number | TokenKind::String => {
                Expr::Literal(token.literal.clone().unwrap_or(serde_json::Value::Null))
            }
            TokenKind::True => Expr::literal(true),
            TokenKind::False => Expr::literal(false),
            TokenKind::Null => Expr::Literal(serde_json::Value::Null),
            TokenKind::Identifier => Expr::Variable(token.lexeme.clone()),
            TokenKind::RawHtml => Expr::RawHtml(token.lexeme.clone()),
            TokenKind::This => Expr::This,
            TokenKind::IndexRef => Expr::IndexRef,
            TokenKind::KeyRef => Expr::KeyRef,
            TokenKind::LeftParen => {
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RightParen)?;
                inner
            }
            TokenKind::LeftBracket => self.parse_array()?,
            TokenKind::LeftBrace => self.parse_object()?,
            _ => return Err(self.unexpected(token, "an expression")),
        };

        Ok(expr)
    }

    // `[` already consumed
    fn parse_array(&mut self) -> TemplateResult<Expr> {
        let mut elements = vec![];

        while !self.check(TokenKind::RightBracket) {
            elements.push(self.parse_expression()?);
            if !self.matches(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightBracket)?;

        Ok(Expr::Array(elements))
    }

    // `{` already consumed
    fn parse_object(&mut self) -> TemplateResult<Expr> {
        let mut properties = vec![];

        while !self.check(TokenKind::RightBrace) {
            let key_token = self.advance();
            let key = match key_token.kind {
                TokenKind::Identifier | TokenKind::RawHtml | TokenKind::Number => key_token.lexeme.clone(),
                TokenKind::String => match key_token.literal {
                    Some(serde_json::Value::String(ref s)) => s.clone(),
                    _ => key_token.lexeme.clone(),
                },
                _ => return Err(self.unexpected(key_token, "an object key")),
            };
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expression()?;
            properties.push((key, value));

            if !self.matches(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightBrace)?;

        Ok(Expr::Object(properties))
    }
}
