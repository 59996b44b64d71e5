//! Recursive descent parser for the object query language.
//!
//! The grammar is HQL-shaped: `SELECT ... FROM ... [JOIN ...] [WHERE ...]
//! [GROUP BY ...] [HAVING ...] [ORDER BY ...]`, with subqueries allowed
//! anywhere an expression is. Keywords are case-insensitive. Aggregate and
//! map function names are not reserved; they are recognized only when
//! followed by `(`.

mod lexer;
use lexer::{Keyword, Token, TokenKind};

use crate::ast::{
    Aggregate, AggregateFunc, BinaryOp, Expr, FromRoot, Ident, Join, JoinKind, Literal, MapFn,
    OrderBy, Path, Query, Select, SelectItem,
};

use oql_core::{Error, Result};

/// Parses a complete query.
pub fn parse(text: &str) -> Result<Query> {
    let tokens = lexer::lex(text)?;
    let mut parser = Parser {
        tokens,
        idx: 0,
        depth: 0,
    };
    let query = parser.parse_query()?;
    parser.expect_eof()?;
    Ok(query)
}

/// Deepest nesting of expressions, subqueries, `NOT` and unary minus
/// accepted before parsing gives up.
const MAX_DEPTH: usize = 128;

struct Parser {
    tokens: Vec<Token>,
    idx: usize,

    /// Current nesting depth
    depth: usize,
}

impl Parser {
    fn parse_query(&mut self) -> Result<Query> {
        let offset = self.current().start;

        let select = if self.consume_keyword(Keyword::Select) {
            let distinct = self.consume_keyword(Keyword::Distinct);
            let mut items = vec![self.parse_select_item()?];
            while self.consume(&TokenKind::Comma) {
                items.push(self.parse_select_item()?);
            }
            Some(Select { distinct, items })
        } else {
            None
        };

        self.expect_keyword(Keyword::From, "expected `FROM`")?;

        let mut from = vec![self.parse_from_root()?];
        while self.consume(&TokenKind::Comma) {
            from.push(self.parse_from_root()?);
        }

        let mut joins = vec![];
        while let Some(join) = self.parse_join()? {
            joins.push(join);
        }

        let filter = if self.consume_keyword(Keyword::Where) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let mut group_by = vec![];
        if self.consume_keyword(Keyword::Group) {
            self.expect_keyword(Keyword::By, "expected `BY` after `GROUP`")?;
            group_by.push(self.parse_expr()?);
            while self.consume(&TokenKind::Comma) {
                group_by.push(self.parse_expr()?);
            }
        }

        let having = if self.consume_keyword(Keyword::Having) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let mut order_by = vec![];
        if self.consume_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By, "expected `BY` after `ORDER`")?;
            loop {
                let expr = self.parse_expr()?;
                let desc = if self.consume_keyword(Keyword::Desc) {
                    true
                } else {
                    self.consume_keyword(Keyword::Asc);
                    false
                };
                order_by.push(OrderBy { expr, desc });

                if !self.consume(&TokenKind::Comma) {
                    break;
                }
            }
        }

        Ok(Query {
            select,
            from,
            joins,
            filter,
            group_by,
            having,
            order_by,
            offset,
        })
    }

    fn parse_select_item(&mut self) -> Result<SelectItem> {
        let expr = self.parse_expr()?;
        let alias = self.parse_alias()?;
        Ok(SelectItem { expr, alias })
    }

    fn parse_from_root(&mut self) -> Result<FromRoot> {
        let path = self.parse_path()?;
        let alias = self.parse_alias()?;
        Ok(FromRoot { path, alias })
    }

    fn parse_join(&mut self) -> Result<Option<Join>> {
        let kind = if self.consume_keyword(Keyword::Left) {
            self.consume_keyword(Keyword::Outer);
            self.expect_keyword(Keyword::Join, "expected `JOIN` after `LEFT`")?;
            JoinKind::Left
        } else if self.consume_keyword(Keyword::Inner) {
            self.expect_keyword(Keyword::Join, "expected `JOIN` after `INNER`")?;
            JoinKind::Inner
        } else if self.consume_keyword(Keyword::Join) {
            JoinKind::Inner
        } else {
            return Ok(None);
        };

        let path = self.parse_path()?;
        let alias = self.parse_alias()?;
        let with = if self.consume_keyword(Keyword::With) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(Some(Join {
            kind,
            path,
            alias,
            with,
        }))
    }

    /// `[AS] ident`
    fn parse_alias(&mut self) -> Result<Option<Ident>> {
        if self.consume_keyword(Keyword::As) {
            return self.parse_ident().map(Some);
        }

        if matches!(self.current_kind(), TokenKind::Identifier(_)) {
            return self.parse_ident().map(Some);
        }

        Ok(None)
    }

    fn parse_path(&mut self) -> Result<Path> {
        let mut segments = vec![self.parse_ident()?];
        while self.consume(&TokenKind::Dot) {
            segments.push(self.parse_ident()?);
        }
        Ok(Path { segments })
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Ident {
                    name,
                    offset: token.start,
                })
            }
            TokenKind::Keyword(keyword) => Err(Error::syntax(
                token.start,
                format!("reserved keyword `{keyword:?}` cannot be used as an identifier"),
            )),
            _ => Err(self.error_at_current("expected an identifier")),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.nested(Self::parse_or)
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut operands = vec![self.parse_and()?];
        while self.consume_keyword(Keyword::Or) {
            operands.push(self.parse_and()?);
        }

        Ok(match operands.len() {
            1 => operands.remove(0),
            _ => Expr::Or(operands),
        })
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut operands = vec![self.parse_not()?];
        while self.consume_keyword(Keyword::And) {
            operands.push(self.parse_not()?);
        }

        Ok(match operands.len() {
            1 => operands.remove(0),
            _ => Expr::And(operands),
        })
    }

    fn parse_not(&mut self) -> Result<Expr> {
        // `NOT EXISTS` is parsed as a primary
        if self.peek_keyword(Keyword::Not) && !self.peek_nth_keyword(1, Keyword::Exists) {
            self.advance();
            return Ok(Expr::Not(Box::new(self.nested(Self::parse_not)?)));
        }

        self.parse_predicate()
    }

    fn parse_predicate(&mut self) -> Result<Expr> {
        let lhs = self.parse_additive()?;

        if let Some(op) = self.comparison_op() {
            self.advance();
            let rhs = self.parse_additive()?;
            return Ok(Expr::Binary {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            });
        }

        if self.consume_keyword(Keyword::Is) {
            let negate = self.consume_keyword(Keyword::Not);
            self.expect_keyword(Keyword::Null, "expected `NULL` after `IS`")?;
            return Ok(Expr::IsNull {
                expr: Box::new(lhs),
                negate,
            });
        }

        let negate = self.consume_keyword(Keyword::Not);

        if self.consume_keyword(Keyword::In) {
            self.expect(&TokenKind::LParen, "expected `(` after `IN`")?;

            let expr = if self.starts_query() {
                let query = self.parse_query()?;
                Expr::InSubquery {
                    expr: Box::new(lhs),
                    query: Box::new(query),
                    negate,
                }
            } else {
                let mut list = vec![self.parse_expr()?];
                while self.consume(&TokenKind::Comma) {
                    list.push(self.parse_expr()?);
                }
                Expr::InList {
                    expr: Box::new(lhs),
                    list,
                    negate,
                }
            };

            self.expect(&TokenKind::RParen, "expected `)`")?;
            return Ok(expr);
        }

        if self.consume_keyword(Keyword::Between) {
            let low = self.parse_additive()?;
            self.expect_keyword(Keyword::And, "expected `AND` in `BETWEEN`")?;
            let high = self.parse_additive()?;
            return Ok(Expr::Between {
                expr: Box::new(lhs),
                low: Box::new(low),
                high: Box::new(high),
                negate,
            });
        }

        if self.consume_keyword(Keyword::Like) {
            let pattern = self.parse_additive()?;
            return Ok(Expr::Like {
                expr: Box::new(lhs),
                pattern: Box::new(pattern),
                negate,
            });
        }

        if negate {
            return Err(self.error_at_current("expected `IN`, `BETWEEN` or `LIKE` after `NOT`"));
        }

        Ok(lhs)
    }

    fn comparison_op(&self) -> Option<BinaryOp> {
        Some(match self.current_kind() {
            TokenKind::Equal => BinaryOp::Eq,
            TokenKind::NotEqual => BinaryOp::Ne,
            TokenKind::Less => BinaryOp::Lt,
            TokenKind::LessEqual => BinaryOp::Le,
            TokenKind::Greater => BinaryOp::Gt,
            TokenKind::GreaterEqual => BinaryOp::Ge,
            _ => return None,
        })
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.consume(&TokenKind::Minus) {
            return Ok(match self.nested(Self::parse_unary)? {
                Expr::Literal(Literal::Integer(v)) => Expr::Literal(Literal::Integer(-v)),
                Expr::Literal(Literal::Decimal(v)) => Expr::Literal(Literal::Decimal(-v)),
                expr => Expr::Neg(Box::new(expr)),
            });
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.current().clone();

        match token.kind {
            TokenKind::Integer(v) => {
                self.advance();
                Ok(Expr::Literal(Literal::Integer(v)))
            }
            TokenKind::Decimal(v) => {
                self.advance();
                Ok(Expr::Literal(Literal::Decimal(v)))
            }
            TokenKind::String(v) => {
                self.advance();
                Ok(Expr::Literal(Literal::String(v)))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(true)))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(false)))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }
            TokenKind::Parameter(name) => {
                self.advance();
                Ok(Expr::Param(Ident {
                    name,
                    offset: token.start,
                }))
            }
            TokenKind::Keyword(Keyword::Exists) => {
                self.advance();
                self.parse_exists()
            }
            TokenKind::Keyword(Keyword::Not) => {
                // Only reached for `NOT EXISTS`
                self.advance();
                self.expect_keyword(Keyword::Exists, "expected `EXISTS` after `NOT`")?;
                Ok(Expr::Not(Box::new(self.parse_exists()?)))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = if self.starts_query() {
                    Expr::Subquery(Box::new(self.parse_query()?))
                } else {
                    self.parse_expr()?
                };
                self.expect(&TokenKind::RParen, "expected `)`")?;
                Ok(expr)
            }
            TokenKind::Identifier(name)
                if matches!(self.peek_nth_kind(1), Some(TokenKind::LParen)) =>
            {
                self.parse_call(&name, token.start)
            }
            TokenKind::Identifier(_) => Ok(Expr::Path(self.parse_path()?)),
            TokenKind::Eof => Err(self.error_at_current("unexpected end of query")),
            _ => Err(self.error_at_current("expected an expression")),
        }
    }

    fn parse_exists(&mut self) -> Result<Expr> {
        self.expect(&TokenKind::LParen, "expected `(` after `EXISTS`")?;
        if !self.starts_query() {
            return Err(self.error_at_current("expected a subquery"));
        }
        let query = self.parse_query()?;
        self.expect(&TokenKind::RParen, "expected `)`")?;
        Ok(Expr::Exists(Box::new(query)))
    }

    /// Parses `name(...)`, positioned at `name`.
    fn parse_call(&mut self, name: &str, offset: usize) -> Result<Expr> {
        if let Some(func) = AggregateFunc::from_name(name) {
            // Skip name and `(`
            self.advance();
            self.advance();

            let distinct = self.consume_keyword(Keyword::Distinct);
            let arg = if self.consume(&TokenKind::Star) {
                if func != AggregateFunc::Count || distinct {
                    return Err(Error::syntax(offset, "`*` is only allowed in `COUNT(*)`"));
                }
                None
            } else {
                Some(Box::new(self.parse_expr()?))
            };
            self.expect(&TokenKind::RParen, "expected `)`")?;

            return Ok(Expr::Aggregate(Aggregate {
                func,
                arg,
                distinct,
                offset,
            }));
        }

        if let Some(func) = MapFn::from_name(name) {
            self.advance();
            self.advance();

            let alias = self.parse_ident()?;
            self.expect(&TokenKind::RParen, "expected `)`")?;
            return Ok(Expr::MapFn(func, alias));
        }

        Err(Error::syntax(offset, format!("unknown function `{name}`")))
    }

    fn starts_query(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Keyword(Keyword::Select | Keyword::From)
        )
    }

    fn expect_keyword(&mut self, keyword: Keyword, message: &'static str) -> Result<()> {
        if self.consume_keyword(keyword) {
            return Ok(());
        }
        Err(self.error_at_current(message))
    }

    fn expect(&mut self, kind: &TokenKind, message: &'static str) -> Result<()> {
        if self.consume(kind) {
            return Ok(());
        }
        Err(self.error_at_current(message))
    }

    fn expect_eof(&self) -> Result<()> {
        if matches!(self.current_kind(), TokenKind::Eof) {
            return Ok(());
        }
        Err(self.error_at_current("unexpected token after end of query"))
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> bool {
        if self.peek_keyword(keyword) {
            self.advance();
            return true;
        }
        false
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.current_kind() == kind {
            self.advance();
            return true;
        }
        false
    }

    fn peek_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.current_kind(), TokenKind::Keyword(kv) if *kv == keyword)
    }

    fn peek_nth_kind(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.idx + n).map(|token| &token.kind)
    }

    fn peek_nth_keyword(&self, n: usize, keyword: Keyword) -> bool {
        matches!(self.peek_nth_kind(n), Some(TokenKind::Keyword(kv)) if *kv == keyword)
    }

    fn current(&self) -> &Token {
        &self.tokens[self.idx]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn advance(&mut self) {
        if self.idx + 1 < self.tokens.len() {
            self.idx += 1;
        }
    }

    /// Runs `parse` one nesting level deeper.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error_at_current("query nested too deeply"));
        }

        self.depth += 1;
        let ret = parse(self);
        self.depth -= 1;
        ret
    }

    fn error_at_current(&self, message: &str) -> Error {
        Error::syntax(self.current().start, message)
    }
}
