use sqlparser::{
    ast::{
        BinaryOperator, Expr, SelectItem as SqlSelectItem, SetExpr, Statement, TableFactor,
        UnaryOperator, Value as SqlValue,
    },
    dialect::SQLiteDialect,
    parser::Parser,
};

use crate::{planner::error::PlannerError, types::value::Value};

/// One entry of the select list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Column(String),
    Wildcard,
    CountStar,
}

/// `column = literal`, the only predicate shape supported.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualityFilter {
    pub column: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub table: String,
    pub projection: Vec<SelectItem>,
    pub filter: Option<EqualityFilter>,
}

pub struct SqlParser;

impl Default for SqlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_select(&self, sql: &str) -> Result<SelectStatement, PlannerError> {
        let dialect = SQLiteDialect {};
        let statements = Parser::parse_sql(&dialect, sql)?;

        if statements.len() != 1 {
            return Err(PlannerError::InvalidQuery(
                "Expected exactly one statement".to_string(),
            ));
        }

        match &statements[0] {
            Statement::Query(query) => self.to_select(&query.body),
            other => Err(PlannerError::UnsupportedStatement(other.to_string())),
        }
    }

    fn to_select(&self, body: &SetExpr) -> Result<SelectStatement, PlannerError> {
        let SetExpr::Select(select) = body else {
            return Err(PlannerError::UnsupportedStatement(body.to_string()));
        };

        let [from] = select.from.as_slice() else {
            return Err(PlannerError::InvalidQuery(
                "Expected exactly one table in FROM".to_string(),
            ));
        };
        if !from.joins.is_empty() {
            return Err(PlannerError::InvalidQuery("Joins are not supported".to_string()));
        }
        let table = match &from.relation {
            TableFactor::Table { name, .. } => name
                .0
                .last()
                .map(|ident| ident.value.clone())
                .unwrap_or_default(),
            other => return Err(PlannerError::InvalidQuery(format!("Unsupported FROM: {}", other))),
        };

        let projection = select
            .projection
            .iter()
            .map(|item| self.to_select_item(item))
            .collect::<Result<Vec<_>, _>>()?;

        let filter = select
            .selection
            .as_ref()
            .map(|expr| self.to_filter(expr))
            .transpose()?;

        Ok(SelectStatement {
            table,
            projection,
            filter,
        })
    }

    fn to_select_item(&self, item: &SqlSelectItem) -> Result<SelectItem, PlannerError> {
        match item {
            SqlSelectItem::Wildcard(_) | SqlSelectItem::QualifiedWildcard(..) => Ok(SelectItem::Wildcard),
            SqlSelectItem::UnnamedExpr(expr) | SqlSelectItem::ExprWithAlias { expr, .. } => {
                match expr {
                    Expr::Function(function) if function.name.to_string().eq_ignore_ascii_case("count") => {
                        Ok(SelectItem::CountStar)
                    }
                    _ => column_name(expr)
                        .map(SelectItem::Column)
                        .ok_or_else(|| PlannerError::UnsupportedExpression(expr.to_string())),
                }
            }
        }
    }

    fn to_filter(&self, expr: &Expr) -> Result<EqualityFilter, PlannerError> {
        match expr {
            Expr::Nested(inner) => self.to_filter(inner),
            Expr::BinaryOp {
                left,
                op: BinaryOperator::Eq,
                right,
            } => {
                let (column, literal) = match (column_name(left), column_name(right)) {
                    (Some(column), None) => (column, right),
                    (None, Some(column)) => (column, left),
                    _ => return Err(PlannerError::UnsupportedExpression(expr.to_string())),
                };
                Ok(EqualityFilter {
                    column,
                    value: literal_value(literal)?,
                })
            }
            other => Err(PlannerError::UnsupportedExpression(other.to_string())),
        }
    }
}

fn column_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.clone()),
        Expr::CompoundIdentifier(idents) => idents.last().map(|i| i.value.clone()),
        Expr::Nested(inner) => column_name(inner),
        _ => None,
    }
}

fn literal_value(expr: &Expr) -> Result<Value, PlannerError> {
    match expr {
        Expr::Nested(inner) => literal_value(inner),
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr,
        } => match literal_value(expr)? {
            Value::Integer(i) => Ok(Value::Integer(-i)),
            Value::Real(r) => Ok(Value::Real(-r)),
            _ => Err(PlannerError::UnsupportedExpression(expr.to_string())),
        },
        Expr::Value(value) => match value {
            SqlValue::Number(text, _) => text
                .parse::<i64>()
                .map(Value::Integer)
                .or_else(|_| text.parse::<f64>().map(Value::Real))
                .map_err(|_| PlannerError::UnsupportedExpression(text.clone())),
            SqlValue::SingleQuotedString(s) | SqlValue::DoubleQuotedString(s) => {
                Ok(Value::Text(s.clone()))
            }
            SqlValue::Boolean(b) => Ok(Value::Integer(*b as i64)),
            SqlValue::Null => Ok(Value::Null),
            other => Err(PlannerError::UnsupportedExpression(other.to_string())),
        },
        other => Err(PlannerError::UnsupportedExpression(other.to_string())),
    }
}
