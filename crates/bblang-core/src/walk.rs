//! Pre-order traversal of statements and expressions.

use crate::definitions::Reference;
use crate::syntax::{ExpressionKind, Statement};
use crate::{Expression, GeneralType, Range, TypeSyntax};

/// A node visited by [`descendants`].
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    /// A statement that is not a bare expression.
    Statement(&'a Statement),
    /// An expression, including expression statements.
    Expression(&'a Expression),
}

impl<'a> Node<'a> {
    /// Whole span of the node.
    pub fn range(&self) -> Range {
        match *self {
            Self::Statement(statement) => statement.range(),
            Self::Expression(expression) => expression.range,
        }
    }

    /// Type the compiler assigned to the node.
    pub fn compiled_type(&self) -> Option<&'a GeneralType> {
        match *self {
            Self::Statement(Statement::VariableDefinition(definition)) => {
                definition.compiled_type.as_ref()
            }
            Self::Statement(_) => None,
            Self::Expression(expression) => expression.compiled_type.as_ref(),
        }
    }

    /// Definition the node refers to.
    pub fn reference(&self) -> Option<&'a Reference> {
        match *self {
            Self::Statement(_) => None,
            Self::Expression(expression) => expression.reference(),
        }
    }

    /// Type syntax written directly in the node.
    pub fn type_syntax(&self) -> Option<&'a TypeSyntax> {
        match *self {
            Self::Statement(Statement::VariableDefinition(definition)) => {
                Some(&definition.type_syntax)
            }
            Self::Statement(_) => None,
            Self::Expression(expression) => expression.type_syntax(),
        }
    }
}

/// `statement` followed by everything nested inside it, parents before
/// children and siblings in source order.
pub fn descendants(statement: &Statement) -> Vec<Node<'_>> {
    let mut nodes = Vec::new();
    visit_statement(statement, &mut nodes);
    nodes
}

/// `expression` followed by everything nested inside it.
pub fn expression_descendants(expression: &Expression) -> Vec<Node<'_>> {
    let mut nodes = Vec::new();
    visit_expression(expression, &mut nodes);
    nodes
}

fn visit_statement<'a>(statement: &'a Statement, nodes: &mut Vec<Node<'a>>) {
    match statement {
        Statement::Expression(expression) => visit_expression(expression, nodes),
        Statement::VariableDefinition(definition) => {
            nodes.push(Node::Statement(statement));
            if let Some(value) = &definition.initial_value {
                visit_expression(value, nodes);
            }
        }
        Statement::KeywordCall(call) => {
            nodes.push(Node::Statement(statement));
            for argument in &call.arguments {
                visit_expression(argument, nodes);
            }
        }
        Statement::Block(block) => {
            nodes.push(Node::Statement(statement));
            for inner in &block.statements {
                visit_statement(inner, nodes);
            }
        }
        Statement::Branch(branch) => {
            nodes.push(Node::Statement(statement));
            if let Some(condition) = &branch.condition {
                visit_expression(condition, nodes);
            }
            visit_statement(&branch.body, nodes);
            if let Some(else_branch) = &branch.else_branch {
                visit_statement(else_branch, nodes);
            }
        }
    }
}

fn visit_expression<'a>(expression: &'a Expression, nodes: &mut Vec<Node<'a>>) {
    nodes.push(Node::Expression(expression));
    match &expression.kind {
        ExpressionKind::Field { object, .. } => visit_expression(object, nodes),
        ExpressionKind::Call {
            callee, arguments, ..
        } => {
            visit_expression(callee, nodes);
            for argument in &arguments.arguments {
                visit_expression(argument, nodes);
            }
        }
        ExpressionKind::BinaryOperator { left, right, .. } => {
            visit_expression(left, nodes);
            visit_expression(right, nodes);
        }
        ExpressionKind::UnaryOperator { operand, .. } => visit_expression(operand, nodes),
        ExpressionKind::ConstructorCall { arguments, .. } => {
            for argument in &arguments.arguments {
                visit_expression(argument, nodes);
            }
        }
        ExpressionKind::ManagedTypeCast { value, .. }
        | ExpressionKind::Reinterpret { value, .. } => visit_expression(value, nodes),
        ExpressionKind::Index { object, index, .. } => {
            visit_expression(object, nodes);
            visit_expression(index, nodes);
        }
        ExpressionKind::IntLiteral(_)
        | ExpressionKind::FloatLiteral(_)
        | ExpressionKind::CharLiteral(_)
        | ExpressionKind::StringLiteral(_)
        | ExpressionKind::Identifier { .. }
        | ExpressionKind::NewInstance { .. }
        | ExpressionKind::Missing => {}
    }
}
