//! Syntax tree returned by the parser.
//!
//! Nodes keep the tokens they were built from so positions can be recovered
//! for every identifier, operator and bracket. After compilation, expressions
//! additionally carry their resolved type and the definition they refer to.

use std::fmt;

use crate::definitions::Reference;
use crate::keywords::{has_modifier, CONST_MODIFIER, REF_MODIFIER, THIS_MODIFIER};
use crate::{FileUri, GeneralType, Range, Token, TokenType};

/// An opening and closing bracket pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Brackets {
    /// Opening bracket.
    pub open: Token,
    /// Closing bracket.
    pub close: Token,
}

impl Brackets {
    /// Span from the opening to the closing bracket.
    pub fn range(&self) -> Range {
        self.open.range.union(self.close.range)
    }
}

/// A type as written in source.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSyntax {
    /// `Name` or `Name<A, B>`.
    Simple {
        /// Type name.
        identifier: Token,
        /// Template arguments, if any were written.
        type_arguments: Option<Vec<TypeSyntax>>,
        /// Whole span.
        range: Range,
    },
    /// `T*`.
    Pointer {
        /// Pointed-to type.
        to: Box<TypeSyntax>,
        /// The `*` token.
        operator: Token,
        /// Whole span.
        range: Range,
    },
    /// `T[n]` or `T[]`.
    StackArray {
        /// Element type.
        of: Box<TypeSyntax>,
        /// Size expression, if written.
        size: Option<Box<Expression>>,
        /// The square brackets.
        brackets: Brackets,
        /// Length inferred by the compiler when the size is omitted.
        inferred_length: Option<usize>,
        /// Whole span.
        range: Range,
    },
    /// `R(P1, P2)`.
    Function {
        /// Return type.
        return_type: Box<TypeSyntax>,
        /// Parameter types.
        parameters: Vec<TypeSyntax>,
        /// The parentheses.
        brackets: Brackets,
        /// Whole span.
        range: Range,
    },
    /// A type the parser expected but did not find.
    Missing {
        /// Where it was expected.
        range: Range,
    },
}

impl TypeSyntax {
    /// A plain named type.
    pub fn simple(identifier: Token) -> Self {
        let range = identifier.range;
        Self::Simple {
            identifier,
            type_arguments: None,
            range,
        }
    }

    /// A pointer to `to`.
    pub fn pointer(to: Self, operator: Token) -> Self {
        let range = to.range().union(operator.range);
        Self::Pointer {
            to: Box::new(to),
            operator,
            range,
        }
    }

    /// Span of the whole type.
    pub fn range(&self) -> Range {
        match self {
            Self::Simple { range, .. }
            | Self::Pointer { range, .. }
            | Self::StackArray { range, .. }
            | Self::Function { range, .. }
            | Self::Missing { range } => *range,
        }
    }

    /// This type and every type nested inside it, outermost first.
    pub fn descendants(&self) -> Vec<&Self> {
        let mut result = vec![self];
        match self {
            Self::Simple {
                type_arguments: Some(arguments),
                ..
            } => {
                for argument in arguments {
                    result.extend(argument.descendants());
                }
            }
            Self::Pointer { to, .. } => result.extend(to.descendants()),
            Self::StackArray { of, .. } => result.extend(of.descendants()),
            Self::Function {
                return_type,
                parameters,
                ..
            } => {
                result.extend(return_type.descendants());
                for parameter in parameters {
                    result.extend(parameter.descendants());
                }
            }
            Self::Simple { .. } | Self::Missing { .. } => {}
        }
        result
    }
}

impl fmt::Display for TypeSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple {
                identifier,
                type_arguments,
                ..
            } => {
                f.write_str(&identifier.content)?;
                if let Some(arguments) = type_arguments {
                    f.write_str("<")?;
                    for (i, argument) in arguments.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{argument}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            Self::Pointer { to, .. } => write!(f, "{to}*"),
            Self::StackArray {
                of,
                inferred_length: Some(length),
                size: None,
                ..
            } => write!(f, "{of}[{length}]"),
            Self::StackArray { of, .. } => write!(f, "{of}[]"),
            Self::Function {
                return_type,
                parameters,
                ..
            } => {
                write!(f, "{return_type}(")?;
                for (i, parameter) in parameters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{parameter}")?;
                }
                f.write_str(")")
            }
            Self::Missing { .. } => f.write_str("?"),
        }
    }
}

/// An attribute attached to a definition, like `[External("print")]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeUsage {
    /// Attribute name.
    pub identifier: Token,
    /// Argument brackets, if written.
    pub brackets: Option<Brackets>,
    /// Attribute arguments.
    pub parameters: Vec<Expression>,
    /// Whole span.
    pub range: Range,
}

/// Argument list of a call.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentList {
    /// The arguments.
    pub arguments: Vec<Expression>,
    /// Separating commas.
    pub commas: Vec<Token>,
    /// The parentheses.
    pub brackets: Brackets,
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    /// What kind of expression this is.
    pub kind: ExpressionKind,
    /// Whole span.
    pub range: Range,
    /// Type assigned by the compiler.
    pub compiled_type: Option<GeneralType>,
}

/// The shapes an expression can take.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    /// Integer literal.
    IntLiteral(i32),
    /// Float literal.
    FloatLiteral(f32),
    /// Character literal.
    CharLiteral(char),
    /// String literal.
    StringLiteral(String),
    /// A bare name.
    Identifier {
        /// The name.
        identifier: Token,
        /// What the name refers to.
        reference: Option<Reference>,
    },
    /// `object.field`.
    Field {
        /// Accessed object.
        object: Box<Expression>,
        /// Field name.
        identifier: Token,
        /// The resolved field or method.
        reference: Option<Reference>,
    },
    /// `callee(arguments)`.
    Call {
        /// Called expression.
        callee: Box<Expression>,
        /// Arguments.
        arguments: ArgumentList,
        /// The resolved function.
        reference: Option<Reference>,
    },
    /// `left op right`.
    BinaryOperator {
        /// Left operand.
        left: Box<Expression>,
        /// Operator token.
        operator: Token,
        /// Right operand.
        right: Box<Expression>,
        /// User-defined operator, if one was selected.
        reference: Option<Reference>,
    },
    /// `op operand`.
    UnaryOperator {
        /// Operator token.
        operator: Token,
        /// Operand.
        operand: Box<Expression>,
        /// User-defined operator, if one was selected.
        reference: Option<Reference>,
    },
    /// `new T`.
    NewInstance {
        /// The `new` keyword.
        keyword: Token,
        /// Allocated type.
        type_syntax: TypeSyntax,
    },
    /// `new T(arguments)`.
    ConstructorCall {
        /// The `new` keyword.
        keyword: Token,
        /// Constructed type.
        type_syntax: TypeSyntax,
        /// Constructor arguments.
        arguments: ArgumentList,
        /// The resolved constructor.
        reference: Option<Reference>,
    },
    /// `(T)value`.
    ManagedTypeCast {
        /// Converted value.
        value: Box<Expression>,
        /// Target type.
        type_syntax: TypeSyntax,
        /// Parentheses around the type.
        brackets: Brackets,
    },
    /// `value as T`.
    Reinterpret {
        /// Reinterpreted value.
        value: Box<Expression>,
        /// The `as` keyword.
        keyword: Token,
        /// Target type.
        type_syntax: TypeSyntax,
    },
    /// `object[index]`.
    Index {
        /// Indexed object.
        object: Box<Expression>,
        /// Index value.
        index: Box<Expression>,
        /// Square brackets.
        brackets: Brackets,
        /// User-defined indexer, if one was selected.
        reference: Option<Reference>,
    },
    /// An expression the parser expected but did not find.
    Missing,
}

impl Expression {
    /// Create an untyped expression.
    pub const fn new(kind: ExpressionKind, range: Range) -> Self {
        Self {
            kind,
            range,
            compiled_type: None,
        }
    }

    /// Attach the compiled type.
    #[must_use]
    pub fn with_type(mut self, compiled_type: impl Into<GeneralType>) -> Self {
        self.compiled_type = Some(compiled_type.into());
        self
    }

    /// The definition this expression refers to.
    pub fn reference(&self) -> Option<&Reference> {
        match &self.kind {
            ExpressionKind::Identifier { reference, .. }
            | ExpressionKind::Field { reference, .. }
            | ExpressionKind::Call { reference, .. }
            | ExpressionKind::BinaryOperator { reference, .. }
            | ExpressionKind::UnaryOperator { reference, .. }
            | ExpressionKind::ConstructorCall { reference, .. }
            | ExpressionKind::Index { reference, .. } => reference.as_ref(),
            _ => None,
        }
    }

    /// The type written inside this expression, if any.
    pub fn type_syntax(&self) -> Option<&TypeSyntax> {
        match &self.kind {
            ExpressionKind::NewInstance { type_syntax, .. }
            | ExpressionKind::ConstructorCall { type_syntax, .. }
            | ExpressionKind::ManagedTypeCast { type_syntax, .. }
            | ExpressionKind::Reinterpret { type_syntax, .. } => Some(type_syntax),
            _ => None,
        }
    }
}

/// `[modifiers] Type name [= value];`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    /// File the definition lives in.
    pub file: Option<FileUri>,
    /// Attached attributes.
    pub attributes: Vec<AttributeUsage>,
    /// Modifier keywords.
    pub modifiers: Vec<Token>,
    /// Declared type.
    pub type_syntax: TypeSyntax,
    /// Variable name.
    pub identifier: Token,
    /// Initialiser.
    pub initial_value: Option<Expression>,
    /// Type assigned by the compiler.
    pub compiled_type: Option<GeneralType>,
    /// Whole span.
    pub range: Range,
}

impl VariableDefinition {
    /// Whether the variable is declared `const`.
    pub fn is_constant(&self) -> bool {
        has_modifier(&self.modifiers, CONST_MODIFIER)
    }
}

/// A keyword followed by arguments, like `return x;`.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordCall {
    /// The keyword.
    pub keyword: Token,
    /// Its arguments.
    pub arguments: Vec<Expression>,
    /// Whole span.
    pub range: Range,
}

/// `{ statements }`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// The braces, when written.
    pub brackets: Option<Brackets>,
    /// Contained statements.
    pub statements: Vec<Statement>,
    /// Whole span.
    pub range: Range,
}

/// `if`, `while` and `for` style control flow.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    /// The control keyword.
    pub keyword: Token,
    /// Condition, if the keyword takes one.
    pub condition: Option<Expression>,
    /// Body.
    pub body: Box<Statement>,
    /// `else` body.
    pub else_branch: Option<Box<Statement>>,
    /// Whole span.
    pub range: Range,
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// An expression used as a statement.
    Expression(Expression),
    /// A variable declaration.
    VariableDefinition(VariableDefinition),
    /// A keyword statement.
    KeywordCall(KeywordCall),
    /// A nested block.
    Block(Block),
    /// Control flow.
    Branch(Branch),
}

impl Statement {
    /// Whole span.
    pub const fn range(&self) -> Range {
        match self {
            Self::Expression(expression) => expression.range,
            Self::VariableDefinition(definition) => definition.range,
            Self::KeywordCall(call) => call.range,
            Self::Block(block) => block.range,
            Self::Branch(branch) => branch.range,
        }
    }
}

/// `using path;`
#[derive(Debug, Clone, PartialEq)]
pub struct UsingDefinition {
    /// The `using` keyword.
    pub keyword: Token,
    /// Path tokens.
    pub path: Vec<Token>,
    /// The file the compiler resolved this using to.
    pub compiled_uri: Option<FileUri>,
    /// Whole span.
    pub range: Range,
}

impl UsingDefinition {
    /// The path as written, with identifier segments joined by `/`.
    pub fn path_string(&self) -> String {
        if let [single] = self.path.as_slice() {
            return single.content.clone();
        }
        self.path
            .iter()
            .filter(|token| token.token_type != TokenType::Operator)
            .map(|token| token.content.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Span of the path tokens.
    pub fn path_range(&self) -> Option<Range> {
        let first = self.path.first()?;
        let last = self.path.last()?;
        Some(first.range.union(last.range))
    }
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDefinition {
    /// Modifier keywords.
    pub modifiers: Vec<Token>,
    /// Declared type.
    pub type_syntax: TypeSyntax,
    /// Parameter name.
    pub identifier: Token,
    /// Whole span.
    pub range: Range,
}

impl ParameterDefinition {
    /// Whether this is the receiver of an extension method.
    pub fn is_this(&self) -> bool {
        has_modifier(&self.modifiers, THIS_MODIFIER)
    }

    /// Whether the argument is passed by reference.
    pub fn is_ref(&self) -> bool {
        has_modifier(&self.modifiers, REF_MODIFIER)
    }
}

/// What sort of callable a [`FunctionDefinition`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// Regular function or method.
    Function,
    /// User-defined operator.
    Operator,
    /// Special member like an indexer or destructor.
    GeneralFunction,
    /// Struct constructor.
    Constructor,
}

/// A function, operator, general function or constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    /// Kind of callable.
    pub kind: FunctionKind,
    /// File the definition lives in.
    pub file: Option<FileUri>,
    /// Attached attributes.
    pub attributes: Vec<AttributeUsage>,
    /// Modifier keywords.
    pub modifiers: Vec<Token>,
    /// Return type. For constructors, the constructed type.
    pub return_type: TypeSyntax,
    /// Function name.
    pub identifier: Token,
    /// Template parameters.
    pub template: Option<Vec<Token>>,
    /// Parameters.
    pub parameters: Vec<ParameterDefinition>,
    /// Body.
    pub block: Option<Block>,
    /// Name of the struct this is a member of.
    pub context: Option<String>,
    /// Whole span.
    pub range: Range,
}

impl FunctionDefinition {
    /// Function name.
    pub fn name(&self) -> &str {
        &self.identifier.content
    }

    /// Whether the first parameter is a `this` receiver.
    pub fn is_extension(&self) -> bool {
        self.parameters.first().is_some_and(ParameterDefinition::is_this)
    }
}

/// A struct field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    /// Modifier keywords.
    pub modifiers: Vec<Token>,
    /// Declared type.
    pub type_syntax: TypeSyntax,
    /// Field name.
    pub identifier: Token,
    /// Whole span.
    pub range: Range,
}

/// `struct Name<T> { fields }`
#[derive(Debug, Clone, PartialEq)]
pub struct StructDefinition {
    /// File the definition lives in.
    pub file: Option<FileUri>,
    /// Attached attributes.
    pub attributes: Vec<AttributeUsage>,
    /// Modifier keywords.
    pub modifiers: Vec<Token>,
    /// The `struct` keyword.
    pub keyword: Token,
    /// Struct name.
    pub identifier: Token,
    /// Template parameters.
    pub template: Option<Vec<Token>>,
    /// Fields.
    pub fields: Vec<FieldDefinition>,
    /// Whole span.
    pub range: Range,
}

/// `alias Name Type;`
#[derive(Debug, Clone, PartialEq)]
pub struct AliasDefinition {
    /// File the definition lives in.
    pub file: Option<FileUri>,
    /// Attached attributes.
    pub attributes: Vec<AttributeUsage>,
    /// Modifier keywords.
    pub modifiers: Vec<Token>,
    /// The `alias` keyword.
    pub keyword: Token,
    /// Alias name.
    pub identifier: Token,
    /// Aliased type.
    pub value: TypeSyntax,
    /// Whole span.
    pub range: Range,
}

/// The parsed contents of one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParserResult {
    /// `using` declarations.
    pub usings: Vec<UsingDefinition>,
    /// Functions, operators, general functions and constructors.
    pub functions: Vec<FunctionDefinition>,
    /// Structs.
    pub structs: Vec<StructDefinition>,
    /// Aliases.
    pub aliases: Vec<AliasDefinition>,
    /// Statements outside any function.
    pub top_level_statements: Vec<Statement>,
}

impl ParserResult {
    /// Whether the parser produced nothing at all.
    pub fn is_empty(&self) -> bool {
        self.usings.is_empty()
            && self.functions.is_empty()
            && self.structs.is_empty()
            && self.aliases.is_empty()
            && self.top_level_statements.is_empty()
    }

    /// Every statement in the file: top-level statements, then function
    /// bodies, each in pre-order so nested statements follow their parent.
    pub fn statements(&self) -> Vec<&Statement> {
        let mut result = Vec::new();
        for statement in &self.top_level_statements {
            collect_statements(statement, &mut result);
        }
        for function in &self.functions {
            if let Some(block) = &function.block {
                for statement in &block.statements {
                    collect_statements(statement, &mut result);
                }
            }
        }
        result
    }

    /// Every type written at a declaration site or inside a statement.
    /// Nested types are not expanded.
    pub fn type_instances(&self) -> Vec<&TypeSyntax> {
        let mut result = Vec::new();
        for function in &self.functions {
            result.push(&function.return_type);
            for parameter in &function.parameters {
                result.push(&parameter.type_syntax);
            }
        }
        for structure in &self.structs {
            for field in &structure.fields {
                result.push(&field.type_syntax);
            }
        }
        for alias in &self.aliases {
            result.push(&alias.value);
        }
        let roots = self.top_level_statements.iter().chain(
            self.functions
                .iter()
                .filter_map(|function| function.block.as_ref())
                .flat_map(|block| &block.statements),
        );
        for statement in roots {
            for node in crate::walk::descendants(statement) {
                if let Some(type_syntax) = node.type_syntax() {
                    result.push(type_syntax);
                }
            }
        }
        result
    }
}

fn collect_statements<'a>(statement: &'a Statement, result: &mut Vec<&'a Statement>) {
    result.push(statement);
    match statement {
        Statement::Block(block) => {
            for inner in &block.statements {
                collect_statements(inner, result);
            }
        }
        Statement::Branch(branch) => {
            collect_statements(&branch.body, result);
            if let Some(else_branch) = &branch.else_branch {
                collect_statements(else_branch, result);
            }
        }
        Statement::Expression(_) | Statement::VariableDefinition(_) | Statement::KeywordCall(_) => {
        }
    }
}
