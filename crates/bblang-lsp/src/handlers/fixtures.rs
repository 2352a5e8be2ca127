//! A small compiled program shared by handler tests.
//!
//! ```text
//! 0 | // Adds two numbers.
//! 1 | export int add(int a, int b) { return a + b; }
//! 2 | struct Point { int x; }
//! 3 | int total = add(1, 2);
//! 4 | Point* p = new Point;
//! 5 | p.x;
//! ```
//!
//! Only depends on `bblang_core`, so integration tests can include it too.

#![allow(dead_code)]

use bblang_core::{
    AnalyzedType, ArgumentList, Block, Brackets, BuiltinType, CompiledField, CompiledFunction,
    CompiledParameter, CompiledStruct, CompilerResult, Expression, ExpressionKind,
    FieldDefinition, FileUri, FunctionDefinition, FunctionKind, GeneralType, KeywordCall,
    ParameterDefinition, ParsedFile, ParserResult, Range, Reference, ReferenceSite,
    SinglePosition, Statement, StructDefinition, StructType, Token, TokenType, TypeSyntax,
    VariableDefinition, VariableReference,
};

/// Source text of the fixture.
pub const SOURCE: &str = "// Adds two numbers.
export int add(int a, int b) { return a + b; }
struct Point { int x; }
int total = add(1, 2);
Point* p = new Point;
p.x;
";

/// URI of the fixture file.
pub fn main_uri() -> FileUri {
    FileUri::new("file:///project/main.bbc")
}

fn at(line: u32, start: u32, end: u32) -> Range {
    Range::on_line(line, start, end)
}

fn ident(text: &str, line: u32, start: u32) -> Token {
    Token::identifier(text, at(line, start, start + text.len() as u32))
}

fn op(text: &str, line: u32, start: u32) -> Token {
    Token::operator(text, at(line, start, start + text.len() as u32))
}

fn int() -> GeneralType {
    BuiltinType::Int.into()
}

/// The resolved `Point` type.
pub fn point() -> GeneralType {
    GeneralType::Struct(StructType {
        index: 0,
        name: "Point".to_string(),
        type_arguments: Vec::new(),
    })
}

/// Tokens with the compiler's annotations, comments included.
pub fn tokens() -> Vec<Token> {
    use AnalyzedType as A;
    vec![
        Token::new(TokenType::Comment, " Adds two numbers.", at(0, 0, 20)),
        ident("export", 1, 0).analyzed(A::Keyword),
        ident("int", 1, 7).analyzed(A::BuiltinType),
        ident("add", 1, 11).analyzed(A::FunctionName),
        op("(", 1, 14),
        ident("int", 1, 15).analyzed(A::BuiltinType),
        ident("a", 1, 19).analyzed(A::ParameterName),
        op(",", 1, 20),
        ident("int", 1, 22).analyzed(A::BuiltinType),
        ident("b", 1, 26).analyzed(A::ParameterName),
        op(")", 1, 27),
        op("{", 1, 29),
        ident("return", 1, 31).analyzed(A::Statement),
        ident("a", 1, 38).analyzed(A::ParameterName),
        op("+", 1, 40).analyzed(A::MathOperator),
        ident("b", 1, 42).analyzed(A::ParameterName),
        op(";", 1, 43),
        op("}", 1, 45),
        ident("struct", 2, 0).analyzed(A::Keyword),
        ident("Point", 2, 7).analyzed(A::Struct),
        op("{", 2, 13),
        ident("int", 2, 15).analyzed(A::BuiltinType),
        ident("x", 2, 19).analyzed(A::FieldName),
        op(";", 2, 20),
        op("}", 2, 22),
        ident("int", 3, 0).analyzed(A::BuiltinType),
        ident("total", 3, 4).analyzed(A::VariableName),
        op("=", 3, 10),
        ident("add", 3, 12).analyzed(A::FunctionName),
        op("(", 3, 15),
        Token::new(TokenType::LiteralNumber, "1", at(3, 16, 17)),
        op(",", 3, 17),
        Token::new(TokenType::LiteralNumber, "2", at(3, 19, 20)),
        op(")", 3, 20),
        op(";", 3, 21),
        ident("Point", 4, 0).analyzed(A::Struct),
        op("*", 4, 5).analyzed(A::TypeModifier),
        ident("p", 4, 7).analyzed(A::VariableName),
        op("=", 4, 9),
        ident("new", 4, 11).analyzed(A::Keyword),
        ident("Point", 4, 15).analyzed(A::Struct),
        op(";", 4, 20),
        ident("p", 5, 0).analyzed(A::VariableName),
        op(".", 5, 1),
        ident("x", 5, 2).analyzed(A::FieldName),
        op(";", 5, 3),
    ]
}

fn parameter(name: &str, type_start: u32, name_start: u32) -> ParameterDefinition {
    ParameterDefinition {
        modifiers: Vec::new(),
        type_syntax: TypeSyntax::simple(ident("int", 1, type_start)),
        identifier: ident(name, 1, name_start),
        range: at(1, type_start, name_start + 1),
    }
}

fn identifier_expression(
    name: &str,
    line: u32,
    start: u32,
    reference: Reference,
    ty: GeneralType,
) -> Expression {
    Expression::new(
        ExpressionKind::Identifier {
            identifier: ident(name, line, start),
            reference: Some(reference),
        },
        at(line, start, start + name.len() as u32),
    )
    .with_type(ty)
}

fn add_definition() -> FunctionDefinition {
    let sum = Expression::new(
        ExpressionKind::BinaryOperator {
            left: Box::new(identifier_expression(
                "a",
                1,
                38,
                Reference::Parameter { function: 0, parameter: 0 },
                int(),
            )),
            operator: op("+", 1, 40),
            right: Box::new(identifier_expression(
                "b",
                1,
                42,
                Reference::Parameter { function: 0, parameter: 1 },
                int(),
            )),
            reference: None,
        },
        at(1, 38, 43),
    )
    .with_type(int());

    FunctionDefinition {
        kind: FunctionKind::Function,
        file: Some(main_uri()),
        attributes: Vec::new(),
        modifiers: vec![ident("export", 1, 0)],
        return_type: TypeSyntax::simple(ident("int", 1, 7)),
        identifier: ident("add", 1, 11),
        template: None,
        parameters: vec![parameter("a", 15, 19), parameter("b", 22, 26)],
        block: Some(Block {
            brackets: Some(Brackets {
                open: op("{", 1, 29),
                close: op("}", 1, 45),
            }),
            statements: vec![Statement::KeywordCall(KeywordCall {
                keyword: ident("return", 1, 31),
                arguments: vec![sum],
                range: at(1, 31, 44),
            })],
            range: at(1, 29, 46),
        }),
        context: None,
        range: at(1, 0, 46),
    }
}

fn point_definition() -> StructDefinition {
    StructDefinition {
        file: Some(main_uri()),
        attributes: Vec::new(),
        modifiers: Vec::new(),
        keyword: ident("struct", 2, 0),
        identifier: ident("Point", 2, 7),
        template: None,
        fields: vec![FieldDefinition {
            modifiers: Vec::new(),
            type_syntax: TypeSyntax::simple(ident("int", 2, 15)),
            identifier: ident("x", 2, 19),
            range: at(2, 15, 21),
        }],
        range: at(2, 0, 23),
    }
}

fn statements() -> Vec<Statement> {
    let call = Expression::new(
        ExpressionKind::Call {
            callee: Box::new(Expression::new(
                ExpressionKind::Identifier {
                    identifier: ident("add", 3, 12),
                    reference: Some(Reference::Function {
                        index: 0,
                        type_arguments: None,
                    }),
                },
                at(3, 12, 15),
            )),
            arguments: ArgumentList {
                arguments: vec![
                    Expression::new(ExpressionKind::IntLiteral(1), at(3, 16, 17)).with_type(int()),
                    Expression::new(ExpressionKind::IntLiteral(2), at(3, 19, 20)).with_type(int()),
                ],
                commas: vec![op(",", 3, 17)],
                brackets: Brackets {
                    open: op("(", 3, 15),
                    close: op(")", 3, 20),
                },
            },
            reference: Some(Reference::Function {
                index: 0,
                type_arguments: None,
            }),
        },
        at(3, 12, 21),
    )
    .with_type(int());

    let total = Statement::VariableDefinition(VariableDefinition {
        file: Some(main_uri()),
        attributes: Vec::new(),
        modifiers: Vec::new(),
        type_syntax: TypeSyntax::simple(ident("int", 3, 0)),
        identifier: ident("total", 3, 4),
        initial_value: Some(call),
        compiled_type: Some(int()),
        range: at(3, 0, 22),
    });

    let pointer = GeneralType::pointer(point());
    let new_point = Expression::new(
        ExpressionKind::NewInstance {
            keyword: ident("new", 4, 11),
            type_syntax: TypeSyntax::simple(ident("Point", 4, 15)),
        },
        at(4, 11, 20),
    )
    .with_type(pointer.clone());

    let p = Statement::VariableDefinition(VariableDefinition {
        file: Some(main_uri()),
        attributes: Vec::new(),
        modifiers: Vec::new(),
        type_syntax: TypeSyntax::pointer(TypeSyntax::simple(ident("Point", 4, 0)), op("*", 4, 5)),
        identifier: ident("p", 4, 7),
        initial_value: Some(new_point),
        compiled_type: Some(pointer.clone()),
        range: at(4, 0, 21),
    });

    let access = Statement::Expression(
        Expression::new(
            ExpressionKind::Field {
                object: Box::new(identifier_expression(
                    "p",
                    5,
                    0,
                    Reference::Variable(p_reference()),
                    pointer,
                )),
                identifier: ident("x", 5, 2),
                reference: Some(Reference::Field {
                    structure: 0,
                    field: 0,
                }),
            },
            at(5, 0, 3),
        )
        .with_type(int()),
    );

    vec![total, p, access]
}

/// What `p` on line 5 resolves to.
pub fn p_reference() -> VariableReference {
    VariableReference {
        file: Some(main_uri()),
        modifiers: Vec::new(),
        ty: GeneralType::pointer(point()),
        identifier: ident("p", 4, 7),
    }
}

/// Syntax tree of the fixture.
pub fn ast() -> ParserResult {
    ParserResult {
        usings: Vec::new(),
        functions: vec![add_definition()],
        structs: vec![point_definition()],
        aliases: Vec::new(),
        top_level_statements: statements(),
    }
}

/// Compilation result of the fixture.
pub fn result() -> CompilerResult {
    let add = add_definition();
    let parameters = add
        .parameters
        .iter()
        .map(|definition| CompiledParameter {
            definition: definition.clone(),
            ty: int(),
        })
        .collect();
    let point_struct = point_definition();
    let fields = point_struct
        .fields
        .iter()
        .map(|definition| CompiledField {
            definition: definition.clone(),
            ty: int(),
        })
        .collect();

    CompilerResult {
        functions: vec![CompiledFunction {
            definition: add,
            return_type: int(),
            parameters,
            references: vec![ReferenceSite {
                source: at(3, 12, 21),
                file: Some(main_uri()),
            }],
        }],
        structs: vec![CompiledStruct {
            definition: point_struct,
            fields,
            references: vec![
                ReferenceSite {
                    source: at(4, 0, 5),
                    file: Some(main_uri()),
                },
                ReferenceSite {
                    source: at(4, 15, 20),
                    file: Some(main_uri()),
                },
            ],
        }],
        aliases: Vec::new(),
        constants: Vec::new(),
        files: vec![ParsedFile {
            file: main_uri(),
            tokens: tokens(),
            ast: ast(),
        }],
    }
}

/// Shorthand for a position.
pub const fn pos(line: u32, character: u32) -> SinglePosition {
    SinglePosition::new(line, character)
}
