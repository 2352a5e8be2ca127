//! Tests for position queries over syntax and resolved types.

use bblang_core::{BuiltinType, GeneralType, Range, SinglePosition, StructType, Token, TypeSyntax};
use bblang_lsp::handlers::utils::{from_lsp_range, to_lsp_range, utf16_len};
use bblang_lsp::query::narrow;
use proptest::prelude::*;

fn ident(text: &str, start: u32) -> Token {
    Token::identifier(text, Range::on_line(0, start, start + text.len() as u32))
}

fn array_of(element: GeneralType) -> GeneralType {
    GeneralType::Struct(StructType {
        index: 0,
        name: "Array".to_string(),
        type_arguments: vec![("T".to_string(), element)],
    })
}

#[test]
fn test_cursor_on_innermost_type_argument() {
    // Array<int*>
    // 0123456789A
    let pointer = TypeSyntax::pointer(
        TypeSyntax::simple(ident("int", 6)),
        Token::operator("*", Range::on_line(0, 9, 10)),
    );
    let syntax = TypeSyntax::Simple {
        identifier: ident("Array", 0),
        type_arguments: Some(vec![pointer]),
        range: Range::on_line(0, 0, 11),
    };
    let ty = array_of(GeneralType::pointer(BuiltinType::Int.into()));

    let (found, found_type) = narrow(&syntax, &ty, SinglePosition::new(0, 7));
    assert_eq!(found.range(), Range::on_line(0, 6, 9));
    assert_eq!(found_type, &GeneralType::Builtin(BuiltinType::Int));

    // Just after the `*` only the pointer contains the cursor.
    let (found, found_type) = narrow(&syntax, &ty, SinglePosition::new(0, 10));
    assert_eq!(found.range(), Range::on_line(0, 6, 10));
    assert_eq!(found_type, &GeneralType::pointer(BuiltinType::Int.into()));

    // On `Array` nothing narrows.
    let (found, found_type) = narrow(&syntax, &ty, SinglePosition::new(0, 2));
    assert_eq!(found.range(), syntax.range());
    assert_eq!(found_type, &ty);
}

#[test]
fn test_mismatched_shapes_stop_narrowing() {
    // `int*` written, but the compiler resolved a plain int.
    let syntax = TypeSyntax::pointer(
        TypeSyntax::simple(ident("int", 0)),
        Token::operator("*", Range::on_line(0, 3, 4)),
    );
    let ty: GeneralType = BuiltinType::Int.into();

    let (found, found_type) = narrow(&syntax, &ty, SinglePosition::new(0, 1));
    assert_eq!(found.range(), syntax.range());
    assert_eq!(found_type, &ty);
}

proptest! {
    #[test]
    fn prop_nested_pointers_narrow_to_base(depth in 0usize..8, offset in 0u32..3) {
        // int** ... * with the cursor somewhere on `int`
        let mut syntax = TypeSyntax::simple(ident("int", 0));
        let mut ty: GeneralType = BuiltinType::Int.into();
        for level in 0..depth {
            let column = 3 + level as u32;
            syntax = TypeSyntax::pointer(syntax, Token::operator("*", Range::on_line(0, column, column + 1)));
            ty = GeneralType::pointer(ty);
        }

        let (found, found_type) = narrow(&syntax, &ty, SinglePosition::new(0, offset));
        prop_assert_eq!(found.range(), Range::on_line(0, 0, 3));
        prop_assert_eq!(found_type, &GeneralType::Builtin(BuiltinType::Int));
    }

    #[test]
    fn prop_utf16_len_matches_encoding(text in "\\PC*") {
        prop_assert_eq!(utf16_len(&text) as usize, text.encode_utf16().count());
        prop_assert!(utf16_len(&text) as usize <= text.len());
    }

    #[test]
    fn prop_range_conversion_is_field_for_field(
        start_line in 0u32..10_000,
        start_character in 0u32..500,
        lines in 0u32..100,
        end_character in 0u32..500,
    ) {
        let range = Range::new(
            SinglePosition::new(start_line, start_character),
            SinglePosition::new(start_line + lines, end_character),
        );
        let converted = to_lsp_range(range);
        prop_assert_eq!(converted.start.line, start_line);
        prop_assert_eq!(converted.end.character, end_character);
        prop_assert_eq!(from_lsp_range(converted), range);
    }
}
