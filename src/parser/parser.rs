//! Token stream → `Instruction`/`Argument`/`Value` tree (§6, §10.1)

use indexmap::IndexMap;

use super::lexer::{self, Token};
use crate::ast::{Argument, Instruction, InstructionList, PropertyRef};
use crate::control_flow::RunError;
use crate::value::Value;

/// Parse a complete subroutine source file into an instruction list.
pub fn parse(source: &str) -> Result<InstructionList, RunError> {
    let mut instructions = Vec::new();
    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = (idx + 1) as u32;
        if raw_line.trim().is_empty() {
            continue;
        }
        let tokens = lexer::tokenize_line(raw_line).map_err(|message| RunError::ParseFailure { line: line_no, message })?;
        if tokens.is_empty() {
            continue;
        }
        let instruction = parse_instruction(&tokens, line_no)?;
        instructions.push(instruction);
    }
    Ok(instructions)
}

/// Parse the tokens of one logical line into a single `Instruction`.
fn parse_instruction(tokens: &[Token], line: u32) -> Result<Instruction, RunError> {
    let mut cursor = 0usize;
    let destination = if tokens.len() >= 2 && tokens.get(1) == Some(&Token::Arrow) {
        let name = match &tokens[0] {
            Token::Ident(name) => name.clone(),
            _ => {
                return Err(RunError::ParseFailure {
                    line,
                    message: "destination must be a bare slot name".to_string(),
                })
            }
        };
        cursor = 2;
        PropertyRef::new(name)
    } else {
        PropertyRef::current()
    };

    let opcode = match tokens.get(cursor) {
        Some(Token::Ident(name)) => name.clone(),
        _ => {
            return Err(RunError::ParseFailure {
                line,
                message: "expected an opcode".to_string(),
            })
        }
    };
    cursor += 1;

    let mut arguments = Vec::new();
    while cursor < tokens.len() {
        let (argument, next) = parse_argument(tokens, cursor, line)?;
        arguments.push(argument);
        cursor = next;
    }

    Ok(Instruction::new(destination, opcode, arguments, line))
}

/// Parse one instruction embedded inside an instruction-list literal
/// (`[ instr ; instr ]`); unlike a top-level line, the token span is
/// delimited by `;`/`]` rather than end-of-line.
fn parse_embedded_instruction(tokens: &[Token], line: u32) -> Result<Instruction, RunError> {
    parse_instruction(tokens, line)
}

fn parse_argument(tokens: &[Token], pos: usize, line: u32) -> Result<(Argument, usize), RunError> {
    match &tokens[pos] {
        Token::PropertyRef(name) => Ok((Argument::Ref(PropertyRef::new(name.clone())), pos + 1)),
        _ => {
            let (value, next) = parse_value(tokens, pos, line)?;
            Ok((Argument::Literal(value), next))
        }
    }
}

/// A bracketed group starting at `pos` (which must be `[`) denotes a
/// `List` value unless its first inner token is a bare identifier that
/// isn't itself number/`true`/`false`/`null` — in that case it denotes an
/// `InstructionList` (§10.1): `[return "ok"]` is one instruction, not a
/// two-element list of strings. Multiple instructions are `;`-separated.
fn parse_bracket(tokens: &[Token], pos: usize, line: u32) -> Result<(Value, usize), RunError> {
    let mut i = pos + 1; // past '['
    if tokens.get(i) == Some(&Token::RBracket) {
        return Ok((Value::List(Vec::new()), i + 1));
    }

    let looks_like_instruction = matches!(tokens.get(i), Some(Token::Ident(word)) if try_parse_number(word).is_none() && !matches!(word.as_str(), "true" | "false" | "null"));

    if looks_like_instruction {
        let mut instructions = Vec::new();
        loop {
            let start = i;
            while i < tokens.len() && tokens[i] != Token::Semicolon && tokens[i] != Token::RBracket {
                i += 1;
            }
            if i == start {
                return Err(RunError::ParseFailure { line, message: "empty instruction in instruction-list literal".to_string() });
            }
            instructions.push(parse_embedded_instruction(&tokens[start..i], line)?);
            match tokens.get(i) {
                Some(Token::Semicolon) => {
                    i += 1;
                    continue;
                }
                Some(Token::RBracket) => {
                    i += 1;
                    break;
                }
                _ => {
                    return Err(RunError::ParseFailure { line, message: "unterminated instruction-list literal".to_string() })
                }
            }
        }
        return Ok((Value::InstructionList(instructions), i));
    }

    let mut items = Vec::new();
    while tokens.get(i) != Some(&Token::RBracket) {
        if i >= tokens.len() {
            return Err(RunError::ParseFailure { line, message: "unterminated list literal".to_string() });
        }
        let (value, next) = parse_value(tokens, i, line)?;
        items.push(value);
        i = next;
    }
    Ok((Value::List(items), i + 1))
}

fn parse_brace(tokens: &[Token], pos: usize, line: u32) -> Result<(Value, usize), RunError> {
    let mut i = pos + 1; // past '{'
    let mut map = IndexMap::new();
    while tokens.get(i) != Some(&Token::RBrace) {
        if i >= tokens.len() {
            return Err(RunError::ParseFailure { line, message: "unterminated map literal".to_string() });
        }
        let key = match &tokens[i] {
            Token::Str(s) => s.clone(),
            Token::Ident(s) => s.clone(),
            _ => return Err(RunError::ParseFailure { line, message: "map key must be a string or bare word".to_string() }),
        };
        i += 1;
        if i >= tokens.len() {
            return Err(RunError::ParseFailure { line, message: "map literal missing value for key".to_string() });
        }
        let (value, next) = parse_value(tokens, i, line)?;
        map.insert(key, value);
        i = next;
    }
    Ok((Value::Map(map), i + 1))
}

fn parse_value(tokens: &[Token], pos: usize, line: u32) -> Result<(Value, usize), RunError> {
    match tokens.get(pos) {
        Some(Token::LBracket) => parse_bracket(tokens, pos, line),
        Some(Token::LBrace) => parse_brace(tokens, pos, line),
        Some(Token::Str(s)) => Ok((Value::String(s.clone()), pos + 1)),
        Some(Token::Ident(word)) => Ok((classify_ident(word), pos + 1)),
        Some(other) => Err(RunError::ParseFailure {
            line,
            message: format!("unexpected token {:?} in value position", other),
        }),
        None => Err(RunError::ParseFailure { line, message: "expected a value".to_string() }),
    }
}

fn classify_ident(word: &str) -> Value {
    match word {
        "null" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => try_parse_number(word).unwrap_or_else(|| Value::string(word)),
    }
}

fn try_parse_number(word: &str) -> Option<Value> {
    let (negative, rest) = match word.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, word),
    };
    if rest.is_empty() {
        return None;
    }
    if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        let magnitude = i64::from_str_radix(hex, 16).ok()?;
        return Some(Value::Int(if negative { -magnitude } else { magnitude }));
    }
    if rest.contains('.') {
        let value: f64 = word.parse().ok()?;
        return value.is_finite().then_some(Value::Float(value));
    }
    if rest.chars().all(|c| c.is_ascii_digit()) {
        let value: i64 = word.parse().ok()?;
        return Some(Value::Int(value));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_destination() {
        let instrs = parse("let 42").unwrap();
        assert_eq!(instrs.len(), 1);
        assert_eq!(instrs[0].destination, PropertyRef::current());
        assert_eq!(instrs[0].opcode, "let");
        assert_eq!(instrs[0].arguments, vec![Argument::Literal(Value::Int(42))]);
    }

    #[test]
    fn parses_explicit_destination() {
        let instrs = parse("x <- let 42").unwrap();
        assert_eq!(instrs[0].destination, PropertyRef::new("x"));
    }

    #[test]
    fn parses_property_ref_argument() {
        let instrs = parse("r <- await $t").unwrap();
        assert_eq!(instrs[0].arguments, vec![Argument::Ref(PropertyRef::new("t"))]);
    }

    #[test]
    fn parses_instruction_list_literal() {
        let instrs = parse(r#"t <- async [return "ok"]"#).unwrap();
        match &instrs[0].arguments[0] {
            Argument::Literal(Value::InstructionList(list)) => {
                assert_eq!(list.len(), 1);
                assert_eq!(list[0].opcode, "return");
            }
            other => panic!("expected instruction list literal, got {:?}", other),
        }
    }

    #[test]
    fn parses_hex_string_literal() {
        let instrs = parse(r#"_ <- int "0x2A""#).unwrap();
        assert_eq!(instrs[0].arguments, vec![Argument::Literal(Value::string("0x2A"))]);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let instrs = parse("# a comment\n\nlet _ 1\n").unwrap();
        assert_eq!(instrs.len(), 1);
    }

    #[test]
    fn parses_variadic_throw() {
        let instrs = parse(r#"throw "bad" 42"#).unwrap();
        assert_eq!(instrs[0].opcode, "throw");
        assert_eq!(instrs[0].arguments.len(), 2);
    }
}
