//! Parser for textual type mappings such as `Container<Inner, Other<Deep>>?`.
//!
//! A single forward scan jumps from delimiter to delimiter (`<`, `,`, `>`)
//! keeping a stack of types that are still collecting their arguments.

use crate::error::MappedTypeError;
use crate::ir::TypeDescriptor;

struct Frame {
    name: String,
    args: Vec<TypeDescriptor>,
    start: usize,
}

/// Parses a mapping string into a descriptor tree.
///
/// Names are trimmed. A `?` directly after a bare name or a closing `>` marks
/// that descriptor nullable; everything else is non-nullable.
pub fn parse_mapped_type(src: &str) -> Result<TypeDescriptor, MappedTypeError> {
    let mut stack: Vec<Frame> = Vec::new();
    // a type closed by `>` that is waiting for its delimiter
    let mut closed: Option<TypeDescriptor> = None;
    let mut cursor = 0;

    while let Some(offset) = src[cursor..].find(['<', ',', '>']) {
        let pos = cursor + offset;
        let text = &src[cursor..pos];
        match &src[pos..pos + 1] {
            "<" => {
                if closed.is_some() {
                    return Err(error(src, pos, "`<` after a closed type"));
                }
                let name = text.trim();
                if name.is_empty() || name.ends_with('?') {
                    return Err(error(src, cursor, "missing type name before `<`"));
                }
                stack.push(Frame { name: name.to_string(), args: Vec::new(), start: cursor });
                cursor = pos + 1;
            }
            "," => {
                if stack.is_empty() {
                    return Err(error(src, pos, "`,` outside of brackets"));
                }
                let arg = take_argument(src, cursor, text, closed.take())?;
                if let Some(top) = stack.last_mut() {
                    top.args.push(arg);
                }
                cursor = pos + 1;
            }
            _ => {
                let Some(mut frame) = stack.pop() else {
                    return Err(error(src, pos, "`>` without a matching `<`"));
                };
                let arg = take_argument(src, cursor, text, closed.take())?;
                frame.args.push(arg);
                cursor = pos + 1;

                let mut parameterized = TypeDescriptor::generic(frame.name, frame.args);
                let rest = &src[cursor..];
                let skipped = rest.len() - rest.trim_start().len();
                if rest.trim_start().starts_with('?') {
                    parameterized.nullable = true;
                    cursor += skipped + 1;
                }
                closed = Some(parameterized);
            }
        }
    }

    let rest = &src[cursor..];
    if let Some(frame) = stack.last() {
        return Err(error(src, frame.start, "unclosed `<`"));
    }
    match closed {
        Some(done) if rest.trim().is_empty() => Ok(done),
        Some(_) => Err(error(src, cursor, "trailing text after `>`")),
        None => bare(src, cursor, rest),
    }
}

fn take_argument(
    src: &str,
    at: usize,
    text: &str,
    closed: Option<TypeDescriptor>,
) -> Result<TypeDescriptor, MappedTypeError> {
    match closed {
        Some(done) if text.trim().is_empty() => Ok(done),
        Some(_) => Err(error(src, at, "unexpected text after `>`")),
        None => bare(src, at, text),
    }
}

fn bare(src: &str, at: usize, text: &str) -> Result<TypeDescriptor, MappedTypeError> {
    let text = text.trim();
    let (name, nullable) = match text.strip_suffix('?') {
        Some(name) => (name.trim_end(), true),
        None => (text, false),
    };
    if name.is_empty() {
        return Err(error(src, at, "empty type name"));
    }
    Ok(TypeDescriptor::named(name).with_nullable(nullable))
}

fn error(src: &str, position: usize, reason: &'static str) -> MappedTypeError {
    let fragment: String = src[position.min(src.len())..].chars().take(24).collect();
    MappedTypeError { mapping: src.to_string(), position, fragment, reason }
}
