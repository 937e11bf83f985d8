use core::fmt;
use std::collections::{HashMap, HashSet};

use redcode::{default_modifiers, AddrMode, Modifier, Opcode, RelaxedCompleteInstruction, RelaxedWarrior};

/// Converts CoreWar assembly source (labels, `EQU`, `ORG`, `END`, and
/// arithmetic operand expressions) into a [`RelaxedWarrior`].
///
/// This is a two-pass lowering: the first pass walks the source once,
/// recording label positions and `EQU` right-hand-sides while queueing each
/// instruction with its operands kept as unevaluated text; the second pass
/// evaluates every operand expression now that every label's position is
/// known, so a label may be referenced before its definition.
///
/// `builtins` supplies named integer constants available to every operand
/// expression (e.g. `CORESIZE`), keeping this crate from depending on
/// whatever type owns those properties.
///
/// # Errors
///
/// Returns an [`AssembleError`] describing the first malformed line, unknown
/// mnemonic, unknown symbol, or invalid expression character encountered.
pub fn assemble(
    source: &str,
    builtins: &[(&str, i64)],
) -> Result<RelaxedWarrior, AssembleError> {
    let queued = pass_a(source)?;
    pass_b(queued, builtins)
}

/// Possible failures while assembling source text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssembleError {
    /// 1-indexed source line where the problem was found.
    pub line: usize,
    /// What went wrong.
    pub kind: AssembleErrorKind,
}

/// The specific reason assembly failed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AssembleErrorKind {
    /// A line had no recognizable opcode or pseudo-op after its labels.
    MissingOpcode,
    /// A token that should have named an opcode didn't match one.
    UnknownOpcode(String),
    /// A token following `.` didn't match a known modifier.
    UnknownModifier(String),
    /// `EQU` appeared with no label on its line, and no prior `EQU` to
    /// continue.
    EquWithoutLabel,
    /// An operand expression referenced a name not present in any symbol
    /// table.
    UnknownSymbol(String),
    /// An operand expression contained a character outside the whitelist.
    InvalidCharacter(char),
    /// An operand expression divided or took the remainder by zero.
    DivideByZero,
    /// An operand expression could not be parsed as arithmetic.
    MalformedExpression(String),
    /// An `EQU` definition referenced itself, directly or transitively.
    CircularEqu(String),
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "on line {}: ", self.line)?;
        match &self.kind {
            AssembleErrorKind::MissingOpcode => {
                write!(f, "expected an opcode or pseudo-op after the labels")
            }
            AssembleErrorKind::UnknownOpcode(tok) => {
                write!(f, "`{tok}` is not a valid opcode")
            }
            AssembleErrorKind::UnknownModifier(tok) => {
                write!(f, "`{tok}` is not a valid modifier")
            }
            AssembleErrorKind::EquWithoutLabel => {
                write!(f, "EQU used without a label to bind it to")
            }
            AssembleErrorKind::UnknownSymbol(name) => {
                write!(f, "`{name}` is not a known label, EQU, or constant")
            }
            AssembleErrorKind::InvalidCharacter(ch) => {
                write!(f, "`{ch}` is not a valid character in an expression")
            }
            AssembleErrorKind::DivideByZero => {
                write!(f, "division or modulo by zero in an expression")
            }
            AssembleErrorKind::MalformedExpression(text) => {
                write!(f, "`{text}` is not a valid arithmetic expression")
            }
            AssembleErrorKind::CircularEqu(name) => {
                write!(f, "EQU `{name}` is defined in terms of itself")
            }
        }
    }
}

/// One not-yet-evaluated instruction produced by [`pass_a`].
struct QueuedInstruction {
    /// Source line, for error messages.
    line: usize,
    opcode: Opcode,
    /// Explicit `.modifier`, if the line gave one; otherwise inferred from
    /// addressing modes once operands are evaluated.
    modifier: Option<Modifier>,
    /// Unevaluated A operand text, with its addressing-mode prefix intact.
    a_operand: Option<String>,
    /// Unevaluated B operand text, with its addressing-mode prefix intact.
    b_operand: Option<String>,
}

/// Output of the symbol-discovery pass: queued instructions plus every table
/// needed to evaluate their operands.
struct PassAOutput {
    /// Value of the last evaluated `ORG`/`END` operand, if any.
    origin: Option<i64>,
    /// Label name to the output index of the instruction it names.
    labels: HashMap<String, usize>,
    /// `EQU` name to its unevaluated right-hand-side text.
    equ_constants: HashMap<String, String>,
    /// Instructions in output order, operands not yet evaluated.
    queue: Vec<QueuedInstruction>,
    /// Warrior name captured from a `;name` header comment.
    name: Option<String>,
    /// Warrior author captured from a `;author` header comment.
    author: Option<String>,
}

/// Case-insensitively matches a token against an [`Opcode`] mnemonic.
fn lookup_opcode(token: &str) -> Option<Opcode> {
    match token.to_ascii_uppercase().as_str() {
        "DAT" => Some(Opcode::Dat),
        "MOV" => Some(Opcode::Mov),
        "ADD" => Some(Opcode::Add),
        "SUB" => Some(Opcode::Sub),
        "MUL" => Some(Opcode::Mul),
        "DIV" => Some(Opcode::Div),
        "MOD" => Some(Opcode::Mod),
        "JMP" => Some(Opcode::Jmp),
        "JMZ" => Some(Opcode::Jmz),
        "JMN" => Some(Opcode::Jmn),
        "DJN" => Some(Opcode::Djn),
        "SPL" => Some(Opcode::Spl),
        "SLT" => Some(Opcode::Slt),
        "CMP" => Some(Opcode::Cmp),
        "SEQ" => Some(Opcode::Seq),
        "SNE" => Some(Opcode::Sne),
        "NOP" => Some(Opcode::Nop),
        "LDP" => Some(Opcode::Ldp),
        "STP" => Some(Opcode::Stp),
        _ => None,
    }
}

/// Case-insensitively matches a token against a [`Modifier`] mnemonic.
fn lookup_modifier(token: &str) -> Option<Modifier> {
    match token.to_ascii_uppercase().as_str() {
        "A" => Some(Modifier::A),
        "B" => Some(Modifier::B),
        "AB" => Some(Modifier::AB),
        "BA" => Some(Modifier::BA),
        "F" => Some(Modifier::F),
        "X" => Some(Modifier::X),
        "I" => Some(Modifier::I),
        _ => None,
    }
}

/// True if `token` (ignoring an optional `.modifier` suffix) names an opcode
/// or one of the pseudo-ops, meaning it can't be a label.
fn is_mnemonic(token: &str) -> bool {
    let head = token.split('.').next().unwrap_or(token);
    let upper = head.to_ascii_uppercase();
    lookup_opcode(head).is_some() || upper == "ORG" || upper == "EQU" || upper == "END"
}

/// Strips a trailing `:` from a label token.
fn strip_label(token: &str) -> &str {
    token.strip_suffix(':').unwrap_or(token)
}

/// Runs symbol discovery (label/EQU/ORG/END bookkeeping) over `source`.
fn pass_a(source: &str) -> Result<PassAOutput, AssembleError> {
    let mut origin = None;
    let mut labels = HashMap::new();
    let mut equ_constants: HashMap<String, String> = HashMap::new();
    let mut queue = Vec::new();
    let mut name = None;
    let mut author = None;
    let mut seen_code = false;
    let mut last_equ_name: Option<String> = None;
    let mut output_index = 0_usize;

    for (zero_indexed_line, raw_line) in source.lines().enumerate() {
        let line = zero_indexed_line.saturating_add(1);
        let trimmed = raw_line.trim();

        if trimmed.is_empty() {
            continue;
        }

        if let Some(comment) = trimmed.strip_prefix(';') {
            if !seen_code {
                capture_header(comment, &mut name, &mut author);
            }
            continue;
        }

        let (code_part, _comment) =
            trimmed.split_once(';').unwrap_or((trimmed, ""));
        let code_part = code_part.trim();
        if code_part.is_empty() {
            continue;
        }
        seen_code = true;

        let mut tokens: Vec<&str> = code_part.split_whitespace().collect();

        // Leading tokens that aren't a reserved word are labels, but the
        // last token on the line is always kept as the opcode/pseudo-op
        // candidate, even if it won't turn out to name one, so that an
        // unrecognized single mnemonic is reported as such rather than
        // silently swallowed as a label.
        let mut line_labels = Vec::new();
        while tokens.len() > 1 {
            let Some(first) = tokens.first() else {
                break;
            };
            if is_mnemonic(first) {
                break;
            }
            line_labels.push(strip_label(first).to_owned());
            tokens.remove(0);
        }

        let Some(mnemonic_token) = tokens.first().copied() else {
            return Err(AssembleError {
                line,
                kind: AssembleErrorKind::MissingOpcode,
            });
        };
        tokens.remove(0);

        let (opcode_str, modifier_str) =
            mnemonic_token.split_once('.').map_or_else(
                || (mnemonic_token, None),
                |(opc, modif)| (opc, Some(modif)),
            );

        let upper_opcode = opcode_str.to_ascii_uppercase();
        if upper_opcode == "ORG" {
            let expr = tokens.join(" ");
            origin = Some(eval_immediate(&expr, line, &equ_constants, &[])?);
        } else if upper_opcode == "END" {
            if !tokens.is_empty() {
                let expr = tokens.join(" ");
                origin = Some(eval_immediate(&expr, line, &equ_constants, &[])?);
            }
            break;
        } else if upper_opcode == "EQU" {
            let rhs = tokens.join(" ");
            if let Some(label) = line_labels.first() {
                equ_constants.insert(label.clone(), rhs);
                last_equ_name = Some(label.clone());
            } else if let Some(prior) = &last_equ_name {
                equ_constants
                    .entry(prior.clone())
                    .and_modify(|existing| {
                        existing.push('\n');
                        existing.push_str(&rhs);
                    });
            } else {
                return Err(AssembleError {
                    line,
                    kind: AssembleErrorKind::EquWithoutLabel,
                });
            }
        } else {
            let Some(opcode) = lookup_opcode(opcode_str) else {
                return Err(AssembleError {
                    line,
                    kind: AssembleErrorKind::UnknownOpcode(opcode_str.to_owned()),
                });
            };
            let modifier = modifier_str
                .map(|modif_token| {
                    lookup_modifier(modif_token).ok_or_else(|| AssembleError {
                        line,
                        kind: AssembleErrorKind::UnknownModifier(
                            modif_token.to_owned(),
                        ),
                    })
                })
                .transpose()?;

            let operands = tokens.join(" ");
            let (a_operand, b_operand) = match operands.split_once(',') {
                Some((a, b)) => (
                    non_empty(a.trim()),
                    non_empty(b.trim()),
                ),
                // A single bare operand is the A-field for every opcode
                // except DAT, where the ICWS deep-instruction convention
                // makes it the B-field and leaves A defaulted.
                None if opcode == Opcode::Dat => {
                    (None, non_empty(operands.trim()))
                }
                None => (non_empty(operands.trim()), None),
            };

            for label in &line_labels {
                labels.insert(label.clone(), output_index);
            }
            queue.push(QueuedInstruction {
                line,
                opcode,
                modifier,
                a_operand,
                b_operand,
            });
            output_index = output_index.saturating_add(1);
        }
    }

    Ok(PassAOutput {
        origin,
        labels,
        equ_constants,
        queue,
        name,
        author,
    })
}

/// Returns `Some(s.to_owned())` unless `s` is empty.
fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_owned())
}

/// Recognizes `;name <text>` and `;author <text>` header comments.
fn capture_header(
    comment: &str,
    name: &mut Option<String>,
    author: &mut Option<String>,
) {
    let trimmed = comment.trim_start();
    if let Some(rest) = strip_keyword(trimmed, "name") {
        *name = Some(rest.trim().to_owned());
    } else if let Some(rest) = strip_keyword(trimmed, "author") {
        *author = Some(rest.trim().to_owned());
    }
}

/// If `text` starts with `keyword` (case-insensitively) followed by
/// whitespace or the end of the string, returns the remainder.
fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let head = text.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let tail = text.get(keyword.len()..)?;
    if tail.is_empty() || tail.starts_with(char::is_whitespace) {
        Some(tail)
    } else {
        None
    }
}

/// Evaluates an `ORG`/`END` operand immediately, using only the symbols
/// already known (no forward-referenced labels, matching the reference
/// implementation's single top-to-bottom evaluation of these pseudo-ops).
fn eval_immediate(
    expr: &str,
    line: usize,
    equ_constants: &HashMap<String, String>,
    builtins: &[(&str, i64)],
) -> Result<i64, AssembleError> {
    let resolver = SymbolTable {
        builtins,
        equ_constants,
        labels: &HashMap::new(),
        current_index: 0,
    };
    evaluate_expression(expr, line, &resolver, &mut HashSet::new())
}

/// Evaluates every queued instruction's operands against the full symbol
/// table built by [`pass_a`].
fn pass_b(
    output: PassAOutput,
    builtins: &[(&str, i64)],
) -> Result<RelaxedWarrior, AssembleError> {
    let mut code = Vec::with_capacity(output.queue.len());
    for (index, queued) in output.queue.iter().enumerate() {
        let resolver = SymbolTable {
            builtins,
            equ_constants: &output.equ_constants,
            labels: &output.labels,
            current_index: index,
        };

        let (a_mode, a_value) = eval_operand(
            queued.a_operand.as_deref(),
            queued.line,
            &resolver,
        )?;
        let (b_mode, b_value) = eval_operand(
            queued.b_operand.as_deref(),
            queued.line,
            &resolver,
        )?;
        let modifier = queued
            .modifier
            .unwrap_or_else(|| default_modifiers(queued.opcode, a_mode, b_mode));

        code.push(RelaxedCompleteInstruction {
            instr: redcode::Instruction {
                opcode: queued.opcode,
                modifier,
                a_addr_mode: a_mode,
                b_addr_mode: b_mode,
            },
            a_field: a_value,
            b_field: b_value,
        });
    }

    Ok(RelaxedWarrior {
        code,
        start: output.origin.unwrap_or(0),
        pin: None,
        name: output.name,
        author: output.author,
    })
}

/// Splits an operand token into its addressing-mode prefix (defaulting to
/// [`AddrMode::Direct`] if absent) and evaluates the remaining expression.
#[allow(
    clippy::string_slice,
    reason = "Slicing after a one-byte ASCII mode prefix is always char-boundary safe"
)]
fn eval_operand(
    operand: Option<&str>,
    line: usize,
    resolver: &SymbolTable,
) -> Result<(AddrMode, i64), AssembleError> {
    let Some(operand) = operand else {
        return Ok((AddrMode::Direct, 0));
    };
    let (mode, expr) = match operand.chars().next() {
        Some('#') => (AddrMode::Immediate, &operand[1..]),
        Some('$') => (AddrMode::Direct, &operand[1..]),
        Some('*') => (AddrMode::IndirectA, &operand[1..]),
        Some('@') => (AddrMode::IndirectB, &operand[1..]),
        Some('{') => (AddrMode::PredecA, &operand[1..]),
        Some('<') => (AddrMode::PredecB, &operand[1..]),
        Some('}') => (AddrMode::PostincA, &operand[1..]),
        Some('>') => (AddrMode::PostincB, &operand[1..]),
        _ => (AddrMode::Direct, operand),
    };
    let value = evaluate_expression(expr, line, resolver, &mut HashSet::new())?;
    Ok((mode, value))
}

/// The symbol environment available while evaluating one operand expression.
struct SymbolTable<'a> {
    /// Named integer constants supplied by the caller (e.g. `CORESIZE`).
    builtins: &'a [(&'a str, i64)],
    /// `EQU` name to its unevaluated right-hand-side text.
    equ_constants: &'a HashMap<String, String>,
    /// Label name to the output index of the instruction it names.
    labels: &'a HashMap<String, usize>,
    /// Output line index of the instruction currently being evaluated, used
    /// to translate absolute label positions into PC-relative offsets.
    current_index: usize,
}

impl SymbolTable<'_> {
    /// Resolves `name`, recursively evaluating `EQU` right-hand-sides.
    ///
    /// `visiting` detects circular `EQU` definitions (`A EQU B` / `B EQU A`).
    fn resolve(
        &self,
        name: &str,
        line: usize,
        visiting: &mut HashSet<String>,
    ) -> Result<i64, AssembleError> {
        if let Some((_, value)) =
            self.builtins.iter().find(|(key, _)| *key == name)
        {
            return Ok(*value);
        }
        if let Some(&abs_index) = self.labels.get(name) {
            let abs = i64::try_from(abs_index).unwrap_or(i64::MAX);
            let cur = i64::try_from(self.current_index).unwrap_or(i64::MAX);
            return Ok(abs - cur);
        }
        if let Some(rhs) = self.equ_constants.get(name) {
            if !visiting.insert(name.to_owned()) {
                return Err(AssembleError {
                    line,
                    kind: AssembleErrorKind::CircularEqu(name.to_owned()),
                });
            }
            let value = evaluate_expression(rhs, line, self, visiting)?;
            visiting.remove(name);
            return Ok(value);
        }
        Err(AssembleError {
            line,
            kind: AssembleErrorKind::UnknownSymbol(name.to_owned()),
        })
    }
}

/// Parses and evaluates a whitelisted arithmetic expression: integers,
/// identifiers resolved through `resolver`, `+ - * / %`, and parentheses.
///
/// This is a small hand-written recursive-descent evaluator over a character
/// whitelist, deliberately not a call into a general-purpose expression or
/// scripting engine: source text can never cause anything beyond integer
/// arithmetic to run.
fn evaluate_expression(
    expr: &str,
    line: usize,
    resolver: &SymbolTable,
    visiting: &mut HashSet<String>,
) -> Result<i64, AssembleError> {
    for ch in expr.chars() {
        if !(ch.is_ascii_alphanumeric()
            || ch == '_'
            || ch == '+'
            || ch == '-'
            || ch == '*'
            || ch == '/'
            || ch == '%'
            || ch == '('
            || ch == ')'
            || ch.is_whitespace())
        {
            return Err(AssembleError {
                line,
                kind: AssembleErrorKind::InvalidCharacter(ch),
            });
        }
    }

    let tokens = tokenize(expr);
    let mut parser = ExprParser {
        tokens: &tokens,
        pos: 0,
        line,
    };
    let value = parser.parse_expr(resolver, visiting)?;
    if parser.pos != parser.tokens.len() {
        return Err(AssembleError {
            line,
            kind: AssembleErrorKind::MalformedExpression(expr.to_owned()),
        });
    }
    Ok(value)
}

/// A lexical token in an operand expression.
#[derive(Clone, Debug, Eq, PartialEq)]
enum Token {
    /// A literal integer.
    Number(i64),
    /// A label, `EQU` name, or builtin constant name.
    Ident(String),
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `(`
    LParen,
    /// `)`
    RParen,
}

/// Splits an expression into [`Token`]s, skipping whitespace.
#[allow(
    clippy::indexing_slicing,
    reason = "All indices are bounds-checked against chars.len() before use"
)]
fn tokenize(expr: &str) -> Vec<Token> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut index = 0;
    while index < chars.len() {
        let ch = chars[index];
        if ch.is_whitespace() {
            index = index.saturating_add(1);
            continue;
        }
        match ch {
            '+' => {
                tokens.push(Token::Plus);
                index = index.saturating_add(1);
            }
            '-' => {
                tokens.push(Token::Minus);
                index = index.saturating_add(1);
            }
            '*' => {
                tokens.push(Token::Star);
                index = index.saturating_add(1);
            }
            '/' => {
                tokens.push(Token::Slash);
                index = index.saturating_add(1);
            }
            '%' => {
                tokens.push(Token::Percent);
                index = index.saturating_add(1);
            }
            '(' => {
                tokens.push(Token::LParen);
                index = index.saturating_add(1);
            }
            ')' => {
                tokens.push(Token::RParen);
                index = index.saturating_add(1);
            }
            _ if ch.is_ascii_digit() => {
                let start = index;
                while index < chars.len() && chars[index].is_ascii_digit() {
                    index = index.saturating_add(1);
                }
                let text: String = chars[start..index].iter().collect();
                let value = text.parse().unwrap_or(0);
                tokens.push(Token::Number(value));
            }
            _ => {
                let start = index;
                while index < chars.len()
                    && (chars[index].is_ascii_alphanumeric()
                        || chars[index] == '_')
                {
                    index = index.saturating_add(1);
                }
                let text: String = chars[start..index].iter().collect();
                tokens.push(Token::Ident(text));
            }
        }
    }
    tokens
}

/// Recursive-descent parser/evaluator walking a token stream produced by
/// [`tokenize`]. Grammar: `expr := term (('+'|'-') term)*`,
/// `term := unary (('*'|'/'|'%') unary)*`, `unary := '-'? primary`,
/// `primary := NUMBER | IDENT | '(' expr ')'`.
struct ExprParser<'a> {
    /// Tokens produced by [`tokenize`] for the expression being parsed.
    tokens: &'a [Token],
    /// Index of the next unconsumed token.
    pos: usize,
    /// Source line, for error messages.
    line: usize,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        self.pos = self.pos.saturating_add(1);
        tok
    }

    fn parse_expr(
        &mut self,
        resolver: &SymbolTable,
        visiting: &mut HashSet<String>,
    ) -> Result<i64, AssembleError> {
        let mut value = self.parse_term(resolver, visiting)?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    let rhs = self.parse_term(resolver, visiting)?;
                    value = value.wrapping_add(rhs);
                }
                Some(Token::Minus) => {
                    self.advance();
                    let rhs = self.parse_term(resolver, visiting)?;
                    value = value.wrapping_sub(rhs);
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_term(
        &mut self,
        resolver: &SymbolTable,
        visiting: &mut HashSet<String>,
    ) -> Result<i64, AssembleError> {
        let mut value = self.parse_unary(resolver, visiting)?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    let rhs = self.parse_unary(resolver, visiting)?;
                    value = value.wrapping_mul(rhs);
                }
                Some(Token::Slash) => {
                    self.advance();
                    let rhs = self.parse_unary(resolver, visiting)?;
                    value = value.checked_div(rhs).ok_or(AssembleError {
                        line: self.line,
                        kind: AssembleErrorKind::DivideByZero,
                    })?;
                }
                Some(Token::Percent) => {
                    self.advance();
                    let rhs = self.parse_unary(resolver, visiting)?;
                    value = value.checked_rem(rhs).ok_or(AssembleError {
                        line: self.line,
                        kind: AssembleErrorKind::DivideByZero,
                    })?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_unary(
        &mut self,
        resolver: &SymbolTable,
        visiting: &mut HashSet<String>,
    ) -> Result<i64, AssembleError> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.advance();
            let value = self.parse_unary(resolver, visiting)?;
            return Ok(value.wrapping_neg());
        }
        if matches!(self.peek(), Some(Token::Plus)) {
            self.advance();
            return self.parse_unary(resolver, visiting);
        }
        self.parse_primary(resolver, visiting)
    }

    fn parse_primary(
        &mut self,
        resolver: &SymbolTable,
        visiting: &mut HashSet<String>,
    ) -> Result<i64, AssembleError> {
        match self.advance().cloned() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::Ident(name)) => resolver.resolve(&name, self.line, visiting),
            Some(Token::LParen) => {
                let value = self.parse_expr(resolver, visiting)?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(AssembleError {
                        line: self.line,
                        kind: AssembleErrorKind::MalformedExpression(
                            "unbalanced parentheses".to_owned(),
                        ),
                    }),
                }
            }
            _ => Err(AssembleError {
                line: self.line,
                kind: AssembleErrorKind::MalformedExpression(
                    "expected a number, identifier, or '('".to_owned(),
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use coverage_helper::test;

    use super::*;

    #[test]
    fn assembles_imp_with_a_self_referencing_label() {
        let warrior = assemble("imp MOV imp, imp+1", &[]).expect("should assemble");
        assert_eq!(warrior.code.len(), 1);
        assert_eq!(warrior.code[0].instr.opcode, Opcode::Mov);
        assert_eq!(warrior.code[0].a_field, 0);
        assert_eq!(warrior.code[0].b_field, 1);
    }

    #[test]
    fn assembles_dwarf_with_forward_label_reference() {
        let source = "
            loop:   ADD.AB  #4, bomb
                    MOV.I   bomb, @bomb
                    JMP     loop
            bomb:   DAT     #0, #0
        ";
        let warrior = assemble(source, &[]).expect("should assemble");
        let fields: Vec<(i64, i64)> = warrior
            .code
            .iter()
            .map(|i| (i.a_field, i.b_field))
            .collect();
        assert_eq!(fields, vec![(4, 3), (2, 2), (-2, 0), (0, 0)]);
    }

    #[test]
    fn captures_header_name_and_author() {
        let source = ";name Imp\n;author A. K. Dewdney\nMOV 0, 1\n";
        let warrior = assemble(source, &[]).expect("should assemble");
        assert_eq!(warrior.name.as_deref(), Some("Imp"));
        assert_eq!(warrior.author.as_deref(), Some("A. K. Dewdney"));
    }

    #[test]
    fn equ_constants_are_substituted() {
        let source = "step EQU 4\nADD.AB #step, step";
        let warrior = assemble(source, &[]).expect("should assemble");
        assert_eq!(warrior.code[0].a_field, 4);
        assert_eq!(warrior.code[0].b_field, 4);
    }

    #[test]
    fn builtins_are_available_to_expressions() {
        let source = "DAT #CORESIZE, #0";
        let warrior =
            assemble(source, &[("CORESIZE", 8000)]).expect("should assemble");
        assert_eq!(warrior.code[0].a_field, 8000);
    }

    #[test]
    fn org_sets_start() {
        let source = "ORG 5\nDAT #0, #0\nDAT #0, #0\nDAT #0, #0";
        let warrior = assemble(source, &[]).expect("should assemble");
        assert_eq!(warrior.start, 5);
    }

    #[test]
    fn unknown_opcode_reports_line_number() {
        let err = assemble("ABC 5", &[]).expect_err("should fail");
        assert_eq!(err.line, 1);
        assert!(matches!(err.kind, AssembleErrorKind::UnknownOpcode(_)));
    }

    #[test]
    fn invalid_character_in_expression_is_rejected() {
        let err = assemble("DAT #1$2, #0", &[]).expect_err("should fail");
        assert!(matches!(err.kind, AssembleErrorKind::InvalidCharacter('$')));
    }

    #[test]
    fn divide_by_zero_in_expression_is_rejected() {
        let err = assemble("DAT #(1/0), #0", &[]).expect_err("should fail");
        assert_eq!(err.kind, AssembleErrorKind::DivideByZero);
    }

    #[test]
    fn circular_equ_is_rejected() {
        let source = "a EQU b\nb EQU a\nDAT #a, #0";
        let err = assemble(source, &[]).expect_err("should fail");
        assert!(matches!(err.kind, AssembleErrorKind::CircularEqu(_)));
    }
}
