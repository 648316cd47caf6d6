//! Tri-state parsing results and the small set of combinators the grammar
//! rules are built from.
//!
//! A rule either matched (and the cursor now sits after what it consumed),
//! did not apply (and the cursor is where it was), or recognised its own
//! prefix and then found broken input. Only the last one is an error, and no
//! combinator here ever turns it back into "try something else".

use std::marker::PhantomData;

use super::cursor::Cursor;
use super::positions::{Expression, Range};
use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Matched(T),
    NotApplicable,
    Malformed(ParseError),
}

impl<T> Outcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Matched(v) => Outcome::Matched(f(v)),
            Outcome::NotApplicable => Outcome::NotApplicable,
            Outcome::Malformed(e) => Outcome::Malformed(e),
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Outcome::Matched(_))
    }

    /// `Ok(None)` for not-applicable, so rule bodies can use `?`.
    pub fn into_result(self) -> Result<Option<T>, ParseError> {
        match self {
            Outcome::Matched(v) => Ok(Some(v)),
            Outcome::NotApplicable => Ok(None),
            Outcome::Malformed(e) => Err(e),
        }
    }
}

impl<T> From<Result<Option<T>, ParseError>> for Outcome<T> {
    fn from(r: Result<Option<T>, ParseError>) -> Self {
        match r {
            Ok(Some(v)) => Outcome::Matched(v),
            Ok(None) => Outcome::NotApplicable,
            Err(e) => Outcome::Malformed(e),
        }
    }
}

pub trait Rule<T> {
    fn parse(&self, cur: &mut Cursor<'_>) -> Outcome<T>;
}

impl<T, F> Rule<T> for F
where
    F: Fn(&mut Cursor<'_>) -> Outcome<T>,
{
    fn parse(&self, cur: &mut Cursor<'_>) -> Outcome<T> {
        self(cur)
    }
}

/// Run a rule body and rewind the cursor when it reports not-applicable.
///
/// Rule bodies return `Ok(None)` from any point after a partial match and
/// leave restoring the position to this wrapper.
pub fn attempt<T>(
    cur: &mut Cursor<'_>,
    body: impl FnOnce(&mut Cursor<'_>) -> Result<Option<T>, ParseError>,
) -> Outcome<T> {
    let mark = cur.mark();
    let result = body(cur);
    if matches!(result, Ok(None)) {
        cur.reset(mark);
    }
    result.into()
}

pub struct Literal(&'static str);

impl Rule<Range> for Literal {
    fn parse(&self, cur: &mut Cursor<'_>) -> Outcome<Range> {
        let from = cur.position();
        if cur.eat(self.0) {
            Outcome::Matched(cur.range_from(from))
        } else {
            Outcome::NotApplicable
        }
    }
}

pub fn literal(s: &'static str) -> Literal {
    Literal(s)
}

pub struct RuneWhere<F>(F);

impl<F: Fn(char) -> bool> Rule<char> for RuneWhere<F> {
    fn parse(&self, cur: &mut Cursor<'_>) -> Outcome<char> {
        match cur.peek() {
            Some(c) if (self.0)(c) => {
                cur.advance();
                Outcome::Matched(c)
            }
            _ => Outcome::NotApplicable,
        }
    }
}

pub fn rune_where<F: Fn(char) -> bool>(pred: F) -> RuneWhere<F> {
    RuneWhere(pred)
}

/// Consume input up to, not including, the first place `terminator` matches.
///
/// Running out of input before the terminator is not-applicable, so callers
/// decide whether that is an error for their construct.
pub struct Until<R, T> {
    terminator: R,
    _out: PhantomData<fn() -> T>,
}

impl<T, R: Rule<T>> Rule<Expression> for Until<R, T> {
    fn parse(&self, cur: &mut Cursor<'_>) -> Outcome<Expression> {
        let start = cur.mark();
        let from = cur.position();
        loop {
            let here = cur.mark();
            match self.terminator.parse(cur) {
                Outcome::Matched(_) => {
                    cur.reset(here);
                    let text = cur.slice_from(from).to_string();
                    return Outcome::Matched(Expression::new(text, cur.range_from(from)));
                }
                Outcome::Malformed(e) => return Outcome::Malformed(e),
                Outcome::NotApplicable => {
                    cur.reset(here);
                    if cur.advance().is_none() {
                        cur.reset(start);
                        return Outcome::NotApplicable;
                    }
                }
            }
        }
    }
}

pub fn until<T, R: Rule<T>>(terminator: R) -> Until<R, T> {
    Until { terminator, _out: PhantomData }
}

/// All rules in order. If a later one does not apply the whole sequence
/// rewinds and does not apply either.
pub struct Sequence<S>(S);

macro_rules! sequence_impl {
    ($($r:ident : $t:ident),+) => {
        impl<$($t,)+ $($r: Rule<$t>,)+> Rule<($($t,)+)> for Sequence<($($r,)+)> {
            #[allow(non_snake_case)]
            fn parse(&self, cur: &mut Cursor<'_>) -> Outcome<($($t,)+)> {
                let start = cur.mark();
                let ($($r,)+) = &self.0;
                $(
                    let $t = match $r.parse(cur) {
                        Outcome::Matched(v) => v,
                        Outcome::NotApplicable => {
                            cur.reset(start);
                            return Outcome::NotApplicable;
                        }
                        Outcome::Malformed(e) => return Outcome::Malformed(e),
                    };
                )+
                Outcome::Matched(($($t,)+))
            }
        }
    };
}

sequence_impl!(A: TA, B: TB);
sequence_impl!(A: TA, B: TB, C: TC);
sequence_impl!(A: TA, B: TB, C: TC, D: TD);

pub fn sequence<S>(rules: S) -> Sequence<S> {
    Sequence(rules)
}

/// Try each alternative in turn. Moves on only when one does not apply; a
/// malformed alternative ends the search with its error.
pub struct FirstOf<'r, R>(&'r [R]);

impl<T, R: Rule<T>> Rule<T> for FirstOf<'_, R> {
    fn parse(&self, cur: &mut Cursor<'_>) -> Outcome<T> {
        for rule in self.0 {
            let mark = cur.mark();
            match rule.parse(cur) {
                Outcome::NotApplicable => cur.reset(mark),
                other => return other,
            }
        }
        Outcome::NotApplicable
    }
}

pub fn first_of<R>(rules: &[R]) -> FirstOf<'_, R> {
    FirstOf(rules)
}

pub struct ZeroOrMore<R>(R);

impl<T, R: Rule<T>> Rule<Vec<T>> for ZeroOrMore<R> {
    fn parse(&self, cur: &mut Cursor<'_>) -> Outcome<Vec<T>> {
        let mut items = Vec::new();
        loop {
            let before = cur.position().offset;
            match self.0.parse(cur) {
                Outcome::Matched(v) => {
                    items.push(v);
                    // A rule that matches without consuming would loop forever.
                    if cur.position().offset == before {
                        break;
                    }
                }
                Outcome::NotApplicable => break,
                Outcome::Malformed(e) => return Outcome::Malformed(e),
            }
        }
        Outcome::Matched(items)
    }
}

pub fn zero_or_more<R>(rule: R) -> ZeroOrMore<R> {
    ZeroOrMore(rule)
}

pub struct OneOrMore<R>(R);

impl<T, R: Rule<T>> Rule<Vec<T>> for OneOrMore<R> {
    fn parse(&self, cur: &mut Cursor<'_>) -> Outcome<Vec<T>> {
        let first = match self.0.parse(cur) {
            Outcome::Matched(v) => v,
            Outcome::NotApplicable => return Outcome::NotApplicable,
            Outcome::Malformed(e) => return Outcome::Malformed(e),
        };
        let mut items = vec![first];
        loop {
            let before = cur.position().offset;
            match self.0.parse(cur) {
                Outcome::Matched(v) => {
                    items.push(v);
                    if cur.position().offset == before {
                        break;
                    }
                }
                Outcome::NotApplicable => break,
                Outcome::Malformed(e) => return Outcome::Malformed(e),
            }
        }
        Outcome::Matched(items)
    }
}

pub fn one_or_more<R>(rule: R) -> OneOrMore<R> {
    OneOrMore(rule)
}

pub struct Optional<R>(R);

impl<T, R: Rule<T>> Rule<Option<T>> for Optional<R> {
    fn parse(&self, cur: &mut Cursor<'_>) -> Outcome<Option<T>> {
        match self.0.parse(cur) {
            Outcome::Matched(v) => Outcome::Matched(Some(v)),
            Outcome::NotApplicable => Outcome::Matched(None),
            Outcome::Malformed(e) => Outcome::Malformed(e),
        }
    }
}

pub fn optional<R>(rule: R) -> Optional<R> {
    Optional(rule)
}

/// Run a rule and put the cursor back whatever it returned.
pub struct Peek<'r, R>(&'r R);

impl<T, R: Rule<T>> Rule<T> for Peek<'_, R> {
    fn parse(&self, cur: &mut Cursor<'_>) -> Outcome<T> {
        let mark = cur.mark();
        let out = self.0.parse(cur);
        cur.reset(mark);
        out
    }
}

pub fn peek<R>(rule: &R) -> Peek<'_, R> {
    Peek(rule)
}

/// One or more whitespace characters, newlines included.
pub fn whitespace(cur: &mut Cursor<'_>) -> Outcome<Expression> {
    let from = cur.position();
    let text = cur.skip_whitespace();
    if text.is_empty() {
        return Outcome::NotApplicable;
    }
    Outcome::Matched(Expression::new(text, cur.range_from(from)))
}

/// `\n` or `\r\n`.
pub fn newline(cur: &mut Cursor<'_>) -> Outcome<Range> {
    let from = cur.position();
    if cur.eat("\r\n") || cur.eat("\n") {
        Outcome::Matched(cur.range_from(from))
    } else {
        Outcome::NotApplicable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::positions::Position;

    fn boom(cur: &mut Cursor<'_>) -> Outcome<&'static str> {
        if cur.eat("b") {
            let r = Range::point(cur.position());
            return Outcome::Malformed(ParseError::malformed("b: broken", r));
        }
        Outcome::NotApplicable
    }

    fn word_a(cur: &mut Cursor<'_>) -> Outcome<&'static str> {
        if cur.eat("a") { Outcome::Matched("a") } else { Outcome::NotApplicable }
    }

    fn word_ab(cur: &mut Cursor<'_>) -> Outcome<&'static str> {
        if cur.eat("ab") { Outcome::Matched("ab") } else { Outcome::NotApplicable }
    }

    #[test]
    fn test_first_of_tries_next_on_not_applicable() {
        let rules: [fn(&mut Cursor<'_>) -> Outcome<&'static str>; 2] = [word_ab, word_a];
        let mut cur = Cursor::new("ax");
        assert_eq!(first_of(&rules).parse(&mut cur), Outcome::Matched("a"));
        assert_eq!(cur.rest(), "x");
    }

    #[test]
    fn test_first_of_stops_at_malformed() {
        let rules: [fn(&mut Cursor<'_>) -> Outcome<&'static str>; 2] = [boom, word_a];
        let mut cur = Cursor::new("b");
        assert!(matches!(first_of(&rules).parse(&mut cur), Outcome::Malformed(_)));
    }

    #[test]
    fn test_first_of_never_reaches_later_rule_after_malformed() {
        use std::cell::Cell;
        let reached = Cell::new(false);
        let later = |_: &mut Cursor<'_>| {
            reached.set(true);
            Outcome::Matched("later")
        };
        let rules: [&dyn Fn(&mut Cursor<'_>) -> Outcome<&'static str>; 2] = [&boom, &later];
        let mut cur = Cursor::new("b");
        assert!(matches!(first_of(&rules).parse(&mut cur), Outcome::Malformed(_)));
        assert!(!reached.get());
    }

    #[test]
    fn test_sequence_rewinds() {
        let mut cur = Cursor::new("a-c");
        let out = sequence((literal("a"), literal("-"), literal("b"))).parse(&mut cur);
        assert_eq!(out, Outcome::NotApplicable);
        assert_eq!(cur.position(), Position::START);
    }

    #[test]
    fn test_until_does_not_consume_terminator() {
        let mut cur = Cursor::new("x > 1 %}");
        let Outcome::Matched(expr) = until(literal(" %}")).parse(&mut cur) else {
            panic!("expected match");
        };
        assert_eq!(expr.text, "x > 1");
        assert_eq!(expr.range.to.offset, 5);
        assert_eq!(cur.rest(), " %}");
    }

    #[test]
    fn test_until_at_eof_is_not_applicable() {
        let mut cur = Cursor::new("x > 1");
        assert_eq!(until(literal("%}")).parse(&mut cur), Outcome::NotApplicable);
        assert_eq!(cur.position(), Position::START);
    }

    #[test]
    fn test_repetition() {
        let mut cur = Cursor::new("aaab");
        let digits = one_or_more(rune_where(|c| c == 'a')).parse(&mut cur);
        assert_eq!(digits, Outcome::Matched(vec!['a', 'a', 'a']));
        let none = one_or_more(rune_where(|c| c == 'a')).parse(&mut cur);
        assert_eq!(none, Outcome::NotApplicable);
        let zero = zero_or_more(rune_where(|c| c == 'a')).parse(&mut cur);
        assert_eq!(zero, Outcome::Matched(vec![]));
    }

    #[test]
    fn test_optional_and_peek() {
        let mut cur = Cursor::new("ab");
        assert_eq!(optional(literal("x")).parse(&mut cur), Outcome::Matched(None));
        assert!(peek(&literal("ab")).parse(&mut cur).is_matched());
        assert_eq!(cur.position(), Position::START);
    }

    #[test]
    fn test_attempt_rewinds_on_not_applicable() {
        let mut cur = Cursor::new("abc");
        let out: Outcome<()> = attempt(&mut cur, |cur| {
            cur.eat("ab");
            Ok(None)
        });
        assert_eq!(out, Outcome::NotApplicable);
        assert_eq!(cur.position(), Position::START);
    }
}
