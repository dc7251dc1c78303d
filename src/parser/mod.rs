use nom::{multi::many1, sequence::delimited, IResult};

use crate::error::{Error, Result};
use crate::model::{Category, Node};

/// Quantifier suffix as written in the pattern. Only the minimum count
/// survives into the tree; the unbounded forms turn into
/// [`Node::Unsupported`] so generation rejects them by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TermSuffix {
    Question,
    Asterisk,
    Plus,
    Range(usize, usize),
    OpenRange(usize),
    Repeat(usize),
}

/// Parses a whole pattern into its syntax tree and numbers the capturing
/// groups in textual order of their opening parentheses.
pub fn parse(pattern: &str) -> Result<Vec<Node>> {
    if pattern.is_empty() {
        return Err(Error::Pattern("empty pattern".to_string()));
    }

    let (rest, mut nodes) = alternation(pattern).map_err(|err| match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            Error::Pattern(format!("unexpected `{}`", e.input))
        }
        nom::Err::Incomplete(_) => Error::Pattern("incomplete pattern".to_string()),
    })?;
    if !rest.is_empty() {
        return Err(Error::Pattern(format!("unexpected `{rest}`")));
    }

    let mut next = 1;
    number_groups(&mut nodes, &mut next);
    check_ranges(&nodes)?;
    Ok(nodes)
}

fn literal(s: &str) -> IResult<&str, Node> {
    let (s, first) = nom::character::complete::anychar(s)?;
    if first == '\\' {
        let (s, second) = nom::character::complete::anychar(s)?;
        return escape(s, second);
    }

    // reserved characters
    if matches!(
        first,
        '[' | ']' | '(' | ')' | '{' | '}' | '?' | '*' | '+' | '|' | '.' | '^' | '$'
    ) {
        return Err(nom::Err::Error(nom::error::Error::new(
            s,
            nom::error::ErrorKind::Tag,
        )));
    }

    Ok((s, Node::Literal(first)))
}

fn escape(rest: &str, second: char) -> IResult<&str, Node> {
    let node = match second {
        'd' => Node::Category(Category::Digit),
        'D' => Node::Category(Category::NotDigit),
        's' => Node::Category(Category::Space),
        'S' => Node::Category(Category::NotSpace),
        'w' => Node::Category(Category::Word),
        'W' => Node::Category(Category::NotWord),
        '1'..='9' => Node::BackReference(second as usize - '0' as usize),
        'n' => Node::Literal('\n'),
        't' => Node::Literal('\t'),
        'r' => Node::Literal('\r'),
        // octal, hex and the remaining letter escapes mean nothing here
        _ if second.is_ascii_alphanumeric() => {
            return Err(nom::Err::Error(nom::error::Error::new(
                rest,
                nom::error::ErrorKind::Escaped,
            )))
        }
        _ => Node::Literal(second),
    };
    Ok((rest, node))
}

fn class_escape(rest: &str, second: char) -> IResult<&str, Node> {
    // no back-references or octal escapes inside a class
    if second.is_ascii_digit() {
        return Err(nom::Err::Error(nom::error::Error::new(
            rest,
            nom::error::ErrorKind::Escaped,
        )));
    }
    escape(rest, second)
}

fn class_atom(s: &str) -> IResult<&str, Node> {
    let (s, first) = nom::character::complete::anychar(s)?;
    if first == ']' {
        return Err(nom::Err::Error(nom::error::Error::new(
            s,
            nom::error::ErrorKind::Tag,
        )));
    }
    if first == '\\' {
        let (s, second) = nom::character::complete::anychar(s)?;
        return class_escape(s, second);
    }
    Ok((s, Node::Literal(first)))
}

fn class_element(s: &str) -> IResult<&str, Node> {
    let (s, first) = class_atom(s)?;
    let lo = match first {
        Node::Literal(c) if c != '-' => c,
        // `-` and non-literal atoms never open a range
        other => return Ok((s, other)),
    };

    let res = nom::character::complete::char::<_, nom::error::Error<&str>>('-')(s);
    match res {
        Ok((s2, _)) => match class_atom(s2) {
            Ok((s2, Node::Literal(hi))) => Ok((s2, Node::Range(lo, hi))),
            // the dash re-parses as a literal of its own
            _ => Ok((s, Node::Literal(lo))),
        },
        Err(_) => Ok((s, Node::Literal(lo))),
    }
}

fn class(s: &str) -> IResult<&str, Node> {
    let (s, (negated, mut elements)) = delimited(
        nom::character::complete::char('['),
        nom::sequence::pair(
            nom::combinator::opt(nom::character::complete::char('^')),
            many1(class_element),
        ),
        nom::character::complete::char(']'),
    )(s)?;

    if negated.is_some() {
        elements.insert(0, Node::Negated);
    }
    Ok((s, Node::CharIn(elements)))
}

fn wildcard(s: &str) -> IResult<&str, Node> {
    let (s, _) = nom::character::complete::char('.')(s)?;
    Ok((s, Node::Wildcard))
}

fn anchor(s: &str) -> IResult<&str, Node> {
    let (s, which) = nom::character::complete::one_of("^$")(s)?;
    let node = if which == '^' {
        Node::Unsupported("anchor `^`")
    } else {
        Node::Unsupported("anchor `$`")
    };
    Ok((s, node))
}

fn token(s: &str) -> IResult<&str, Node> {
    nom::branch::alt((class, wildcard, anchor, literal))(s)
}

fn factor(s: &str) -> IResult<&str, Node> {
    match delimited(
        nom::character::complete::char('('),
        alternation,
        nom::character::complete::char(')'),
    )(s)
    {
        // group numbers get assigned after the parse, in textual order
        Ok((s, body)) => Ok((s, Node::Subpattern { index: 0, body })),
        Err(_) => token(s),
    }
}

fn term(s: &str) -> IResult<&str, Node> {
    let (s, atom) = factor(s)?;
    let (s, suffix) = nom::combinator::opt(term_suffix)(s)?;

    let node = match suffix {
        None => atom,
        // a bounded quantifier always instantiates its minimum count
        Some(TermSuffix::Repeat(count)) | Some(TermSuffix::Range(count, _)) => {
            Node::BoundedRepeat {
                count,
                body: vec![atom],
            }
        }
        Some(TermSuffix::Question) => Node::BoundedRepeat {
            count: 0,
            body: vec![atom],
        },
        Some(TermSuffix::Asterisk) => Node::Unsupported("unbounded repeat `*`"),
        Some(TermSuffix::Plus) => Node::Unsupported("unbounded repeat `+`"),
        Some(TermSuffix::OpenRange(_)) => Node::Unsupported("unbounded repeat `{n,}`"),
    };
    Ok((s, node))
}

fn term_suffix(s: &str) -> IResult<&str, TermSuffix> {
    let (s2, first) = nom::character::complete::one_of("?*+{")(s)?;
    match first {
        '?' => Ok((s2, TermSuffix::Question)),
        '*' => Ok((s2, TermSuffix::Asterisk)),
        '+' => Ok((s2, TermSuffix::Plus)),
        _ => {
            let (s2, t) = nom::sequence::terminated(
                nom::sequence::pair(
                    nom::character::complete::digit1,
                    nom::combinator::opt(nom::sequence::pair(
                        nom::character::complete::char(','),
                        nom::combinator::opt(nom::character::complete::digit1),
                    )),
                ),
                nom::character::complete::char('}'),
            )(s2)?;

            let digit_error =
                |_| nom::Err::Error(nom::error::Error::new(s, nom::error::ErrorKind::Digit));
            match t {
                (min, None) => Ok((s2, TermSuffix::Repeat(min.parse().map_err(digit_error)?))),
                (min, Some((_, None))) => {
                    Ok((s2, TermSuffix::OpenRange(min.parse().map_err(digit_error)?)))
                }
                (min, Some((_, Some(max)))) => {
                    let min: usize = min.parse().map_err(digit_error)?;
                    let max: usize = max.parse().map_err(digit_error)?;
                    if max < min {
                        return Err(nom::Err::Error(nom::error::Error::new(
                            s,
                            nom::error::ErrorKind::Verify,
                        )));
                    }
                    Ok((s2, TermSuffix::Range(min, max)))
                }
            }
        }
    }
}

fn sequence(s: &str) -> IResult<&str, Vec<Node>> {
    many1(term)(s)
}

fn alternation(s: &str) -> IResult<&str, Vec<Node>> {
    let (s, mut branches) =
        nom::multi::separated_list1(nom::character::complete::char('|'), sequence)(s)?;
    let nodes = if branches.len() == 1 {
        branches.swap_remove(0)
    } else {
        vec![Node::Branch(branches)]
    };
    Ok((s, nodes))
}

/// Assigns 1-based group indices in textual order of `(`, which a pre-order
/// walk reproduces exactly.
fn number_groups(nodes: &mut [Node], next: &mut usize) {
    for node in nodes {
        match node {
            Node::Subpattern { index, body } => {
                *index = *next;
                *next += 1;
                number_groups(body, next);
            }
            Node::Branch(branches) => {
                for branch in branches {
                    number_groups(branch, next);
                }
            }
            Node::BoundedRepeat { body, .. } => number_groups(body, next),
            _ => {}
        }
    }
}

fn check_ranges(nodes: &[Node]) -> Result<()> {
    for node in nodes {
        match node {
            Node::Range(min, max) if min > max => {
                return Err(Error::Pattern(format!("bad character range {min}-{max}")))
            }
            Node::CharIn(elements) => check_ranges(elements)?,
            Node::Subpattern { body, .. } | Node::BoundedRepeat { body, .. } => {
                check_ranges(body)?
            }
            Node::Branch(branches) => {
                for branch in branches {
                    check_ranges(branch)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}
