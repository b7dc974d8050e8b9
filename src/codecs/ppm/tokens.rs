use nom::bytes::complete::{take_till1, take_while};
use nom::character::complete::{i64 as parse_i64, u8 as parse_u8};
use nom::combinator::all_consuming;
use nom::sequence::preceded;
use nom::IResult;

fn token(input: &[u8]) -> IResult<&[u8], &[u8]> {
    preceded(
        take_while(|c: u8| c.is_ascii_whitespace()),
        take_till1(|c: u8| c.is_ascii_whitespace()),
    )(input)
}

/// Whitespace separated tokens of a text image, in file order.
pub struct Tokens<'a> {
    rest: &'a [u8],
    count: usize,
}

impl<'a> Tokens<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Tokens { rest: data, count: 0 }
    }

    /// Number of tokens handed out so far.
    pub fn consumed(&self) -> usize {
        self.count
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let (r, t) = token(self.rest).ok()?;
        self.rest = r;
        self.count += 1;
        Some(t)
    }
}

/// Whole token as a signed decimal integer.
pub fn integer(token: &[u8]) -> Option<i64> {
    let parsed: IResult<&[u8], i64> = all_consuming(parse_i64)(token);
    parsed.ok().map(|(_, v)| v)
}

/// Whole token as an unsigned decimal byte, no sign allowed.
pub fn channel(token: &[u8]) -> Option<u8> {
    let parsed: IResult<&[u8], u8> = all_consuming(parse_u8)(token);
    parsed.ok().map(|(_, v)| v)
}

#[test]
fn test_tokens_split_on_any_whitespace() {
    let t: Vec<&str> = Tokens::new(b"  P3\n2\t1\r\n255 \x0c 7")
        .map(|t| std::str::from_utf8(t).unwrap())
        .collect();
    assert_eq!(t, vec!["P3", "2", "1", "255", "7"]);
}

#[test]
fn test_tokens_empty_input() {
    let mut t = Tokens::new(b" \n\t ");
    assert_eq!(t.next(), None);
    assert_eq!(t.consumed(), 0);
}

#[test]
fn test_tokens_consumed() {
    let mut t = Tokens::new(b"a b c");
    t.next();
    t.next();
    assert_eq!(t.consumed(), 2);
}

#[test]
fn test_integer() {
    assert_eq!(integer(b"42"), Some(42));
    assert_eq!(integer(b"-7"), Some(-7));
    assert_eq!(integer(b"0"), Some(0));
    assert_eq!(integer(b"12ab"), None);
    assert_eq!(integer(b"abc"), None);
    assert_eq!(integer(b"99999999999999999999999"), None);
}

#[test]
fn test_channel() {
    assert_eq!(channel(b"255"), Some(255));
    assert_eq!(channel(b"0"), Some(0));
    assert_eq!(channel(b"256"), None);
    assert_eq!(channel(b"-1"), None);
    assert_eq!(channel(b"1.5"), None);
}
