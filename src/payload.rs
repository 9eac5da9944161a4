//! Call-string parsing.
//!
//! An annotation payload encodes one or more transform calls as
//! semicolon-delimited, function-call-like segments:
//!
//! ```text
//! "a();b(x,y=1,y=2);make_reflect;"
//!   │    │              └─ bare name, empty argument list
//!   │    └─ one positional arg, key `y` bound to ["1", "2"]
//!   └─ empty argument list
//! ```
//!
//! Segmentation is deliberately flat: no nested call syntax, no escaping.
//! A segment whose name can be parsed becomes a [`CallDescriptor`]; anything
//! else (unbalanced parentheses, an argument list with no name) is recorded
//! as zero-call noise and skipped by the dispatcher, never treated as fatal.
//! Blank segments are ignored outright.
//!
//! Parsing is pure: re-parsing the same payload yields structurally equal
//! results.

use crate::SourceRange;
use once_cell::sync::OnceCell;
use std::collections::HashMap;

/// One `value` (positional) or `key=value` (named) argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    /// `None` for positional arguments.
    pub name: Option<String>,
    pub value: String,
}

/// Arguments of one call, in declaration order.
///
/// The canonical storage is the ordered sequence; the name→values multi-map
/// is derived from it on first use and cached, so the two views can never
/// drift apart. A repeated key accumulates its values in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ArgumentSet {
    args: Vec<Argument>,
    by_name: OnceCell<HashMap<String, Vec<String>>>,
}

impl PartialEq for ArgumentSet {
    fn eq(&self, other: &Self) -> bool {
        self.args == other.args
    }
}

impl Eq for ArgumentSet {}

impl ArgumentSet {
    pub(crate) fn from_args(args: Vec<Argument>) -> Self {
        ArgumentSet { args, by_name: OnceCell::new() }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Argument> {
        self.args.iter()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Positional argument values, in order.
    pub fn positional(&self) -> impl Iterator<Item = &str> {
        self.args.iter().filter(|a| a.name.is_none()).map(|a| a.value.as_str())
    }

    /// All values bound to `name`, in insertion order. Empty if unbound.
    pub fn values(&self, name: &str) -> &[String] {
        self.name_map().get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First value bound to `name`, if any.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }

    fn name_map(&self) -> &HashMap<String, Vec<String>> {
        self.by_name.get_or_init(|| {
            let mut map: HashMap<String, Vec<String>> = HashMap::new();
            for arg in &self.args {
                if let Some(name) = &arg.name {
                    map.entry(name.clone()).or_default().push(arg.value.clone());
                }
            }
            map
        })
    }
}

/// A parsed `name + arguments` unit extracted from a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallDescriptor {
    /// Call name (selector braces stripped: `{funccall}` and `funccall` are
    /// the same rule).
    pub name: String,
    /// The trimmed segment text this call was parsed from.
    pub raw: String,
    /// Byte range of the segment within the payload, excluding the
    /// terminating `;`. Rules that execute injected code read the payload
    /// remainder past this span.
    pub span: SourceRange,
    pub args: ArgumentSet,
}

/// A segment with no parseable call name. Inert; logged, never dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseSegment {
    pub raw: String,
    pub span: SourceRange,
}

/// All calls parsed from one annotation payload, in payload order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPayload {
    pub calls: Vec<CallDescriptor>,
    pub noise: Vec<NoiseSegment>,
}

/// Split `payload` into ordered [`CallDescriptor`]s plus inert noise.
pub fn parse_payload(payload: &str) -> ParsedPayload {
    let mut out = ParsedPayload::default();
    let mut offset = 0usize;

    for segment in payload.split(';') {
        let span = SourceRange::new(offset, offset + segment.len());
        offset = span.end + 1; // step over the ';'

        let trimmed = segment.trim();
        if trimmed.is_empty() {
            continue;
        }
        match parse_segment(trimmed) {
            Some((name, args)) => out.calls.push(CallDescriptor { name, raw: trimmed.to_string(), span, args }),
            None => out.noise.push(NoiseSegment { raw: trimmed.to_string(), span }),
        }
    }

    out
}

/// Extract `name` and arguments from one trimmed segment, or `None` for noise.
fn parse_segment(segment: &str) -> Option<(String, ArgumentSet)> {
    let caps = regex!(r"^\{?\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}?\s*(?:\((.*)\))?$").captures(segment)?;
    let name = caps[1].to_string();
    let args = caps.get(2).map(|m| parse_args(m.as_str())).unwrap_or_default();
    Some((name, args))
}

fn parse_args(list: &str) -> ArgumentSet {
    let mut args = Vec::new();
    for piece in list.split(',') {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        let arg = match piece.split_once('=') {
            Some((key, value)) => Argument { name: Some(key.trim().to_string()), value: value.trim().to_string() },
            None => Argument { name: None, value: piece.to_string() },
        };
        args.push(arg);
    }
    ArgumentSet::from_args(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_payload_into_ordered_calls() {
        let parsed = parse_payload("a();b(x,y=1,y=2);");

        assert_eq!(parsed.calls.len(), 2);
        assert!(parsed.noise.is_empty());

        assert_eq!(parsed.calls[0].name, "a");
        assert!(parsed.calls[0].args.is_empty());

        let b = &parsed.calls[1];
        assert_eq!(b.name, "b");
        assert_eq!(b.args.positional().collect::<Vec<_>>(), ["x"]);
        assert_eq!(b.args.values("y"), ["1", "2"]);
        assert_eq!(b.args.first("y"), Some("1"));
        assert_eq!(b.args.len(), 3);
    }

    #[test]
    fn bare_names_are_calls_with_empty_args() {
        let parsed = parse_payload("make_reflect");
        assert_eq!(parsed.calls.len(), 1);
        assert_eq!(parsed.calls[0].name, "make_reflect");
        assert!(parsed.calls[0].args.is_empty());
    }

    #[test]
    fn selector_braces_are_stripped() {
        let parsed = parse_payload("{funccall};make_reflect;");
        let names: Vec<&str> = parsed.calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["funccall", "make_reflect"]);
    }

    #[test]
    fn malformed_segments_become_noise() {
        // "name(a" lost its closing paren to the ';' split; "(x,y)" has an
        // argument list but no name. Both are inert, neither is fatal.
        let parsed = parse_payload("name(a;(x,y);ok()");

        assert_eq!(parsed.calls.len(), 1);
        assert_eq!(parsed.calls[0].name, "ok");

        let noise: Vec<&str> = parsed.noise.iter().map(|n| n.raw.as_str()).collect();
        assert_eq!(noise, ["name(a", "(x,y)"]);
    }

    #[test]
    fn whitespace_is_trimmed_around_names_and_values() {
        let parsed = parse_payload(" spaced ( a , k = v ) ;");
        let call = &parsed.calls[0];
        assert_eq!(call.name, "spaced");
        assert_eq!(call.args.positional().collect::<Vec<_>>(), ["a"]);
        assert_eq!(call.args.first("k"), Some("v"));
    }

    #[test]
    fn spans_index_into_the_payload() {
        let payload = "a();b(x)";
        let parsed = parse_payload(payload);
        let b = &parsed.calls[1];
        assert_eq!(&payload[b.span.start..b.span.end], "b(x)");
    }

    #[test]
    fn reparsing_is_structurally_equal() {
        let payload = "a();b(x,y=1,y=2);noise(;c";
        let first = parse_payload(payload);
        // Touch the derived multi-map view; it must not affect equality.
        let _ = first.calls[1].args.values("y");
        let second = parse_payload(payload);
        assert_eq!(first, second);
    }
}
