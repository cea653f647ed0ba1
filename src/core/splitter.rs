//! Mixed text/math splitting
//!
//! Chat content interleaves prose with LaTeX delimited by `$$...$$` (block)
//! or `$...$` (inline). [`split_mixed_content`] scans left to right and
//! returns the ordered segments, trying the block delimiter first at every
//! candidate position so `$$x$$` never reads as two inline formulas.
//!
//! ```rust
//! use mathtext::splitter::{split_mixed_content, Segment, Split};
//!
//! let split = split_mixed_content("area $$\\pi r^2$$ of $r$");
//! let Split::Segments(segments) = split else { unreachable!() };
//! assert_eq!(segments[1], Segment::Math { latex: "\\pi r^2", display_mode: true });
//! assert_eq!(segments[3], Segment::Math { latex: "r", display_mode: false });
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

#[cfg(feature = "serde")]
use serde::{ser::SerializeStruct, Serialize, Serializer};

lazy_static! {
    /// Block alternative first: the regex engine prefers the leftmost
    /// alternative at a given start position.
    static ref MATH_DELIMITERS: Regex =
        Regex::new(r"(?s)\$\$(.+?)\$\$|\$([^$]+?)\$").unwrap();
}

/// Segment type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SegmentKind {
    Text,
    Math,
}

/// A unit of parsed content, borrowing from the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal text between formulas
    Text(&'a str),
    /// LaTeX source with its delimiters removed
    Math {
        latex: &'a str,
        /// `true` for `$$...$$`, `false` for `$...$`
        display_mode: bool,
    },
}

impl<'a> Segment<'a> {
    /// The text, or the LaTeX source for math segments
    pub fn content(&self) -> &'a str {
        match self {
            Segment::Text(text) => text,
            Segment::Math { latex, .. } => latex,
        }
    }

    pub fn kind(&self) -> SegmentKind {
        match self {
            Segment::Text(_) => SegmentKind::Text,
            Segment::Math { .. } => SegmentKind::Math,
        }
    }

    pub fn is_math(&self) -> bool {
        matches!(self, Segment::Math { .. })
    }
}

/// Flat `{ kind, content, display_mode }` record, the shape shared by the
/// CLI's JSON output and the WASM bindings
#[cfg(feature = "serde")]
impl Serialize for Segment<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let display_mode = matches!(
            self,
            Segment::Math {
                display_mode: true,
                ..
            }
        );
        let mut state = serializer.serialize_struct("Segment", 3)?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("content", self.content())?;
        state.serialize_field("display_mode", &display_mode)?;
        state.end()
    }
}

/// Result of splitting free text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Split<'a> {
    /// Empty input; nothing to render
    Empty,
    /// No delimiter pair found; render the string as plain text
    Plain(&'a str),
    /// At least one formula, in source order
    Segments(Vec<Segment<'a>>),
}

impl<'a> Split<'a> {
    /// Whether any math segment was found
    pub fn has_math(&self) -> bool {
        matches!(self, Split::Segments(_))
    }

    /// Flatten into segments. `Plain` becomes a single text segment.
    pub fn into_segments(self) -> Vec<Segment<'a>> {
        match self {
            Split::Empty => Vec::new(),
            Split::Plain(text) => vec![Segment::Text(text)],
            Split::Segments(segments) => segments,
        }
    }
}

/// Split free text into text and math segments.
///
/// Unterminated delimiters are not an error: a lone `$` simply stays part of
/// the surrounding text.
pub fn split_mixed_content(input: &str) -> Split<'_> {
    if input.is_empty() {
        return Split::Empty;
    }

    let mut segments = Vec::new();
    let mut last_end = 0;

    for caps in MATH_DELIMITERS.captures_iter(input) {
        let Some(whole) = caps.get(0) else { continue };

        let segment = match (caps.get(1), caps.get(2)) {
            (Some(block), _) => Segment::Math {
                latex: block.as_str(),
                display_mode: true,
            },
            (None, Some(inline)) => Segment::Math {
                latex: inline.as_str(),
                display_mode: false,
            },
            (None, None) => continue,
        };

        if whole.start() > last_end {
            segments.push(Segment::Text(&input[last_end..whole.start()]));
        }
        segments.push(segment);
        last_end = whole.end();
    }

    if segments.is_empty() {
        return Split::Plain(input);
    }

    if last_end < input.len() {
        segments.push(Segment::Text(&input[last_end..]));
    }

    trace!(count = segments.len(), "split mixed content");
    Split::Segments(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn segments(input: &str) -> Vec<Segment<'_>> {
        match split_mixed_content(input) {
            Split::Segments(segments) => segments,
            other => panic!("expected segments for {:?}, got {:?}", input, other),
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(split_mixed_content(""), Split::Empty);
    }

    #[test]
    fn test_plain_text_fast_path() {
        assert_eq!(
            split_mixed_content("no formulas here"),
            Split::Plain("no formulas here")
        );
    }

    #[test]
    fn test_block_takes_priority() {
        assert_eq!(
            segments("$$a$$"),
            vec![Segment::Math {
                latex: "a",
                display_mode: true
            }]
        );
    }

    #[test]
    fn test_mixed_order() {
        assert_eq!(
            segments("Solve $x+1=2$ then\n$$y = x^2$$done"),
            vec![
                Segment::Text("Solve "),
                Segment::Math {
                    latex: "x+1=2",
                    display_mode: false
                },
                Segment::Text(" then\n"),
                Segment::Math {
                    latex: "y = x^2",
                    display_mode: true
                },
                Segment::Text("done"),
            ]
        );
    }

    #[test]
    fn test_block_spans_lines() {
        assert_eq!(
            segments("$$a\n+b$$"),
            vec![Segment::Math {
                latex: "a\n+b",
                display_mode: true
            }]
        );
    }

    #[test]
    fn test_unterminated_dollar_stays_text() {
        assert_eq!(split_mixed_content("costs 5$"), Split::Plain("costs 5$"));
        assert_eq!(
            segments("$a$ and 5$"),
            vec![
                Segment::Math {
                    latex: "a",
                    display_mode: false
                },
                Segment::Text(" and 5$"),
            ]
        );
    }

    #[test]
    fn test_unclosed_block_does_not_become_empty_inline() {
        assert_eq!(split_mixed_content("a $$ b"), Split::Plain("a $$ b"));
    }

    #[test]
    fn test_adjacent_inline_formulas() {
        assert_eq!(
            segments("$a$$b$"),
            vec![
                Segment::Math {
                    latex: "a",
                    display_mode: false
                },
                Segment::Math {
                    latex: "b",
                    display_mode: false
                },
            ]
        );
    }

    #[test]
    fn test_rejoin_strips_only_delimiters() {
        let input = "Let $a$ be $$\\frac{1}{2}$$ and $b^2$ end";
        let rejoined: String = segments(input).iter().map(|s| s.content()).collect();
        assert_eq!(rejoined, input.replace('$', ""));
    }

    #[test]
    fn test_segment_accessors() {
        let math = Segment::Math {
            latex: "x",
            display_mode: false,
        };
        assert_eq!(math.kind(), SegmentKind::Math);
        assert!(math.is_math());
        assert_eq!(Segment::Text("t").kind(), SegmentKind::Text);
        assert_eq!(Split::Plain("t").into_segments(), vec![Segment::Text("t")]);
        assert!(Split::Empty.into_segments().is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_segments_serialize_flat() {
        let json = serde_json::to_value(segments("see $$x$$")).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "kind": "text", "content": "see ", "display_mode": false },
                { "kind": "math", "content": "x", "display_mode": true }
            ])
        );
    }
}
