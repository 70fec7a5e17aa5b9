//! Data model binding paths.
//!
//! A binding such as `Model.Group[1].Nested[2].Name` is a dot-separated list
//! of [`PathSegment`]s, each with a base name and an optional array index.
//! Parsing is best effort: a part that does not fit `base ('[' digits ']')?`
//! is kept verbatim as its base, so [`DataBinding::parse`] never fails and
//! [`fmt::Display`] reproduces such parts unchanged.
//!
//! # Example
//!
//! ```
//! # use trellis_parser::DataBinding;
//! let mut binding = DataBinding::parse("Model.Group.Name");
//! binding.at_mut(1).unwrap().set_array_index(Some(3));
//!
//! assert_eq!(binding.to_string(), "Model.Group[3].Name");
//! ```

use std::{convert::Infallible, fmt, str::FromStr};

use winnow::{
    Parser as _,
    ascii::digit1,
    combinator::{delimited, opt},
    error::{ContextError, ErrMode},
    token::take_while,
};

type IResult<O> = std::result::Result<O, ErrMode<ContextError>>;

/// One dot-separated component of a binding path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    base: String,
    array_index: Option<usize>,
    parent_index: usize,
}

impl PathSegment {
    /// The component name with any `[n]` suffix stripped.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The array index, if the component carried one.
    pub fn array_index(&self) -> Option<usize> {
        self.array_index
    }

    /// Position of this segment within its path.
    pub fn parent_index(&self) -> usize {
        self.parent_index
    }

    pub fn has_array_index(&self) -> bool {
        self.array_index.is_some()
    }

    pub fn set_array_index(&mut self, array_index: Option<usize>) {
        self.array_index = array_index;
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.array_index {
            Some(index) => write!(f, "{}[{}]", self.base, index),
            None => f.write_str(&self.base),
        }
    }
}

/// A parsed data model binding path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBinding {
    segments: Vec<PathSegment>,
}

impl DataBinding {
    /// Parses a dotted, optionally indexed path.
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('.')
            .enumerate()
            .map(|(parent_index, part)| {
                let (base, array_index) = split_segment(part);
                PathSegment {
                    base: base.to_string(),
                    array_index,
                    parent_index,
                }
            })
            .collect();

        Self { segments }
    }

    /// All segments in path order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The segment at `index`, or `None` when out of range.
    pub fn at(&self, index: usize) -> Option<&PathSegment> {
        self.segments.get(index)
    }

    /// Mutable access to the segment at `index`.
    pub fn at_mut(&mut self, index: usize) -> Option<&mut PathSegment> {
        self.segments.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl FromStr for DataBinding {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for DataBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Parse `base ('[' digits ']')?`
fn segment<'s>(input: &mut &'s str) -> IResult<(&'s str, Option<usize>)> {
    let base = take_while(1.., |c: char| c != '[').parse_next(input)?;
    let index = opt(delimited(
        '[',
        digit1.try_map(|digits: &str| digits.parse::<usize>()),
        ']',
    ))
    .parse_next(input)?;
    Ok((base, index))
}

/// Split one path component, keeping it verbatim when it does not parse.
fn split_segment(part: &str) -> (&str, Option<usize>) {
    let mut input = part;
    match segment(&mut input) {
        Ok(parsed) if input.is_empty() => parsed,
        _ => (part, None),
    }
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // =========================================================================
    // Strategies
    // =========================================================================

    fn base_strategy() -> impl Strategy<Value = String> {
        "[A-Za-z_][A-Za-z0-9_-]{0,8}"
    }

    fn segment_strategy() -> impl Strategy<Value = (String, Option<usize>)> {
        (base_strategy(), proptest::option::of(0usize..1000))
    }

    fn path_strategy() -> impl Strategy<Value = Vec<(String, Option<usize>)>> {
        proptest::collection::vec(segment_strategy(), 1..6)
    }

    fn render(parts: &[(String, Option<usize>)]) -> String {
        parts
            .iter()
            .map(|(base, index)| match index {
                Some(index) => format!("{base}[{index}]"),
                None => base.clone(),
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    // =========================================================================
    // Property Test Functions
    // =========================================================================

    fn check_parse_recovers_parts(parts: Vec<(String, Option<usize>)>) {
        let binding = DataBinding::parse(&render(&parts));

        assert_eq!(binding.len(), parts.len());
        for (i, (base, index)) in parts.iter().enumerate() {
            let segment = binding.at(i).unwrap();
            assert_eq!(segment.base(), base);
            assert_eq!(segment.array_index(), *index);
            assert_eq!(segment.parent_index(), i);
        }
    }

    fn check_display_reproduces_input(path: String) {
        assert_eq!(DataBinding::parse(&path).to_string(), path);
    }

    fn check_set_index_only_touches_one_segment(
        parts: Vec<(String, Option<usize>)>,
        position: usize,
        index: usize,
    ) {
        let position = position % parts.len();
        let mut binding = DataBinding::parse(&render(&parts));
        binding.at_mut(position).unwrap().set_array_index(Some(index));

        let mut expected = parts.clone();
        expected[position].1 = Some(index);
        assert_eq!(binding.to_string(), render(&expected));
    }

    // =========================================================================
    // Proptest Wrappers
    // =========================================================================

    proptest! {
        #[test]
        fn parse_recovers_parts(parts in path_strategy()) {
            check_parse_recovers_parts(parts);
        }

        #[test]
        fn display_reproduces_input(path in "[A-Za-z_\\[\\]\\.]{0,24}") {
            check_display_reproduces_input(path);
        }

        #[test]
        fn set_index_only_touches_one_segment(
            parts in path_strategy(),
            position in 0usize..10,
            index in 0usize..1000,
        ) {
            check_set_index_only_touches_one_segment(parts, position, index);
        }
    }
}
