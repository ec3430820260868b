// Pipeline parser for the selection DSL

use super::lexer::{identifier, string_literal, ws};
use crate::error::{DashboardError, Result};
use crate::query::Selection;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{eof, opt},
    multi::separated_list0,
    sequence::delimited,
    IResult,
};

#[derive(Debug)]
enum PipelineComponent {
    Themes(Vec<String>),
    X(String),
    Y(String),
}

/// Parse a themes command
/// Format: themes("City", "Star Wars")
fn parse_themes(input: &str) -> IResult<&str, PipelineComponent> {
    let (input, _) = ws(tag("themes"))(input)?;
    let (input, themes) = delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), ws(string_literal)),
        ws(char(')')),
    )(input)?;
    Ok((input, PipelineComponent::Themes(themes)))
}

/// Parse an axis command
/// Format: x(year) or y(price)
fn parse_axis(input: &str) -> IResult<&str, PipelineComponent> {
    let (input, axis) = ws(alt((tag("x"), tag("y"))))(input)?;
    let (input, field) = delimited(ws(char('(')), ws(identifier), ws(char(')')))(input)?;
    let component = if axis == "x" {
        PipelineComponent::X(field)
    } else {
        PipelineComponent::Y(field)
    };
    Ok((input, component))
}

fn parse_pipeline_component(input: &str) -> IResult<&str, PipelineComponent> {
    alt((parse_themes, parse_axis))(input)
}

/// Parse a complete selection
/// Format: component | component | ...
///
/// Missing components keep the defaults of `Selection::default()`; a later
/// component of the same kind overrides an earlier one.
pub fn parse_selection(input: &str) -> IResult<&str, Selection> {
    // If input starts with "|", consume it
    let (input, _) = opt(ws(tag("|")))(input)?;

    let (input, components) = separated_list0(ws(tag("|")), parse_pipeline_component)(input)?;

    // Consume trailing whitespace and ensure end of input
    let (input, _) = ws(eof)(input)?;

    let mut selection = Selection::default();
    for component in components {
        match component {
            PipelineComponent::Themes(themes) => selection.themes = themes.into_iter().collect(),
            PipelineComponent::X(field) => selection.x = field,
            PipelineComponent::Y(field) => selection.y = field,
        }
    }

    Ok((input, selection))
}

/// Parse a selection, mapping nom failures onto the crate error type
pub fn parse_selection_str(input: &str) -> Result<Selection> {
    parse_selection(input)
        .map(|(_, selection)| selection)
        .map_err(|e| DashboardError::InvalidRequest(format!("Could not parse selection '{}': {}", input, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_selection() {
        let result = parse_selection(r#"themes("City", "Star Wars") | x(num_parts) | y(ppp)"#);
        assert!(result.is_ok());
        let (_, selection) = result.unwrap();
        assert_eq!(selection, Selection::new(["City", "Star Wars"], "num_parts", "ppp"));
    }

    #[test]
    fn test_parse_defaults() {
        let (_, selection) = parse_selection(r#"themes("Technic")"#).unwrap();
        assert_eq!(selection.x, "year");
        assert_eq!(selection.y, "price");
        assert!(selection.themes.contains("Technic"));
    }

    #[test]
    fn test_parse_empty_input() {
        let (_, selection) = parse_selection("   ").unwrap();
        assert_eq!(selection, Selection::default());
    }

    #[test]
    fn test_parse_empty_themes() {
        let (_, selection) = parse_selection("themes() | x(price)").unwrap();
        assert!(selection.themes.is_empty());
        assert_eq!(selection.x, "price");
    }

    #[test]
    fn test_parse_any_order_with_whitespace() {
        let (_, selection) = parse_selection("  y( year ) |x(price)| themes( \"City\" )  ").unwrap();
        assert_eq!(selection, Selection::new(["City"], "price", "year"));
    }

    #[test]
    fn test_later_component_wins() {
        let (_, selection) = parse_selection("x(price) | x(ppp)").unwrap();
        assert_eq!(selection.x, "ppp");
    }

    #[test]
    fn test_unknown_field_is_left_to_the_query() {
        // Field names are validated by the query, not the parser
        let (_, selection) = parse_selection("x(invalidfield)").unwrap();
        assert_eq!(selection.x, "invalidfield");
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_selection("themes(City)").is_err());
        assert!(parse_selection("x(year) y(price)").is_err());
        assert!(parse_selection("z(year)").is_err());
        assert!(parse_selection(r#"themes("City""#).is_err());
    }

    #[test]
    fn test_parse_selection_str_error_type() {
        let err = parse_selection_str("colour(red)").unwrap_err();
        assert!(matches!(err, DashboardError::InvalidRequest(_)));
    }
}
