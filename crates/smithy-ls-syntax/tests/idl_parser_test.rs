//! Integration tests for the tolerant IDL parser.

use pretty_assertions::assert_eq;
use smithy_ls_syntax::document::Document;
use smithy_ls_syntax::parse_idl;
use smithy_ls_syntax::statement::Statement;

const WEATHER: &str = r#"$version: "2.0"

namespace example.weather

use smithy.api#length

/// Provides weather forecasts.
service Weather {
    version: "2006-03-01"
    resources: [City]
    operations: [GetCurrentTime]
}

resource City {
    identifiers: { cityId: CityId }
    read: GetCity
    list: ListCities
}

@pattern("^[A-Za-z0-9 ]+$")
string CityId

@readonly
operation GetCity {
    input := {
        @required
        cityId: CityId
    }
    output := {
        @required
        name: String
    }
    errors: [NoSuchResource]
}

@error("client")
structure NoSuchResource {
    @required
    resourceType: String
}

structure CityCoordinates for City with [Located] {
    $cityId
    latitude: Float = 0
}

enum Suit {
    DIAMOND
    CLUB
    HEART
    SPADE
}

apply Weather @length(min: 1)
"#;

fn parse(source: &str) -> smithy_ls_syntax::ParseResult {
    parse_idl(&Document::of(source))
}

#[test]
fn parses_weather_model_cleanly() {
    let result = parse(WEATHER);
    assert_eq!(result.errors, vec![]);
    assert_eq!(result.version.as_ref().unwrap().value, "2.0");
    assert_eq!(result.namespace_name(), "example.weather");
    assert!(result.imports.ids.contains("smithy.api#length"));
}

#[test]
fn statements_appear_in_source_order() {
    let result = parse(WEATHER);
    let mut last_start = 0;
    for statement in &result.statements {
        // blocks start before their members but never before their shape
        assert!(statement.span().start >= last_start || matches!(statement, Statement::Block(_)));
        if !matches!(statement, Statement::Block(_)) {
            last_start = statement.span().start;
        }
    }
}

#[test]
fn child_spans_nest_inside_statement_spans() {
    let result = parse(WEATHER);
    for statement in &result.statements {
        let span = statement.span();
        match statement {
            Statement::ShapeDef(def) => {
                assert!(span.start <= def.shape_type.span.start);
                assert!(def.name.span.end <= span.end);
            }
            Statement::MemberDef(def) => {
                assert!(span.start <= def.name.span.start);
                if let Some(target) = &def.target {
                    assert!(target.span.end <= span.end);
                }
            }
            Statement::TraitApplication(app) => {
                assert!(span.start < app.id.span.start, "span includes the '@'");
                if let Some(value) = &app.value {
                    assert!(value.span().end <= span.end);
                }
            }
            _ => {}
        }
    }
}

#[test]
fn blocks_enclose_exactly_their_index_range() {
    let result = parse(WEATHER);
    for (index, statement) in result.statements.iter().enumerate() {
        let Statement::Block(block) = statement else {
            continue;
        };
        let Some((first, last)) = block.enclosed else {
            continue;
        };
        assert_eq!(first, index + 1);
        for enclosed in first..=last {
            let inner = result.statements[enclosed].span();
            assert!(
                block.span.start <= inner.start && inner.end <= block.span.end,
                "statement {enclosed} escapes block {index}"
            );
        }
        if last + 1 < result.statements.len() {
            let outside = result.statements[last + 1].span();
            assert!(outside.start >= block.span.end);
        }
    }
}

#[test]
fn service_members_are_node_members() {
    let result = parse(WEATHER);
    let names: Vec<_> = result
        .statements
        .iter()
        .filter_map(|s| match s {
            Statement::NodeMemberDef(def) => Some(def.name.text.as_str()),
            _ => None,
        })
        .collect();
    assert!(names.contains(&"version"));
    assert!(names.contains(&"resources"));
    assert!(names.contains(&"identifiers"));
    assert!(names.contains(&"errors"));
}

#[test]
fn inline_operation_members_nest() {
    let result = parse(WEATHER);
    let inline: Vec<_> = result
        .statements
        .iter()
        .filter_map(|s| match s {
            Statement::InlineMemberDef(def) => Some(def.name.text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(inline, vec!["input", "output"]);

    // the inline input's member is a plain member def
    let members: Vec<_> = result
        .statements
        .iter()
        .filter_map(|s| match s {
            Statement::MemberDef(def) => Some(def.name.text.as_str()),
            _ => None,
        })
        .collect();
    assert!(members.contains(&"cityId"));
}

#[test]
fn elided_members_and_mixins() {
    let result = parse(WEATHER);
    let elided = result.statements.iter().any(|s| {
        matches!(s, Statement::ElidedMemberDef(def) if def.name.text == "cityId")
    });
    assert!(elided);
    let mixins = result.statements.iter().any(|s| {
        matches!(s, Statement::Mixins(m) if m.names.iter().any(|n| n.text == "Located"))
    });
    assert!(mixins);
    let for_resource = result.statements.iter().any(|s| {
        matches!(s, Statement::ForResource(f) if f.resource.text == "City")
    });
    assert!(for_resource);
}

#[test]
fn doc_comments_attach_to_shapes() {
    let result = parse(WEATHER);
    let service = result.statements.iter().find_map(|s| match s {
        Statement::ShapeDef(def) if def.name.text == "Weather" => Some(def),
        _ => None,
    });
    assert_eq!(
        service.unwrap().docs.as_deref(),
        Some("Provides weather forecasts.")
    );
}

#[test]
fn incomplete_statement_recovers() {
    let source = "$version: \"2\"\nnamespace com.a\nstru\nstructure Good {}\n";
    let result = parse(source);
    assert!(result
        .statements
        .iter()
        .any(|s| matches!(s, Statement::Incomplete(id) if id.text == "stru")));
    assert!(result.statements.iter().any(|s| {
        matches!(s, Statement::ShapeDef(def) if def.name.text == "Good")
    }));
}

#[test]
fn garbage_never_panics_and_keeps_offsets() {
    let source = "structure ) Foo {\n  a: \n  ???\n}\nuse com.a#B\n";
    let result = parse(source);
    assert!(!result.errors.is_empty());
    for statement in &result.statements {
        assert!(statement.span().end <= source.len());
    }
    assert!(result.imports.ids.contains("com.a#B"));
}

#[test]
fn empty_file_parses_to_nothing() {
    let result = parse("");
    assert_eq!(result.statements, vec![]);
    assert!(result.version.is_none());
    assert!(result.namespace.is_none());
}
