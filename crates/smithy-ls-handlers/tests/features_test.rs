//! End-to-end feature tests over a small on-disk project.

use lsp_types::{CompletionTextEdit, Position};
use smithy_ls_handlers::{completion, diagnostics, hover, references, rename, CancelToken, FileView};
use smithy_ls_model::Severity;
use smithy_ls_project::{NoManagedDocuments, Project, ProjectLoader};

struct Fixture {
    _dir: tempfile::TempDir,
    project: Project,
    main_path: String,
    other_path: String,
}

fn fixture_files(files: &[(&str, &str)]) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("model")).unwrap();
    std::fs::write(
        dir.path().join("smithy-build.json"),
        r#"{"version": "1.0", "sources": ["model"]}"#,
    )
    .unwrap();
    for (name, text) in files {
        std::fs::write(dir.path().join("model").join(name), text).unwrap();
    }

    let loader = ProjectLoader::default();
    let project = loader.load_root(dir.path(), &NoManagedDocuments);
    Fixture {
        main_path: dir
            .path()
            .join("model/main.smithy")
            .to_string_lossy()
            .to_string(),
        other_path: dir
            .path()
            .join("model/other.smithy")
            .to_string_lossy()
            .to_string(),
        _dir: dir,
        project,
    }
}

fn fixture(main: &str, other: &str) -> Fixture {
    fixture_files(&[("main.smithy", main), ("other.smithy", other)])
}

fn with_file<T>(
    project: &Project,
    path: &str,
    run: impl FnOnce(&FileView<'_>) -> T,
) -> T {
    let file = project.smithy_file(path).unwrap();
    let document = file.document();
    let parsed = file.parsed();
    let view = FileView::new(path, &document, &parsed);
    run(&view)
}

#[test]
fn trait_id_completion_offers_documentation() {
    let fx = fixture("$version: \"2\"\nnamespace com.a\n@doc", "namespace com.b\n");
    let position = Position { line: 2, character: 4 };
    let items = with_file(&fx.project, &fx.main_path, |view| {
        completion::completions(&fx.project, view, position, &CancelToken::new())
    });
    let item = items
        .iter()
        .find(|item| item.label == "documentation")
        .expect("documentation should complete for @doc");
    assert_eq!(item.detail.as_deref(), Some("smithy.api#documentation"));
    match item.text_edit.as_ref().unwrap() {
        CompletionTextEdit::Edit(edit) => {
            assert_eq!(edit.range.start, Position { line: 2, character: 1 });
            assert_eq!(edit.range.end, Position { line: 2, character: 4 });
            assert_eq!(edit.new_text, "documentation");
        }
        other => panic!("unexpected edit {other:?}"),
    }
}

#[test]
fn private_shapes_from_other_namespaces_are_hidden() {
    let fx = fixture(
        "$version: \"2\"\nnamespace com.a\nstructure UseIt {\n    field: B\n}\n",
        "$version: \"2\"\nnamespace com.b\n@private\nstructure B {}\n",
    );
    let position = Position { line: 3, character: 12 };
    let items = with_file(&fx.project, &fx.main_path, |view| {
        completion::completions(&fx.project, view, position, &CancelToken::new())
    });
    assert!(
        !items.iter().any(|item| item.detail.as_deref() == Some("com.b#B")),
        "private com.b#B must not be offered in com.a"
    );
}

#[test]
fn declared_members_are_excluded_from_completion() {
    let fx = fixture(
        "$version: \"2\"\nnamespace com.a\nservice S {\n    version: \"1\"\n    \n}\n",
        "namespace com.b\n",
    );
    let position = Position { line: 4, character: 4 };
    let items = with_file(&fx.project, &fx.main_path, |view| {
        completion::completions(&fx.project, view, position, &CancelToken::new())
    });
    let labels: Vec<&str> = items.iter().map(|item| item.label.as_str()).collect();
    assert!(labels.contains(&"operations"), "got {labels:?}");
    assert!(!labels.contains(&"version"), "already declared: {labels:?}");
}

#[test]
fn cancelled_completion_is_empty() {
    let fx = fixture("$version: \"2\"\nnamespace com.a\n@doc", "namespace com.b\n");
    let position = Position { line: 2, character: 4 };
    let items = with_file(&fx.project, &fx.main_path, |view| {
        completion::completions(&fx.project, view, position, &CancelToken::cancelled())
    });
    assert!(items.is_empty());
}

#[test]
fn suppressions_metadata_silences_matching_events() {
    let broken = "namespace com.a\nstructure S {\n    bad: Missing\n}\n";
    let has_target_code = |project: &Project, path: &str| {
        let diags = {
            let file = project.smithy_file(path).unwrap();
            let document = file.document();
            let parsed = file.parsed();
            let view = FileView::new(path, &document, &parsed);
            diagnostics::file_diagnostics(project, &view, Severity::Warning, &CancelToken::new())
        };
        diags.iter().any(|d| {
            matches!(&d.code, Some(lsp_types::NumberOrString::String(code)) if code == "Target")
        })
    };

    let unsuppressed = fixture(&format!("$version: \"2\"\n{broken}"), "namespace com.b\n");
    assert!(has_target_code(&unsuppressed.project, &unsuppressed.main_path));

    let suppressed = fixture(
        &format!(
            "$version: \"2\"\nmetadata suppressions = [{{id: \"Target\", namespace: \"com.a\", reason: \"pending\"}}]\n{broken}"
        ),
        "namespace com.b\n",
    );
    assert!(!has_target_code(&suppressed.project, &suppressed.main_path));
}

#[test]
fn hover_serializes_the_shape() {
    let fx = fixture(
        "$version: \"2\"\nnamespace com.a\n/// A thing.\nstructure Thing {\n    name: String\n}\nstructure Holder {\n    item: Thing\n}\n",
        "namespace com.b\n",
    );
    // hover over the member target `Thing` in Holder
    let position = Position { line: 7, character: 11 };
    let result = with_file(&fx.project, &fx.main_path, |view| {
        hover::hover(
            &fx.project,
            view,
            position,
            Severity::Warning,
            &CancelToken::new(),
        )
    })
    .expect("hover should resolve Thing");
    let lsp_types::HoverContents::Markup(content) = result.contents else {
        panic!("expected markup");
    };
    assert!(content.value.contains("```smithy"));
    assert!(content.value.contains("structure Thing"));
    assert!(content.value.contains("namespace com.a"));
    assert!(content.value.contains("/// A thing."));
}

#[test]
fn hover_on_control_key_uses_builtins() {
    let fx = fixture("$version: \"2\"\nnamespace com.a\n", "namespace com.b\n");
    let position = Position { line: 0, character: 3 };
    let result = with_file(&fx.project, &fx.main_path, |view| {
        hover::hover(
            &fx.project,
            view,
            position,
            Severity::Warning,
            &CancelToken::new(),
        )
    })
    .expect("control key hover");
    let lsp_types::HoverContents::Markup(content) = result.contents else {
        panic!("expected markup");
    };
    assert!(content.value.contains("IDL version"));
}

#[test]
fn references_span_files() {
    let fx = fixture(
        "$version: \"2\"\nnamespace com.a\nstructure S {}\n",
        "$version: \"2\"\nnamespace com.b\nuse com.a#S\napply S @documentation(\"x\")\n",
    );
    // cursor on the definition of S
    let position = Position { line: 2, character: 11 };
    let locations = with_file(&fx.project, &fx.main_path, |view| {
        references::find_references_request(&fx.project, view, position, &CancelToken::new())
    })
    .unwrap();
    let paths: Vec<String> = locations
        .iter()
        .map(|location| location.uri.to_string())
        .collect();
    assert!(paths.iter().any(|p| p.ends_with("main.smithy")));
    assert!(paths.iter().any(|p| p.ends_with("other.smithy")));
    // definition + use target + apply target at minimum
    assert!(locations.len() >= 3);
}

#[test]
fn references_fail_without_identifier() {
    let fx = fixture("$version: \"2\"\nnamespace com.a\nstructure S {}\n", "\n");
    let position = Position { line: 1, character: 9 };
    let result = with_file(&fx.project, &fx.main_path, |view| {
        references::find_references_request(
            &fx.project,
            view,
            Position { line: 2, character: 13 },
            &CancelToken::new(),
        )
        .and(references::find_references_request(
            &fx.project,
            view,
            position,
            &CancelToken::new(),
        ))
    });
    // `namespace ` keyword gap resolves to nothing
    assert!(result.is_err());
}

#[test]
fn rename_rewrites_all_files() {
    let fx = fixture(
        "$version: \"2\"\nnamespace com.a\nstructure Thing {}\n",
        "$version: \"2\"\nnamespace com.b\nuse com.a#Thing\nstructure Holder {\n    item: Thing\n}\n",
    );
    let position = Position { line: 2, character: 13 };
    let edit = with_file(&fx.project, &fx.main_path, |view| {
        rename::rename(&fx.project, view, position, "Gadget", &CancelToken::new())
    })
    .unwrap();
    let changes = edit.changes.unwrap();
    assert_eq!(changes.len(), 2);

    let other_edits = changes
        .iter()
        .find(|(uri, _)| uri.to_string().ends_with("other.smithy"))
        .map(|(_, edits)| edits)
        .unwrap();
    assert!(other_edits.iter().all(|edit| edit.new_text == "Gadget"));
    // the use target keeps its namespace, only the simple name moves
    assert!(other_edits
        .iter()
        .any(|edit| edit.range.start.line == 2 && edit.range.start.character == 10));
}

#[test]
fn rename_into_an_import_conflict_goes_fully_qualified() {
    let fx = fixture_files(&[
        (
            "main.smithy",
            "$version: \"2\"\nnamespace com.a\nstructure Old {}\n",
        ),
        (
            "lib.smithy",
            "$version: \"2\"\nnamespace com.b\nstructure Foo {}\n",
        ),
        (
            "other.smithy",
            "$version: \"2\"\nnamespace com.c\nuse com.a#Old\nuse com.b#Foo\nstructure H {\n    a: Old\n    b: Foo\n}\n",
        ),
    ]);
    // rename com.a#Old to Foo, colliding with other.smithy's import
    let position = Position { line: 2, character: 12 };
    let edit = with_file(&fx.project, &fx.main_path, |view| {
        rename::rename(&fx.project, view, position, "Foo", &CancelToken::new())
    })
    .unwrap();
    let changes = edit.changes.unwrap();
    let other_edits = changes
        .iter()
        .find(|(uri, _)| uri.to_string().ends_with("other.smithy"))
        .map(|(_, edits)| edits)
        .unwrap();

    // the reference to the renamed shape becomes fully qualified
    assert!(other_edits
        .iter()
        .any(|edit| edit.new_text == "com.a#Foo"));
    // the now-useless `use com.a#Old` line is deleted
    assert!(other_edits.iter().any(|edit| {
        edit.new_text.is_empty()
            && edit.range.start.line == 2
            && edit.range.end.line == 3
    }));
    // nothing in other.smithy is rewritten to a bare `Foo`
    assert!(!other_edits.iter().any(|edit| edit.new_text == "Foo"));
}

#[test]
fn prepare_rename_requires_a_resolvable_shape() {
    let fx = fixture("$version: \"2\"\nnamespace com.a\nstructure Thing {}\n", "\n");
    let good = Position { line: 2, character: 13 };
    let range = with_file(&fx.project, &fx.main_path, |view| {
        rename::prepare_rename(&fx.project, view, good)
    });
    assert!(range.is_some());
}
