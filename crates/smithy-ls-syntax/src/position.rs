//! Cursor position classification.
//!
//! Maps a byte offset to an [`IdlPosition`] describing what the user is
//! editing. Classification is a pure function of the located statement
//! and the offset; within a statement the first field whose range
//! contains the offset wins, innermost first.

use crate::statement::{ParseResult, Statement};
use crate::view::StatementView;

/// What the cursor is on. Each variant carries the index of the
/// classified statement in the file's statement list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdlPosition {
    ControlKey(usize),
    MetadataKey(usize),
    MetadataValue(usize),
    StatementKeyword(usize),
    Namespace(usize),
    UseTarget(usize),
    TraitId(usize),
    TraitValue(usize),
    ApplyTarget(usize),
    ShapeDef(usize),
    Mixin(usize),
    ForResource(usize),
    MemberTarget(usize),
    MemberName(usize),
    ElidedMember(usize),
    NodeMemberTarget(usize),
    Unknown,
}

impl IdlPosition {
    /// Classify `offset` within a parsed file.
    pub fn of(result: &ParseResult, source: &str, offset: usize) -> IdlPosition {
        match StatementView::locate(result, source, offset) {
            Some(view) => Self::classify(&view),
            None => IdlPosition::Unknown,
        }
    }

    /// Classify the offset a [`StatementView`] was located at.
    pub fn classify(view: &StatementView<'_>) -> IdlPosition {
        let index = view.index();
        let offset = view.offset();
        match view.statement() {
            Statement::Control(stmt) => {
                if offset <= stmt.key.span.end {
                    IdlPosition::ControlKey(index)
                } else {
                    IdlPosition::Unknown
                }
            }
            Statement::Metadata(stmt) => {
                if let Some(value) = &stmt.value {
                    if value.span().touches(offset) {
                        return IdlPosition::MetadataValue(index);
                    }
                }
                if offset < stmt.key.span.start {
                    IdlPosition::StatementKeyword(index)
                } else if offset <= stmt.key.span.end {
                    IdlPosition::MetadataKey(index)
                } else {
                    IdlPosition::MetadataValue(index)
                }
            }
            Statement::Namespace(stmt) => {
                if offset < stmt.name.span.start && !stmt.name.text.is_empty() {
                    IdlPosition::StatementKeyword(index)
                } else {
                    IdlPosition::Namespace(index)
                }
            }
            Statement::Use(stmt) => {
                if offset < stmt.target.span.start && !stmt.target.text.is_empty() {
                    IdlPosition::StatementKeyword(index)
                } else {
                    IdlPosition::UseTarget(index)
                }
            }
            Statement::ShapeDef(stmt) => {
                if stmt.shape_type.span.touches(offset) && offset < stmt.name.span.start {
                    IdlPosition::StatementKeyword(index)
                } else {
                    IdlPosition::ShapeDef(index)
                }
            }
            Statement::Block(_) => classify_block(view),
            Statement::ForResource(_) => IdlPosition::ForResource(index),
            Statement::Mixins(_) => IdlPosition::Mixin(index),
            Statement::TraitApplication(stmt) => {
                if let Some(value) = &stmt.value {
                    if value.span().touches(offset) {
                        return IdlPosition::TraitValue(index);
                    }
                }
                IdlPosition::TraitId(index)
            }
            Statement::Apply(stmt) => {
                if offset < stmt.target.span.start && !stmt.target.text.is_empty() {
                    IdlPosition::StatementKeyword(index)
                } else {
                    IdlPosition::ApplyTarget(index)
                }
            }
            Statement::MemberDef(stmt) => {
                if stmt.name.span.touches(offset)
                    && stmt.colon.map_or(true, |colon| offset < colon.start)
                {
                    IdlPosition::MemberName(index)
                } else if stmt.colon.is_some() {
                    IdlPosition::MemberTarget(index)
                } else {
                    IdlPosition::MemberName(index)
                }
            }
            Statement::EnumMemberDef(_) => IdlPosition::MemberName(index),
            Statement::ElidedMemberDef(_) => IdlPosition::ElidedMember(index),
            Statement::NodeMemberDef(stmt) => {
                if stmt.name.span.touches(offset)
                    && stmt.colon.map_or(true, |colon| offset < colon.start)
                {
                    IdlPosition::MemberName(index)
                } else if stmt.colon.is_some() {
                    IdlPosition::NodeMemberTarget(index)
                } else {
                    IdlPosition::MemberName(index)
                }
            }
            Statement::InlineMemberDef(_) => IdlPosition::MemberName(index),
            Statement::Incomplete(_) => IdlPosition::StatementKeyword(index),
        }
    }

    /// The statement index this classification is anchored to.
    pub fn statement_index(&self) -> Option<usize> {
        match self {
            IdlPosition::ControlKey(i)
            | IdlPosition::MetadataKey(i)
            | IdlPosition::MetadataValue(i)
            | IdlPosition::StatementKeyword(i)
            | IdlPosition::Namespace(i)
            | IdlPosition::UseTarget(i)
            | IdlPosition::TraitId(i)
            | IdlPosition::TraitValue(i)
            | IdlPosition::ApplyTarget(i)
            | IdlPosition::ShapeDef(i)
            | IdlPosition::Mixin(i)
            | IdlPosition::ForResource(i)
            | IdlPosition::MemberTarget(i)
            | IdlPosition::MemberName(i)
            | IdlPosition::ElidedMember(i)
            | IdlPosition::NodeMemberTarget(i) => Some(*i),
            IdlPosition::Unknown => None,
        }
    }
}

/// The cursor is inside a block but on no member statement. Usually the
/// user is starting a new member; a dangling `member:` just before the
/// cursor re-classifies as the member's target position instead.
fn classify_block(view: &StatementView<'_>) -> IdlPosition {
    if let Some(predecessor) = view.unbroken_predecessor() {
        let statements = &view.parse_result().statements;
        let pred_index = statements
            .iter()
            .position(|statement| std::ptr::eq(statement, predecessor))
            .unwrap_or(view.index());
        match predecessor {
            Statement::MemberDef(def) if def.target.is_none() && def.colon.is_some() => {
                return IdlPosition::MemberTarget(pred_index);
            }
            Statement::NodeMemberDef(def) if def.value.is_none() && def.colon.is_some() => {
                return IdlPosition::NodeMemberTarget(pred_index);
            }
            _ => {}
        }
    }

    // a block that only holds trait applications (apply Target { ... })
    // offers no member positions
    let statements = &view.parse_result().statements;
    let mut preceding = view.index();
    while preceding > 0 {
        preceding -= 1;
        match &statements[preceding] {
            Statement::Apply(_) => return IdlPosition::Unknown,
            Statement::ForResource(_) | Statement::Mixins(_) => continue,
            _ => break,
        }
    }
    IdlPosition::MemberName(view.index())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_idl_text;

    fn classify_at(source: &str, needle: &str, delta: usize) -> IdlPosition {
        let result = parse_idl_text(source);
        let offset = source.find(needle).unwrap() + delta;
        IdlPosition::of(&result, source, offset)
    }

    const FILE: &str = "$version: \"2\"\n\
namespace com.example\n\
use com.other#Widget\n\
metadata validators = [{name: \"x\"}]\n\
\n\
@pattern(\"^a\")\n\
structure Alpha with [MixA] {\n\
    @required\n\
    one: String\n\
    $two\n\
}\n\
\n\
apply Alpha @tags([\"t\"])\n";

    #[test]
    fn classifies_header_statements() {
        assert!(matches!(
            classify_at(FILE, "$version", 4),
            IdlPosition::ControlKey(_)
        ));
        assert!(matches!(
            classify_at(FILE, "com.example", 3),
            IdlPosition::Namespace(_)
        ));
        assert!(matches!(
            classify_at(FILE, "com.other#Widget", 5),
            IdlPosition::UseTarget(_)
        ));
        assert!(matches!(
            classify_at(FILE, "validators", 2),
            IdlPosition::MetadataKey(_)
        ));
        assert!(matches!(
            classify_at(FILE, "{name:", 2),
            IdlPosition::MetadataValue(_)
        ));
    }

    #[test]
    fn classifies_shape_statements() {
        assert!(matches!(
            classify_at(FILE, "pattern", 3),
            IdlPosition::TraitId(_)
        ));
        assert!(matches!(
            classify_at(FILE, "\"^a\"", 1),
            IdlPosition::TraitValue(_)
        ));
        assert!(matches!(
            classify_at(FILE, "structure Alpha", 4),
            IdlPosition::StatementKeyword(_)
        ));
        assert!(matches!(
            classify_at(FILE, "Alpha with", 2),
            IdlPosition::ShapeDef(_)
        ));
        assert!(matches!(classify_at(FILE, "MixA", 2), IdlPosition::Mixin(_)));
    }

    #[test]
    fn classifies_members() {
        assert!(matches!(
            classify_at(FILE, "one: String", 1),
            IdlPosition::MemberName(_)
        ));
        assert!(matches!(
            classify_at(FILE, "String", 3),
            IdlPosition::MemberTarget(_)
        ));
        assert!(matches!(
            classify_at(FILE, "$two", 2),
            IdlPosition::ElidedMember(_)
        ));
        assert!(matches!(
            classify_at(FILE, "Alpha @tags", 2),
            IdlPosition::ApplyTarget(_)
        ));
    }

    #[test]
    fn dangling_member_colon_is_a_target_position() {
        let source = "$version: \"2\"\nnamespace com.a\nstructure S {\n    m: \n}\n";
        let result = parse_idl_text(source);
        let offset = source.find("m: ").unwrap() + 3;
        assert!(matches!(
            IdlPosition::of(&result, source, offset),
            IdlPosition::MemberTarget(_)
        ));
    }

    #[test]
    fn blank_line_in_block_is_a_member_name_position() {
        let source = "structure S {\n    \n}\n";
        let result = parse_idl_text(source);
        let offset = source.find("{\n").unwrap() + 4;
        assert!(matches!(
            IdlPosition::of(&result, source, offset),
            IdlPosition::MemberName(_)
        ));
    }

    #[test]
    fn incomplete_keyword_position() {
        let source = "$version: \"2\"\nnamespace com.a\nstru\n";
        assert!(matches!(
            classify_at(source, "stru\n", 2),
            IdlPosition::StatementKeyword(_)
        ));
    }
}
