//! Ordered queries over the statement list around a cursor.

use crate::statement::{
    ForResourceStmt, MixinsStmt, ParseResult, ShapeDefStmt, Statement,
};

/// A located statement plus the queries the position classifier and the
/// feature handlers run over its neighborhood.
#[derive(Debug, Clone, Copy)]
pub struct StatementView<'a> {
    result: &'a ParseResult,
    source: &'a str,
    index: usize,
    offset: usize,
}

impl<'a> StatementView<'a> {
    /// Locate the innermost statement whose range contains `offset`.
    pub fn locate(result: &'a ParseResult, source: &'a str, offset: usize) -> Option<Self> {
        let index = result.statement_index_at(offset)?;
        Some(Self {
            result,
            source,
            index,
            offset,
        })
    }

    /// A view over an explicit statement index, for callers that walk
    /// the statement list themselves.
    pub fn at_index(result: &'a ParseResult, source: &'a str, index: usize) -> Option<Self> {
        let statement = result.statements.get(index)?;
        Some(Self {
            result,
            source,
            index,
            offset: statement.span().start,
        })
    }

    pub fn statement(&self) -> &'a Statement {
        &self.result.statements[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn parse_result(&self) -> &'a ParseResult {
        self.result
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// The nearest shape definition at or before this statement.
    pub fn nearest_shape_def_before(&self) -> Option<(usize, &'a ShapeDefStmt)> {
        self.result.statements[..=self.index]
            .iter()
            .enumerate()
            .rev()
            .find_map(|(index, statement)| match statement {
                Statement::ShapeDef(def) => Some((index, def)),
                _ => None,
            })
    }

    /// The nearest shape definition after this statement.
    pub fn nearest_shape_def_after(&self) -> Option<(usize, &'a ShapeDefStmt)> {
        self.result
            .statements
            .iter()
            .enumerate()
            .skip(self.index + 1)
            .find_map(|(index, statement)| match statement {
                Statement::ShapeDef(def) => Some((index, def)),
                _ => None,
            })
    }

    /// The `for` and `with` clauses between this statement and the shape
    /// definition (or inline member) that owns it, scanning backward.
    pub fn nearest_for_resource_and_mixins_before(
        &self,
    ) -> (Option<&'a ForResourceStmt>, Option<&'a MixinsStmt>) {
        let mut for_resource = None;
        let mut mixins = None;
        for statement in self.result.statements[..=self.index].iter().rev() {
            match statement {
                Statement::ForResource(stmt) if for_resource.is_none() => {
                    for_resource = Some(stmt);
                }
                Statement::Mixins(stmt) if mixins.is_none() => mixins = Some(stmt),
                Statement::ShapeDef(_) | Statement::InlineMemberDef(_) => break,
                _ => {}
            }
        }
        (for_resource, mixins)
    }

    /// Index of the innermost block enclosing this statement, or this
    /// statement itself when the cursor sits on a block.
    pub fn enclosing_block(&self) -> Option<usize> {
        if matches!(self.statement(), Statement::Block(_)) {
            return Some(self.index);
        }
        self.result
            .statements
            .iter()
            .enumerate()
            .filter(|(_, statement)| match statement {
                Statement::Block(block) => block.encloses(self.index),
                _ => false,
            })
            .map(|(index, _)| index)
            .next_back()
    }

    /// Names of sibling member definitions in the same block, excluding
    /// this statement and anything nested in inner blocks. Used to drop
    /// already-declared members from completions.
    pub fn other_member_names(&self) -> Vec<&'a str> {
        let Some(block_index) = self.enclosing_block() else {
            return Vec::new();
        };
        let Statement::Block(block) = &self.result.statements[block_index] else {
            return Vec::new();
        };
        let Some((first, last)) = block.enclosed else {
            return Vec::new();
        };

        let mut names = Vec::new();
        let mut skip_until = None;
        for index in first..=last {
            if let Some(until) = skip_until {
                if index <= until {
                    continue;
                }
                skip_until = None;
            }
            if index == self.index {
                continue;
            }
            match &self.result.statements[index] {
                Statement::Block(inner) => {
                    if let Some((_, inner_last)) = inner.enclosed {
                        skip_until = Some(inner_last);
                    }
                }
                Statement::MemberDef(def) => names.push(def.name.text.as_str()),
                Statement::EnumMemberDef(def) => names.push(def.name.text.as_str()),
                Statement::ElidedMemberDef(def) => names.push(def.name.text.as_str()),
                Statement::NodeMemberDef(def) => names.push(def.name.text.as_str()),
                Statement::InlineMemberDef(def) => names.push(def.name.text.as_str()),
                _ => {}
            }
        }
        names
    }

    /// The last statement inside the same block that ends at or before
    /// the cursor, with no newline in between. This is what makes
    /// `member: <cursor>` (with a space) classify as a target position.
    pub fn unbroken_predecessor(&self) -> Option<&'a Statement> {
        if !matches!(self.statement(), Statement::Block(_)) {
            return None;
        }
        let candidate = self
            .result
            .statements
            .iter()
            .filter(|statement| {
                let span = statement.span();
                span.end <= self.offset && !matches!(statement, Statement::Block(_))
            })
            .last()?;
        let gap = &self.source[candidate.span().end.min(self.source.len())
            ..self.offset.min(self.source.len())];
        if gap.contains('\n') {
            None
        } else {
            Some(candidate)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_idl_text;

    const SOURCE: &str = "$version: \"2\"\n\
namespace com.example\n\
\n\
structure Alpha for Res with [MixA] {\n\
    one: String\n\
    $two\n\
    three: Integer\n\
}\n\
\n\
structure Beta {}\n";

    #[test]
    fn nearest_defs_and_clauses() {
        let result = parse_idl_text(SOURCE);
        let offset = SOURCE.find("$two").unwrap() + 1;
        let view = StatementView::locate(&result, SOURCE, offset).unwrap();

        let (_, before) = view.nearest_shape_def_before().unwrap();
        assert_eq!(before.name.text, "Alpha");
        let (_, after) = view.nearest_shape_def_after().unwrap();
        assert_eq!(after.name.text, "Beta");

        let (for_resource, mixins) = view.nearest_for_resource_and_mixins_before();
        assert_eq!(for_resource.unwrap().resource.text, "Res");
        assert_eq!(mixins.unwrap().names[0].text, "MixA");
    }

    #[test]
    fn sibling_member_names_exclude_self() {
        let result = parse_idl_text(SOURCE);
        let offset = SOURCE.find("$two").unwrap() + 1;
        let view = StatementView::locate(&result, SOURCE, offset).unwrap();
        assert_eq!(view.other_member_names(), vec!["one", "three"]);
    }
}
