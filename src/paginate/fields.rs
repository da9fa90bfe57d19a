//! Header and footer field rendering.

use std::fmt;
use std::rc::Rc;

use crate::config::FormatterConfig;
use crate::context::Context;
use crate::error::Result;
use crate::model::{char_len, Field, FieldList, LayoutMaster, Row};
use crate::translate::{TranslationRequest, Translator};

use super::page::PageDetails;

/// Renders the field lists of a page template into rows.
pub trait FieldResolver: fmt::Debug {
    /// Render one row per field list.
    fn render_fields(
        &self,
        details: &PageDetails,
        fields: &[FieldList],
        translator: &dyn Translator,
    ) -> Result<Vec<Row>>;
}

/// Places up to three fields per row: left, center and right.
///
/// With more than three fields the middle ones are joined and centered.
/// Rows are truncated to the flow width.
#[derive(Debug, Clone)]
pub struct DefaultFieldResolver {
    master: Rc<LayoutMaster>,
    context: Context,
    config: FormatterConfig,
}

impl DefaultFieldResolver {
    /// Create a resolver for pages of `master`.
    pub fn new(master: Rc<LayoutMaster>, context: Context, config: FormatterConfig) -> Self {
        Self {
            master,
            context,
            config,
        }
    }

    fn resolve(&self, field: &Field, details: &PageDetails) -> String {
        match field {
            Field::Text { text } => text.clone(),
            Field::PageNumber { style } => style.format(details.page_number()),
            Field::Evaluate { expression } => {
                expression.render(&self.context.at_page(details.page_number()))
            }
            Field::MarkerReference { name, last } => {
                let mut matching = details.markers().iter().filter(|m| &m.name == name);
                let marker = if *last { matching.last() } else { matching.next() };
                marker.map(|m| m.value.clone()).unwrap_or_default()
            }
        }
    }

    fn layout(&self, mut parts: Vec<String>) -> String {
        let width = self.master.flow_width();
        let space = self.config.space_char;
        if parts.len() > 3 {
            let last = parts.pop().unwrap_or_default();
            let first = parts.remove(0);
            let middle = parts.join(&space.to_string());
            parts = vec![first, middle, last];
        }

        let mut line: Vec<char> = vec![space; width];
        let mut put = |text: &str, start: usize| {
            for (i, c) in text.chars().enumerate() {
                if let Some(cell) = line.get_mut(start + i) {
                    *cell = c;
                }
            }
        };
        match parts.as_slice() {
            [] => {}
            [left] => put(left, 0),
            [left, right] => {
                put(right, width.saturating_sub(char_len(right)));
                put(left, 0);
            }
            [left, center, right, ..] => {
                put(right, width.saturating_sub(char_len(right)));
                put(center, width.saturating_sub(char_len(center)) / 2);
                put(left, 0);
            }
        }
        let text: String = line.into_iter().collect();
        text.trim_end_matches(space).to_string()
    }
}

impl FieldResolver for DefaultFieldResolver {
    fn render_fields(
        &self,
        details: &PageDetails,
        fields: &[FieldList],
        translator: &dyn Translator,
    ) -> Result<Vec<Row>> {
        let mut rows = Vec::with_capacity(fields.len());
        for list in fields {
            let mut parts = Vec::with_capacity(list.fields.len());
            for field in &list.fields {
                let text = self.config.fold_case(&self.resolve(field, details));
                let request = TranslationRequest::text(text).with_hyphenate(false);
                parts.push(translator.translate_whole(&request)?);
            }
            rows.push(
                Row::builder(self.layout(parts))
                    .row_spacing(list.row_spacing)
                    .build(),
            );
        }
        Ok(rows)
    }
}
