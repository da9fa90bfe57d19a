//! Page geometry, templates and the document/section containers.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::rc::Rc;

use super::{Block, Expression, NumeralStyle};
use crate::error::Result;

/// Page geometry and templates shared by every page of a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutMaster {
    /// Page width in cells
    pub page_width: usize,

    /// Page height in rows
    pub page_height: usize,

    /// Margin on the binding side (odd pages)
    #[serde(default)]
    pub inner_margin: usize,

    /// Margin on the outer side (even pages)
    #[serde(default)]
    pub outer_margin: usize,

    /// Default row spacing multiplier (>= 1.0)
    #[serde(default = "default_row_spacing")]
    pub row_spacing: f32,

    /// Print on both sides of the sheet
    #[serde(default)]
    pub duplex: bool,

    /// Page templates, first match wins
    #[serde(default)]
    pub templates: Vec<PageTemplate>,

    /// Reserved page area
    #[serde(default)]
    pub page_area: Option<PageAreaProperties>,

    /// Border fill rows above and below the page content
    #[serde(default)]
    pub border: Option<PageBorder>,
}

fn default_row_spacing() -> f32 {
    1.0
}

static DEFAULT_TEMPLATE: PageTemplate = PageTemplate {
    condition: PageCondition::Any,
    header: Vec::new(),
    footer: Vec::new(),
};

impl LayoutMaster {
    /// Create a simplex master without templates.
    pub fn new(page_width: usize, page_height: usize) -> Self {
        Self {
            page_width,
            page_height,
            inner_margin: 0,
            outer_margin: 0,
            row_spacing: default_row_spacing(),
            duplex: false,
            templates: Vec::new(),
            page_area: None,
            border: None,
        }
    }

    /// Enable or disable duplex.
    pub fn with_duplex(mut self, duplex: bool) -> Self {
        self.duplex = duplex;
        self
    }

    /// Set inner and outer margins.
    pub fn with_margins(mut self, inner: usize, outer: usize) -> Self {
        self.inner_margin = inner;
        self.outer_margin = outer;
        self
    }

    /// Add a page template.
    pub fn with_template(mut self, template: PageTemplate) -> Self {
        self.templates.push(template);
        self
    }

    /// Set the page area.
    pub fn with_page_area(mut self, area: PageAreaProperties) -> Self {
        self.page_area = Some(area);
        self
    }

    /// Set the page border.
    pub fn with_border(mut self, border: PageBorder) -> Self {
        self.border = Some(border);
        self
    }

    /// Width available to the text flow.
    pub fn flow_width(&self) -> usize {
        self.page_width
            .saturating_sub(self.inner_margin)
            .saturating_sub(self.outer_margin)
    }

    /// The template for a page number (1-indexed).
    pub fn template(&self, page_number: u32) -> &PageTemplate {
        self.templates
            .iter()
            .find(|t| t.applies_to(page_number))
            .unwrap_or(&DEFAULT_TEMPLATE)
    }

    /// Height of a field list group in rows.
    pub fn fields_height(&self, fields: &[FieldList]) -> f32 {
        fields
            .iter()
            .map(|f| f.row_spacing.unwrap_or(self.row_spacing).max(1.0))
            .sum()
    }

    /// Height of the template's header.
    pub fn header_height(&self, template: &PageTemplate) -> f32 {
        self.fields_height(&template.header)
    }

    /// Height of the template's footer.
    pub fn footer_height(&self, template: &PageTemplate) -> f32 {
        self.fields_height(&template.footer)
    }

    /// Rows taken by the border.
    pub fn border_rows(&self) -> usize {
        self.border.as_ref().map_or(0, PageBorder::row_count)
    }

    /// Rows available to the text flow (and page area) for a template.
    pub fn flow_height(&self, template: &PageTemplate) -> usize {
        let fields = (self.header_height(template) + self.footer_height(template)).ceil() as usize;
        self.page_height
            .saturating_sub(fields)
            .saturating_sub(self.border_rows())
    }

    /// Margin for a page number: outer on even pages, inner on odd ones.
    pub fn page_margin(&self, page_number: u32) -> usize {
        if page_number % 2 == 0 {
            self.outer_margin
        } else {
            self.inner_margin
        }
    }

    /// Physical section properties.
    pub fn new_section_properties(&self) -> SectionProperties {
        SectionProperties {
            duplex: self.duplex,
            page_width: self.page_width,
            page_height: self.page_height,
        }
    }
}

/// Physical properties shared by the sheets of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionProperties {
    /// Print on both sides
    pub duplex: bool,
    /// Page width in cells
    pub page_width: usize,
    /// Page height in rows
    pub page_height: usize,
}

impl SectionProperties {
    /// Pages per sheet.
    pub fn pages_per_sheet(&self) -> usize {
        if self.duplex {
            2
        } else {
            1
        }
    }
}

/// Which pages a template applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageCondition {
    /// Every page
    #[default]
    Any,
    /// Odd page numbers
    Odd,
    /// Even page numbers
    Even,
}

/// Header and footer fields for a set of pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageTemplate {
    /// Pages the template applies to
    #[serde(default)]
    pub condition: PageCondition,
    /// Header rows
    #[serde(default)]
    pub header: Vec<FieldList>,
    /// Footer rows
    #[serde(default)]
    pub footer: Vec<FieldList>,
}

impl PageTemplate {
    /// Create a template for every page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the template to some pages.
    pub fn with_condition(mut self, condition: PageCondition) -> Self {
        self.condition = condition;
        self
    }

    /// Add a header row.
    pub fn with_header(mut self, fields: FieldList) -> Self {
        self.header.push(fields);
        self
    }

    /// Add a footer row.
    pub fn with_footer(mut self, fields: FieldList) -> Self {
        self.footer.push(fields);
        self
    }

    /// Check if the template applies to a page number.
    pub fn applies_to(&self, page_number: u32) -> bool {
        match self.condition {
            PageCondition::Any => true,
            PageCondition::Odd => page_number % 2 == 1,
            PageCondition::Even => page_number % 2 == 0,
        }
    }
}

/// The fields of one header or footer row.
///
/// One field is placed left, two are placed left and right, three are
/// placed left, center and right.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldList {
    /// Fields, left to right
    pub fields: Vec<Field>,
    /// Row spacing override
    #[serde(default)]
    pub row_spacing: Option<f32>,
}

impl FieldList {
    /// Create a field list.
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            row_spacing: None,
        }
    }
}

/// A header or footer field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Field {
    /// Literal text
    Text {
        /// The text
        text: String,
    },
    /// The current page number
    PageNumber {
        /// Numeral style
        #[serde(default)]
        style: NumeralStyle,
    },
    /// An expression evaluated for the page
    Evaluate {
        /// The expression
        expression: Expression,
    },
    /// The value of a marker found on the page
    MarkerReference {
        /// Marker name
        name: String,
        /// Use the last matching marker instead of the first
        #[serde(default)]
        last: bool,
    },
}

/// Vertical placement of the page area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageAreaAlignment {
    /// Below the header
    Top,
    /// Above the footer
    #[default]
    Bottom,
}

/// Reserved region holding page-area blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageAreaProperties {
    /// Top or bottom of the page
    #[serde(default)]
    pub alignment: PageAreaAlignment,
    /// Maximum rows of page-area content per page
    pub max_height: usize,
    /// Static blocks rendered before the area content
    #[serde(default)]
    pub before: Vec<Block>,
    /// Static blocks rendered after the area content
    #[serde(default)]
    pub after: Vec<Block>,
}

/// Fill patterns for the rows framing the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBorder {
    /// Pattern for the row above the header
    #[serde(default)]
    pub top: Option<String>,
    /// Pattern for the row below the footer
    #[serde(default)]
    pub bottom: Option<String>,
}

impl PageBorder {
    /// Number of border rows.
    pub fn row_count(&self) -> usize {
        usize::from(self.top.is_some()) + usize::from(self.bottom.is_some())
    }
}

/// A section: blocks laid out with one layout master.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSequence {
    /// Page geometry and templates
    pub master: Rc<LayoutMaster>,

    /// Page number of the first page, overriding the running count
    #[serde(default)]
    pub initial_page_number: Option<u32>,

    /// Content blocks
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl BlockSequence {
    /// Create a section.
    pub fn new(master: LayoutMaster) -> Self {
        Self {
            master: Rc::new(master),
            initial_page_number: None,
            blocks: Vec::new(),
        }
    }

    /// Set the initial page number.
    pub fn with_initial_page_number(mut self, number: u32) -> Self {
        self.initial_page_number = Some(number);
        self
    }

    /// Add a block.
    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Add a block, builder style.
    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }
}

/// A document: an ordered list of sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Sections, in order
    pub sections: Vec<BlockSequence>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a section.
    pub fn add_section(&mut self, section: BlockSequence) {
        self.sections.push(section);
    }

    /// Number of blocks across all sections.
    pub fn block_count(&self) -> usize {
        self.sections.iter().map(|s| s.blocks.len()).sum()
    }

    /// Parse a document from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a document from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(text: &str) -> FieldList {
        FieldList::new(vec![Field::Text { text: text.into() }])
    }

    #[test]
    fn test_flow_dimensions() {
        let master = LayoutMaster::new(32, 29)
            .with_margins(2, 1)
            .with_template(PageTemplate::new().with_header(header("h")).with_footer(header("f")))
            .with_border(PageBorder {
                top: Some("=".into()),
                bottom: None,
            });
        assert_eq!(master.flow_width(), 29);
        assert_eq!(master.flow_height(master.template(1)), 29 - 2 - 1);
        assert_eq!(master.page_margin(1), 2);
        assert_eq!(master.page_margin(2), 1);
    }

    #[test]
    fn test_template_selection() {
        let master = LayoutMaster::new(20, 10)
            .with_template(PageTemplate::new().with_condition(PageCondition::Even).with_header(header("even")))
            .with_template(PageTemplate::new().with_header(header("any")).with_footer(header("f")));
        assert_eq!(master.template(2).header, vec![header("even")]);
        assert_eq!(master.template(3).header, vec![header("any")]);
        assert_eq!(master.flow_height(master.template(3)), 8);
    }

    #[test]
    fn test_default_template_is_empty() {
        let master = LayoutMaster::new(20, 10);
        assert!(master.template(1).header.is_empty());
        assert_eq!(master.flow_height(master.template(1)), 10);
    }

    #[test]
    fn test_document_from_json() {
        let json = r#"{
            "sections": [{
                "master": {"page_width": 20, "page_height": 5, "duplex": true},
                "blocks": [{"segments": [{"type": "text", "text": "Hello"}]}]
            }]
        }"#;
        let doc = Document::from_json(json).unwrap();
        assert_eq!(doc.sections.len(), 1);
        assert!(doc.sections[0].master.duplex);
        assert_eq!(doc.sections[0].master.row_spacing, 1.0);
        assert_eq!(doc.block_count(), 1);
    }
}
