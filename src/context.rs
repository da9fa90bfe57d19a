//! Evaluation context passed explicitly through layout calls.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The part of the output a pagination pass belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentSpace {
    /// The main body of the document
    #[default]
    Body,

    /// Content placed before the body of a volume
    PreContent {
        /// Volume number (1-indexed)
        volume: u32,
    },

    /// Content placed after the body of a volume
    PostContent {
        /// Volume number (1-indexed)
        volume: u32,
    },
}

/// Values available to evaluated expressions and page fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// Document space being laid out
    #[serde(default)]
    pub space: DocumentSpace,

    /// Current volume (1-indexed)
    #[serde(default = "default_volume")]
    pub current_volume: u32,

    /// Total number of volumes, when known
    #[serde(default)]
    pub volume_count: Option<u32>,

    /// Page number of the page being filled, when known
    #[serde(default)]
    pub current_page: Option<u32>,

    /// Named variables
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

fn default_volume() -> u32 {
    1
}

impl Context {
    /// Create a new context for the body space of volume 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document space.
    pub fn with_space(mut self, space: DocumentSpace) -> Self {
        self.space = space;
        self
    }

    /// Set the current volume.
    pub fn with_volume(mut self, volume: u32) -> Self {
        self.current_volume = volume;
        self
    }

    /// Set a named variable.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Copy of this context positioned on the given page.
    pub fn at_page(&self, page: u32) -> Self {
        let mut ctx = self.clone();
        ctx.current_page = Some(page);
        ctx
    }

    /// Resolve a name used in an expression.
    ///
    /// The built-in names `page`, `volume` and `volumes` shadow variables.
    pub fn lookup(&self, name: &str) -> Option<String> {
        match name {
            "page" => self.current_page.map(|p| p.to_string()),
            "volume" => Some(self.current_volume.to_string()),
            "volumes" => self.volume_count.map(|v| v.to_string()),
            _ => self.variables.get(name).cloned(),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self {
            space: DocumentSpace::Body,
            current_volume: default_volume(),
            volume_count: None,
            current_page: None,
            variables: HashMap::new(),
        }
    }
}
