//! Listing query builder
//!
//! Assembles the filter expression of a `list` call from structured
//! predicates. [`build_query`] is pure and performs no escaping: callers
//! that splice user-supplied names into an extra clause go through
//! [`quote_literal`] (the clause helpers below do).

use serde::{Deserialize, Serialize};

use crate::domain::RemoteId;
use crate::ports::FOLDER_MIME_TYPE;

/// Filter on the trashed flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrashedFilter {
    /// Only items that are not in the trash (`trashed=false`)
    #[default]
    Excluded,
    /// Only trashed items (`trashed=true`)
    Only,
    /// No clause at all
    Either,
}

impl TrashedFilter {
    fn as_clause_value(self) -> Option<bool> {
        match self {
            TrashedFilter::Excluded => Some(false),
            TrashedFilter::Only => Some(true),
            TrashedFilter::Either => None,
        }
    }
}

/// Structured predicates of a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingQuery {
    /// Exact mime type to match
    pub mime_type: Option<String>,
    /// Only items directly under the storage root
    pub root_only: bool,
    pub trashed: TrashedFilter,
    /// Clause appended verbatim
    pub extra: Option<String>,
}

impl ListingQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folders only
    #[must_use]
    pub fn folders() -> Self {
        Self {
            mime_type: Some(FOLDER_MIME_TYPE.to_string()),
            ..Self::default()
        }
    }

    /// Everything but folders
    ///
    /// A mime type exclusion is added unless `extra` already constrains
    /// `mimeType` outside of a quoted literal.
    #[must_use]
    pub fn files_excluding_folders(extra: Option<&str>) -> Self {
        let exclusion = format!("mimeType != '{FOLDER_MIME_TYPE}'");
        let extra = match extra.map(str::trim).filter(|e| !e.is_empty()) {
            None => exclusion,
            Some(e) if !constrains_mime_type(e) => format!("{e} and {exclusion}"),
            Some(e) => e.to_string(),
        };
        Self {
            extra: Some(extra),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn root_only(mut self, root_only: bool) -> Self {
        self.root_only = root_only;
        self
    }

    #[must_use]
    pub fn trashed(mut self, trashed: TrashedFilter) -> Self {
        self.trashed = trashed;
        self
    }

    #[must_use]
    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }

    /// Render the filter expression
    #[must_use]
    pub fn build(&self) -> String {
        build_query(
            self.mime_type.as_deref(),
            self.root_only,
            self.trashed.as_clause_value(),
            self.extra.as_deref(),
        )
    }
}

/// Join the present clauses with `" and "`
///
/// Blank `mime_type` and `extra` values count as absent, so the output never
/// has a dangling conjunction.
#[must_use]
pub fn build_query(
    mime_type: Option<&str>,
    root_only: bool,
    trashed: Option<bool>,
    extra: Option<&str>,
) -> String {
    let mut clauses: Vec<String> = Vec::with_capacity(4);

    if let Some(mime_type) = mime_type.filter(|m| !m.trim().is_empty()) {
        clauses.push(format!("mimeType='{mime_type}'"));
    }
    if root_only {
        clauses.push("'root' in parents".to_string());
    }
    if let Some(trashed) = trashed {
        clauses.push(format!("trashed={trashed}"));
    }
    if let Some(extra) = extra.map(str::trim).filter(|e| !e.is_empty()) {
        clauses.push(extra.to_string());
    }

    clauses.join(" and ")
}

/// Whether `clause` has a `mimeType` term outside its string literals
fn constrains_mime_type(clause: &str) -> bool {
    const FIELD: &str = "mimeType";
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';

    let mut in_literal = false;
    let mut escaped = false;
    let mut prev: Option<char> = None;
    for (i, c) in clause.char_indices() {
        if in_literal {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '\'' {
                in_literal = false;
            }
        } else if c == '\'' {
            in_literal = true;
        } else if clause[i..].starts_with(FIELD)
            && !prev.is_some_and(is_ident)
            && !clause[i + FIELD.len()..].starts_with(is_ident)
        {
            return true;
        }
        prev = Some(c);
    }
    false
}

/// Quote a value as a query string literal
#[must_use]
pub fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// `name = '<name>'`
#[must_use]
pub fn name_equals(name: &str) -> String {
    format!("name = {}", quote_literal(name))
}

/// `'<id>' in parents`
#[must_use]
pub fn in_parents(id: &RemoteId) -> String {
    format!("{} in parents", quote_literal(id.as_str()))
}

/// `('<a>' in parents or '<b>' in parents ...)`
#[must_use]
pub fn any_parent(ids: &[RemoteId]) -> Option<String> {
    if ids.is_empty() {
        return None;
    }
    let clauses: Vec<String> = ids.iter().map(in_parents).collect();
    Some(format!("({})", clauses.join(" or ")))
}
