//! Output schema: template, field bindings and record assembly.

pub mod binding;
pub mod record;
pub mod valuation;

pub use binding::{ExtractorKind, FieldBinding};
pub use record::Record;
pub use valuation::{valuation_report_bindings, ValuationReportTemplate};

use serde_json::Value;
use tracing::debug;

use crate::corpus::Corpus;
use crate::error::SchemaError;
use crate::extract::{numeric, FieldExtractor, FieldValue, KeywordRules};

/// Supplies the default-valued record for a form.
///
/// The template also defines which paths exist: bindings may only write to
/// paths it contains.
pub trait SchemaTemplate {
    fn default_record(&self) -> Value;
}

/// Copy of one record section into another after extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMirror {
    pub from: String,
    pub to: String,
}

/// A form definition: template, bindings in evaluation order, and
/// post-extraction steps.
pub struct ReportSchema {
    template: Box<dyn SchemaTemplate + Send + Sync>,
    pub bindings: Vec<FieldBinding>,
    pub mirrors: Vec<SectionMirror>,
    /// Path receiving the whole corpus text, if any.
    pub full_text_path: Option<String>,
}

impl std::fmt::Debug for ReportSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportSchema")
            .field("bindings", &self.bindings.len())
            .field("mirrors", &self.mirrors)
            .field("full_text_path", &self.full_text_path)
            .finish()
    }
}

impl ReportSchema {
    pub fn new(
        template: impl SchemaTemplate + Send + Sync + 'static,
        bindings: Vec<FieldBinding>,
    ) -> Self {
        Self {
            template: Box::new(template),
            bindings,
            mirrors: Vec::new(),
            full_text_path: None,
        }
    }

    /// The built-in valuation report form.
    pub fn valuation_report() -> Self {
        let mut schema = Self::new(ValuationReportTemplate, valuation_report_bindings());
        schema.mirrors.push(SectionMirror {
            from: valuation::FINANCE_SECTION.to_string(),
            to: valuation::HPP_SECTION.to_string(),
        });
        schema.full_text_path = Some(valuation::FULL_TEXT_PATH.to_string());
        schema
    }

    /// Fresh default-valued record.
    pub fn default_record(&self) -> Result<Record, SchemaError> {
        Record::from_template(self.template.default_record())
    }

    /// Check that every binding, mirror and the full-text path point at
    /// paths the template defines.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let record = self.default_record()?;
        let paths = self
            .bindings
            .iter()
            .map(|b| b.path.as_str())
            .chain(self.mirrors.iter().flat_map(|m| [m.from.as_str(), m.to.as_str()]))
            .chain(self.full_text_path.as_deref());
        for path in paths {
            if !record.contains(path) {
                return Err(SchemaError::UnknownPath(path.to_string()));
            }
        }
        Ok(())
    }
}

/// Populates records from a corpus.
#[derive(Debug)]
pub struct ReportAssembler {
    extractor: FieldExtractor,
    schema: ReportSchema,
    /// Keyword patterns per binding, in binding order.
    keyword_rules: Vec<KeywordRules>,
}

impl ReportAssembler {
    pub fn new(extractor: FieldExtractor, schema: ReportSchema) -> Self {
        let keyword_rules = schema
            .bindings
            .iter()
            .map(|b| KeywordRules::new(&b.keywords))
            .collect();
        Self {
            extractor,
            schema,
            keyword_rules,
        }
    }

    /// Run every binding over `corpus` and build the record.
    ///
    /// Fields that are not found keep their template default. An empty
    /// corpus yields the default record.
    pub fn assemble(&self, corpus: &Corpus) -> Result<Record, SchemaError> {
        let mut record = self.schema.default_record()?;
        let mut found = 0usize;

        for (binding, keywords) in self.schema.bindings.iter().zip(&self.keyword_rules) {
            if !record.contains(&binding.path) {
                return Err(SchemaError::UnknownPath(binding.path.clone()));
            }
            let value = self
                .extractor
                .extract_with(corpus, binding, keywords)
                .and_then(|value| post_process(binding, value));
            if let Some(value) = value {
                record.set(&binding.path, value.into())?;
                found += 1;
            }
        }

        for mirror in &self.schema.mirrors {
            record.copy_section(&mirror.from, &mirror.to)?;
        }
        if let Some(path) = &self.schema.full_text_path {
            record.set(path, Value::String(corpus.full_text()))?;
        }

        debug!(
            fields = self.schema.bindings.len(),
            found,
            fragments = corpus.len(),
            "record assembled"
        );
        Ok(record)
    }
}

fn post_process(binding: &FieldBinding, value: FieldValue) -> Option<FieldValue> {
    match value {
        FieldValue::Text(text) if binding.digits_only => {
            let digits = numeric::digits_only(&text);
            (!digits.is_empty()).then_some(FieldValue::Text(digits))
        }
        other => Some(other),
    }
}
