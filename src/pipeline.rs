//! Pipeline – ties together validation, substitution, assembly, layout and
//! encoding into a single function call.

use serde::{Deserialize, Serialize};

use crate::assembler::{self, GenerationOptions, Recipient, SignatureBlock};
use crate::error::Error;
use crate::layout_config::LayoutConfig;
use crate::markup;
use crate::model::GeneratedDocument;
use crate::profile::{self, Employer, EmployeeProfile, Signatory};
use crate::render::{DocumentEncoder, PdfEncoder};
use crate::substitute::{self, escape_markup, FormatOptions, Values};
use crate::variables::{self, Classification};

/// Everything needed to produce one letter, as received from the calling
/// application (JSON over the CLI or the C ABI).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationRequest {
    pub recipient: Recipient,
    /// Subject line; may contain placeholders.
    pub subject: String,
    /// Template body markup with `{{name}}` placeholders.
    pub body: String,
    pub signature: SignatureBlock,
    pub options: GenerationOptions,
    pub format: FormatOptions,
    /// Explicit system bindings; they override values derived from
    /// `profile`, `employer` and `signatory`.
    pub system_values: Values,
    pub custom_values: Values,
    /// Custom variables declared by the template, with or without a value.
    pub custom_names: Vec<String>,
    pub profile: Option<EmployeeProfile>,
    pub employer: Option<Employer>,
    pub signatory: Option<Signatory>,
    /// Leave unknown placeholders in the text instead of rejecting the
    /// request.
    pub allow_unknown: bool,
}

impl GenerationRequest {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// System bindings: derived from the records when any is present, then
    /// overridden by the explicit map.
    pub fn effective_system_values(&self) -> Values {
        let has_records =
            self.profile.is_some() || self.employer.is_some() || self.signatory.is_some();
        let mut values = if has_records {
            profile::system_values(
                &self.profile.clone().unwrap_or_default(),
                &self.employer.clone().unwrap_or_default(),
                &self.signatory.clone().unwrap_or_default(),
                self.options.date,
            )
        } else {
            Values::new()
        };
        values.extend(
            self.system_values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        values
    }

    /// Declared custom names plus every name that has a custom value.
    pub fn effective_custom_names(&self) -> Vec<String> {
        let mut names = self.custom_names.clone();
        for name in self.custom_values.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// The recipient, filled from the employee profile when left blank.
    pub fn effective_recipient(&self) -> Recipient {
        let blank = self.recipient.prenom.trim().is_empty() && self.recipient.nom.trim().is_empty();
        match (&self.profile, blank) {
            (Some(p), true) => Recipient {
                civilite: p.civility(),
                prenom: p.prenom.clone().unwrap_or_default(),
                nom: p.nom.clone().unwrap_or_default(),
                adresse: p.adresse.clone(),
                code_postal: p.code_postal.clone(),
                ville: p.ville.clone(),
            },
            _ => self.recipient.clone(),
        }
    }

    /// The signature, filled from the signatory record when left blank.
    pub fn effective_signature(&self) -> SignatureBlock {
        let blank = self.signature.title.trim().is_empty() && self.signature.name.trim().is_empty();
        match (&self.signatory, blank) {
            (Some(s), true) => SignatureBlock {
                title: s.titre.clone().unwrap_or_default(),
                name: s.nom.clone().unwrap_or_default(),
            },
            _ => self.signature.clone(),
        }
    }

    /// Classify every placeholder of the subject and body.
    pub fn check(&self) -> Classification {
        let mut tokens = variables::extract(&self.subject);
        for t in variables::extract(&self.body) {
            if !tokens.contains(&t) {
                tokens.push(t);
            }
        }
        variables::classify(&tokens, &self.effective_custom_names())
    }
}

/// Validate and substitute the body.
///
/// Unknown placeholders fail with [`Error::UnresolvedVariables`] unless the
/// request allows them.
pub fn prepare_body(request: &GenerationRequest) -> Result<String, Error> {
    let classification = request.check();
    if !request.allow_unknown && !classification.is_resolved() {
        return Err(Error::UnresolvedVariables(classification.unknown_names()));
    }
    Ok(substitute::substitute(
        &request.body,
        &request.effective_system_values(),
        &request.custom_values,
        &request.format,
    ))
}

/// Substitute the subject line and reduce it to plain text.
fn prepare_subject(request: &GenerationRequest) -> String {
    if !request.subject.contains("{{") {
        return request.subject.clone();
    }
    let substituted = substitute::substitute(
        &escape_markup(&request.subject),
        &request.effective_system_values(),
        &request.custom_values,
        &request.format,
    );
    markup::plain_text(&markup::parse(&substituted))
}

/// Request → laid-out letter, without encoding.
pub fn build_document(
    request: &GenerationRequest,
    config: &LayoutConfig,
) -> Result<GeneratedDocument, Error> {
    let body = prepare_body(request)?;
    let subject = prepare_subject(request);
    let doc = assembler::generate(
        &request.effective_recipient(),
        &subject,
        &body,
        &request.effective_signature(),
        &request.options,
        config,
    )?;
    log::info!(
        "Generated letter {:?}: {} page(s), {} warning(s)",
        doc.subject,
        doc.page_count(),
        doc.warnings.len()
    );
    Ok(doc)
}

/// Full pipeline: request → PDF bytes.
///
/// Returns `(pdf_bytes, document)`; the document is the page model the PDF
/// was drawn from.
pub fn generate_pdf(
    request: &GenerationRequest,
    config: &LayoutConfig,
) -> Result<(Vec<u8>, GeneratedDocument), Error> {
    let doc = build_document(request, config)?;
    let bytes = PdfEncoder::new(config).encode(&doc)?;
    Ok((bytes, doc))
}

/// Convenience: request JSON → PDF bytes with the A4 default layout.
pub fn generate_pdf_from_json(json: &str) -> Result<Vec<u8>, Error> {
    let request = GenerationRequest::from_json(json)?;
    let (bytes, _) = generate_pdf(&request, &LayoutConfig::a4())?;
    Ok(bytes)
}
