//! Document assembler – wraps a rendered body in the fixed French business
//! letter skeleton and lays the whole letter out.
//!
//! Order on the page: letterhead, separator, place and date, recipient
//! block, subject line, greeting, body, closing formula, signature.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::layout::{self, PageDecoration};
use crate::layout_config::LayoutConfig;
use crate::markup::{self, Alignment, Block, TextSegment};
use crate::model::{DocumentMetadata, GeneratedDocument};
use crate::profile::Civility;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recipient {
    pub civilite: Civility,
    pub prenom: String,
    pub nom: String,
    pub adresse: Option<String>,
    pub code_postal: Option<String>,
    pub ville: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureBlock {
    pub title: String,
    pub name: String,
}

/// Sender identity printed at the top of the first page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Letterhead {
    pub name: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    /// Date printed in the "place, le …" line.
    pub date: NaiveDate,
    pub place: String,
    pub show_page_numbers: bool,
    pub show_footer: bool,
    pub footer_text: Option<String>,
    /// Running header repeated in the top margin of every page.
    pub header: Option<String>,
    pub letterhead: Option<Letterhead>,
    pub author: Option<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            date: chrono::Local::now().date_naive(),
            place: String::new(),
            show_page_numbers: true,
            show_footer: false,
            footer_text: None,
            header: None,
            letterhead: None,
            author: None,
        }
    }
}

impl GenerationOptions {
    fn decoration(&self) -> PageDecoration {
        PageDecoration {
            header: self.header.clone(),
            footer_text: if self.show_footer {
                self.footer_text.clone()
            } else {
                None
            },
            show_page_numbers: self.show_page_numbers,
        }
    }
}

const MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// French long date: "15 janvier 2024", "1er mars 2024".
pub fn long_date(date: NaiveDate) -> String {
    let month = MONTHS[date.month0() as usize];
    match date.day() {
        1 => format!("1er {} {}", month, date.year()),
        d => format!("{} {} {}", d, month, date.year()),
    }
}

fn place_date_line(place: &str, date: NaiveDate) -> String {
    let place = place.trim();
    if place.is_empty() {
        format!("Le {}", long_date(date))
    } else {
        format!("{}, le {}", place, long_date(date))
    }
}

fn paragraph(segments: Vec<TextSegment>, alignment: Alignment) -> Block {
    Block::Paragraph {
        segments,
        alignment,
    }
}

fn lines_paragraph(lines: &[String], alignment: Alignment) -> Option<Block> {
    let lines: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return None;
    }
    Some(paragraph(vec![TextSegment::plain(lines.join("\n"))], alignment))
}

/// Assemble and lay out a complete letter.
///
/// `body_markup` is the substituted template body. The salutation is
/// derived once from the recipient's civility and reused for the recipient
/// line, the greeting and the closing formula. An empty body still yields
/// the full skeleton.
pub fn generate(
    recipient: &Recipient,
    subject: &str,
    body_markup: &str,
    signature: &SignatureBlock,
    options: &GenerationOptions,
    config: &LayoutConfig,
) -> Result<GeneratedDocument, Error> {
    let salutation = recipient.civilite.salutation();
    let mut blocks = Vec::new();

    let letterhead: Vec<String> = options
        .letterhead
        .iter()
        .flat_map(|lh| std::iter::once(lh.name.clone()).chain(lh.lines.iter().cloned()))
        .filter(|l| !l.trim().is_empty())
        .collect();
    if let Some((name, rest)) = letterhead.split_first() {
        let mut segments = vec![TextSegment::bold(name.as_str())];
        if !rest.is_empty() {
            segments.push(TextSegment::plain(format!("\n{}", rest.join("\n"))));
        }
        blocks.push(paragraph(segments, Alignment::Left));
    }
    blocks.push(Block::Separator);

    let place_date = place_date_line(&options.place, options.date);
    blocks.push(paragraph(
        vec![TextSegment::plain(place_date.as_str())],
        Alignment::Right,
    ));

    let city_line = [recipient.code_postal.as_deref(), recipient.ville.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let recipient_lines: Vec<String> = [
        Some(salutation.address_line(&recipient.prenom, &recipient.nom)),
        recipient.adresse.clone(),
        Some(city_line),
    ]
    .into_iter()
    .flatten()
    .filter(|l| !l.trim().is_empty())
    .collect();
    blocks.extend(lines_paragraph(&recipient_lines, Alignment::Right));

    blocks.push(Block::Break);
    blocks.push(paragraph(
        vec![TextSegment {
            text: format!("Objet : {}", subject.trim()),
            bold: true,
            underline: true,
            ..TextSegment::default()
        }],
        Alignment::Left,
    ));
    blocks.push(Block::Break);

    blocks.push(paragraph(
        vec![TextSegment::plain(salutation.greeting.as_str())],
        Alignment::Left,
    ));

    let body = markup::parse(body_markup);
    log::debug!("Letter body parsed into {} block(s)", body.len());
    blocks.extend(body);

    blocks.push(paragraph(
        vec![TextSegment::plain(salutation.closing.as_str())],
        Alignment::Justify,
    ));

    let signature_lines: Vec<String> = [&signature.title, &signature.name]
        .into_iter()
        .filter(|l| !l.trim().is_empty())
        .cloned()
        .collect();
    if !signature_lines.is_empty() {
        blocks.push(Block::Break);
        blocks.extend(lines_paragraph(&signature_lines, Alignment::Right));
    }

    let result = layout::layout(&blocks, config, &options.decoration())?;
    for w in &result.warnings {
        log::warn!("Page {}: {}", w.page, w.message);
    }

    let author = options
        .author
        .clone()
        .or_else(|| options.letterhead.as_ref().map(|lh| lh.name.clone()))
        .unwrap_or_default();

    Ok(GeneratedDocument {
        metadata: DocumentMetadata {
            title: subject.trim().to_string(),
            author,
            subject: subject.trim().to_string(),
        },
        letterhead,
        place_date,
        recipient: recipient_lines,
        subject: subject.trim().to_string(),
        greeting: salutation.greeting.clone(),
        closing: salutation.closing.clone(),
        signature: signature_lines,
        page_width_pt: config.page_width_pt,
        page_height_pt: config.page_height_pt,
        pages: result.pages,
        warnings: result.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claire() -> Recipient {
        Recipient {
            civilite: Civility::Madame,
            prenom: "Claire".into(),
            nom: "Durand".into(),
            adresse: Some("12 rue des Lilas".into()),
            code_postal: Some("69003".into()),
            ville: Some("Lyon".into()),
        }
    }

    fn options() -> GenerationOptions {
        GenerationOptions {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            place: "Paris".into(),
            letterhead: Some(Letterhead {
                name: "ACME SAS".into(),
                lines: vec!["1 avenue de la République".into(), "75011 Paris".into()],
            }),
            ..GenerationOptions::default()
        }
    }

    fn signature() -> SignatureBlock {
        SignatureBlock {
            title: "La Directrice des Ressources Humaines".into(),
            name: "Sophie MARTIN".into(),
        }
    }

    fn position(lines: &[String], needle: &str) -> usize {
        lines
            .iter()
            .position(|l| l.contains(needle))
            .unwrap_or_else(|| panic!("{needle:?} not found in {lines:#?}"))
    }

    #[test]
    fn french_long_dates() {
        let d = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(long_date(d(2024, 1, 15)), "15 janvier 2024");
        assert_eq!(long_date(d(2024, 3, 1)), "1er mars 2024");
        assert_eq!(long_date(d(2023, 8, 31)), "31 août 2023");
    }

    #[test]
    fn skeleton_order() {
        let doc = generate(
            &claire(),
            "Confirmation d'embauche",
            "<p>Corps de la lettre.</p>",
            &signature(),
            &options(),
            &LayoutConfig::a4(),
        )
        .unwrap();
        let lines = doc.text_lines();
        let order = [
            "ACME SAS",
            "Paris, le 15 janvier 2024",
            "Madame Claire DURAND",
            "69003 Lyon",
            "Objet : Confirmation d'embauche",
            "Madame,",
            "Corps de la lettre.",
            "Nous vous prions d'agréer, Madame",
            "Sophie MARTIN",
        ];
        let positions: Vec<usize> = order.iter().map(|n| position(&lines, n)).collect();
        assert!(
            positions.windows(2).all(|w| w[0] < w[1]),
            "out of order: {positions:?}"
        );
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.pages[0].rules.len(), 1);
        assert_eq!(doc.metadata.author, "ACME SAS");
    }

    #[test]
    fn subject_line_is_bold_and_underlined() {
        let doc = generate(
            &claire(),
            "Avenant",
            "",
            &signature(),
            &options(),
            &LayoutConfig::a4(),
        )
        .unwrap();
        let line = doc.pages[0]
            .lines
            .iter()
            .find(|l| l.text().starts_with("Objet"))
            .unwrap();
        assert!(line.runs.iter().all(|r| r.bold && r.underline));
    }

    #[test]
    fn neutral_civility_is_used_everywhere() {
        let recipient = Recipient {
            civilite: Civility::Neutral,
            ..claire()
        };
        let doc = generate(
            &recipient,
            "Attestation",
            "<p>x</p>",
            &signature(),
            &options(),
            &LayoutConfig::a4(),
        )
        .unwrap();
        assert_eq!(doc.greeting, "Madame, Monsieur,");
        assert!(doc.closing.contains("Madame, Monsieur"));
        assert_eq!(doc.recipient[0], "Claire DURAND");
    }

    #[test]
    fn empty_body_keeps_skeleton() {
        let doc = generate(
            &claire(),
            "Sans corps",
            "",
            &SignatureBlock::default(),
            &GenerationOptions {
                letterhead: None,
                ..options()
            },
            &LayoutConfig::a4(),
        )
        .unwrap();
        let lines = doc.text_lines();
        position(&lines, "Paris, le 15 janvier 2024");
        position(&lines, "Objet : Sans corps");
        position(&lines, "Madame,");
        position(&lines, "salutations distinguées");
        assert!(doc.signature.is_empty());
        // The separator heads the letter even without a letterhead.
        assert_eq!(doc.pages[0].rules.len(), 1);
        let first_line = &doc.pages[0].lines[0];
        assert_eq!(first_line.text(), "Paris, le 15 janvier 2024");
        assert!(doc.pages[0].rules[0].y < first_line.y);
    }

    #[test]
    fn footer_text_only_when_enabled() {
        let with_footer = GenerationOptions {
            show_footer: true,
            footer_text: Some("ACME SAS – SIRET 123 456 789 00012".into()),
            ..options()
        };
        let doc = generate(&claire(), "x", "", &signature(), &with_footer, &LayoutConfig::a4())
            .unwrap();
        let footer = doc.pages[0].footer.as_ref().unwrap();
        assert!(footer.text().starts_with("ACME SAS"));
        assert!(footer.text().ends_with("Page 1/1"));

        let hidden = GenerationOptions {
            show_footer: false,
            ..with_footer
        };
        let doc = generate(&claire(), "x", "", &signature(), &hidden, &LayoutConfig::a4()).unwrap();
        assert_eq!(doc.pages[0].footer.as_ref().unwrap().text(), "Page 1/1");
    }

    #[test]
    fn long_body_spans_pages_with_consistent_footers() {
        let body: String = (0..120)
            .map(|i| format!("<p>Paragraphe numéro {i} de la note.</p>"))
            .collect();
        let doc = generate(&claire(), "Note", &body, &signature(), &options(), &LayoutConfig::a4())
            .unwrap();
        let total = doc.page_count();
        assert!(total > 1);
        for page in &doc.pages {
            let expected = format!("Page {}/{}", page.index, total);
            assert_eq!(page.footer.as_ref().unwrap().text(), expected);
        }
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: GenerationOptions =
            serde_json::from_str(r#"{"date": "2024-02-01", "place": "Nantes"}"#).unwrap();
        assert_eq!(opts.date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert!(opts.show_page_numbers);
        assert!(opts.letterhead.is_none());
    }
}
