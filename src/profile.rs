//! Profile formatter – flattens employee, employer and signatory records
//! into the system variable bindings used for substitution, and infers the
//! civility used throughout a letter.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::substitute::{Values, VariableValue};

/// Form of address. Closed set: two gendered forms and a neutral combined
/// form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Civility {
    Monsieur,
    Madame,
    #[default]
    #[serde(alias = "Madame, Monsieur")]
    Neutral,
}

impl Civility {
    /// Parse a free-form civility field ("M.", "Mme", "Madame"…).
    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .trim()
            .trim_end_matches('.')
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        match key.as_str() {
            "m" | "mr" | "monsieur" => Some(Civility::Monsieur),
            "mme" | "mrs" | "ms" | "madame" | "mlle" | "mademoiselle" => Some(Civility::Madame),
            "madame,monsieur" | "neutral" | "neutre" => Some(Civility::Neutral),
            _ => None,
        }
    }

    /// Explicit civility first, then a gender code, else neutral.
    pub fn infer(civilite: Option<&str>, gender: Option<&str>) -> Self {
        if let Some(c) = civilite.and_then(Civility::parse) {
            return c;
        }
        match gender.map(|g| g.trim().to_lowercase()).as_deref() {
            Some("m" | "h" | "homme" | "male" | "masculin") => Civility::Monsieur,
            Some("f" | "femme" | "female" | "feminin" | "féminin") => Civility::Madame,
            _ => Civility::Neutral,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Civility::Monsieur => "Monsieur",
            Civility::Madame => "Madame",
            Civility::Neutral => "Madame, Monsieur",
        }
    }

    pub fn salutation(self) -> Salutation {
        Salutation::for_civility(self)
    }
}

/// Salutation texts derived once per letter so the recipient block,
/// greeting and closing always agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Salutation {
    pub civility: Civility,
    pub title: String,
    pub greeting: String,
    pub closing: String,
}

impl Salutation {
    pub fn for_civility(civility: Civility) -> Self {
        let title = civility.title();
        Self {
            civility,
            title: title.to_string(),
            greeting: format!("{title},"),
            closing: format!(
                "Nous vous prions d'agréer, {title}, l'expression de nos salutations distinguées."
            ),
        }
    }

    /// Recipient line, e.g. "Madame Claire DURAND". The neutral form only
    /// carries the name.
    pub fn address_line(&self, first_name: &str, last_name: &str) -> String {
        let name = full_name(first_name, last_name);
        match (self.civility, name.is_empty()) {
            (_, true) => self.title.clone(),
            (Civility::Neutral, false) => name,
            (_, false) => format!("{} {}", self.title, name),
        }
    }
}

/// "Prénom NOM"
pub fn full_name(first_name: &str, last_name: &str) -> String {
    let last = last_name.trim().to_uppercase();
    match (first_name.trim(), last.as_str()) {
        ("", "") => String::new(),
        (f, "") => f.to_string(),
        ("", l) => l.to_string(),
        (f, l) => format!("{f} {l}"),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeProfile {
    pub civilite: Option<String>,
    pub sexe: Option<String>,
    pub prenom: Option<String>,
    pub nom: Option<String>,
    pub matricule: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub adresse: Option<String>,
    pub code_postal: Option<String>,
    pub ville: Option<String>,
    pub date_naissance: Option<NaiveDate>,
    pub lieu_naissance: Option<String>,
    pub nationalite: Option<String>,
    pub numero_securite_sociale: Option<String>,
    pub poste: Option<String>,
    pub departement: Option<String>,
    pub type_contrat: Option<String>,
    pub salaire: Option<f64>,
    pub temps_travail: Option<String>,
    pub periode_essai: Option<String>,
    pub date_embauche: Option<NaiveDate>,
    pub date_debut_contrat: Option<NaiveDate>,
    pub date_fin_contrat: Option<NaiveDate>,
}

impl EmployeeProfile {
    pub fn civility(&self) -> Civility {
        Civility::infer(self.civilite.as_deref(), self.sexe.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Employer {
    pub nom: Option<String>,
    pub adresse: Option<String>,
    pub ville: Option<String>,
    pub siret: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Signatory {
    pub nom: Option<String>,
    pub titre: Option<String>,
}

/// Flatten the records into system variable bindings keyed by catalog name.
///
/// Dates stay typed so the substitution engine applies the locale format;
/// absent fields bind to [`VariableValue::Missing`].
pub fn system_values(
    profile: &EmployeeProfile,
    employer: &Employer,
    signatory: &Signatory,
    today: NaiveDate,
) -> Values {
    let salutation = profile.civility().salutation();
    let text = |v: &Option<String>| VariableValue::from(v.clone());
    let date = |v: &Option<NaiveDate>| VariableValue::from(*v);

    let nom_complet = full_name(
        profile.prenom.as_deref().unwrap_or_default(),
        profile.nom.as_deref().unwrap_or_default(),
    );

    let mut values = Values::new();
    let mut put = |name: &str, value: VariableValue| {
        values.insert(name.to_string(), value);
    };

    put("civilite", salutation.title.clone().into());
    put("formule_appel", salutation.greeting.clone().into());
    put("prenom", text(&profile.prenom));
    put("nom", text(&profile.nom));
    put("nom_complet", nom_complet.into());
    put("matricule", text(&profile.matricule));

    put("email", text(&profile.email));
    put("telephone", text(&profile.telephone));
    put("adresse", text(&profile.adresse));
    put("code_postal", text(&profile.code_postal));
    put("ville", text(&profile.ville));

    put("poste", text(&profile.poste));
    put("departement", text(&profile.departement));
    put("type_contrat", text(&profile.type_contrat));
    put(
        "salaire",
        profile
            .salaire
            .map(VariableValue::Number)
            .unwrap_or(VariableValue::Missing),
    );
    put("temps_travail", text(&profile.temps_travail));
    put("periode_essai", text(&profile.periode_essai));

    put("date_naissance", date(&profile.date_naissance));
    put("lieu_naissance", text(&profile.lieu_naissance));
    put("nationalite", text(&profile.nationalite));
    put(
        "numero_securite_sociale",
        text(&profile.numero_securite_sociale),
    );

    put("date_embauche", date(&profile.date_embauche));
    put("date_debut_contrat", date(&profile.date_debut_contrat));
    put("date_fin_contrat", date(&profile.date_fin_contrat));
    put("date_jour", today.into());

    put("entreprise_nom", text(&employer.nom));
    put("entreprise_adresse", text(&employer.adresse));
    put("entreprise_ville", text(&employer.ville));
    put("entreprise_siret", text(&employer.siret));

    put("signataire_nom", text(&signatory.nom));
    put("signataire_titre", text(&signatory.titre));

    values
}
