//! Catalog of system variables – placeholders resolved automatically from
//! employee, employer and signatory data.
//!
//! The table is static and read-only; authoring tools use the labels and
//! categories to present the available placeholders.

use serde::Serialize;

/// Presentation group of a system variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Identity,
    Contact,
    Employment,
    Personal,
    Dates,
    Employer,
    Signatory,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Identity,
        Category::Contact,
        Category::Employment,
        Category::Personal,
        Category::Dates,
        Category::Employer,
        Category::Signatory,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Identity => "Identité",
            Category::Contact => "Coordonnées",
            Category::Employment => "Emploi",
            Category::Personal => "Informations personnelles",
            Category::Dates => "Dates",
            Category::Employer => "Employeur",
            Category::Signatory => "Signataire",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SystemVariable {
    pub name: &'static str,
    pub label: &'static str,
    pub category: Category,
}

const fn var(name: &'static str, label: &'static str, category: Category) -> SystemVariable {
    SystemVariable {
        name,
        label,
        category,
    }
}

static SYSTEM_VARIABLES: &[SystemVariable] = &[
    // Identity
    var("civilite", "Civilité", Category::Identity),
    var("formule_appel", "Formule d'appel", Category::Identity),
    var("prenom", "Prénom", Category::Identity),
    var("nom", "Nom", Category::Identity),
    var("nom_complet", "Nom complet", Category::Identity),
    var("matricule", "Matricule", Category::Identity),
    // Contact
    var("email", "Adresse e-mail", Category::Contact),
    var("telephone", "Téléphone", Category::Contact),
    var("adresse", "Adresse", Category::Contact),
    var("code_postal", "Code postal", Category::Contact),
    var("ville", "Ville", Category::Contact),
    // Employment
    var("poste", "Poste", Category::Employment),
    var("departement", "Département", Category::Employment),
    var("type_contrat", "Type de contrat", Category::Employment),
    var("salaire", "Salaire brut", Category::Employment),
    var("temps_travail", "Temps de travail", Category::Employment),
    var("periode_essai", "Période d'essai", Category::Employment),
    // Personal
    var("date_naissance", "Date de naissance", Category::Personal),
    var("lieu_naissance", "Lieu de naissance", Category::Personal),
    var("nationalite", "Nationalité", Category::Personal),
    var("numero_securite_sociale", "N° de sécurité sociale", Category::Personal),
    // Dates
    var("date_embauche", "Date d'embauche", Category::Dates),
    var("date_debut_contrat", "Date de début du contrat", Category::Dates),
    var("date_fin_contrat", "Date de fin du contrat", Category::Dates),
    var("date_jour", "Date du jour", Category::Dates),
    // Employer
    var("entreprise_nom", "Raison sociale", Category::Employer),
    var("entreprise_adresse", "Adresse de l'entreprise", Category::Employer),
    var("entreprise_ville", "Ville de l'entreprise", Category::Employer),
    var("entreprise_siret", "SIRET", Category::Employer),
    // Signatory
    var("signataire_nom", "Nom du signataire", Category::Signatory),
    var("signataire_titre", "Fonction du signataire", Category::Signatory),
];

/// Every known system variable, in presentation order.
pub fn all() -> &'static [SystemVariable] {
    SYSTEM_VARIABLES
}

pub fn lookup(name: &str) -> Option<&'static SystemVariable> {
    SYSTEM_VARIABLES.iter().find(|v| v.name == name)
}

pub fn is_system(name: &str) -> bool {
    lookup(name).is_some()
}

pub fn by_category(category: Category) -> impl Iterator<Item = &'static SystemVariable> {
    SYSTEM_VARIABLES
        .iter()
        .filter(move |v| v.category == category)
}
