//! Sample letter templates for testing and demonstration.
//!
//! Each template exercises different supported tags and placeholder kinds.

/// A named sample body with the custom variables it declares.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub name: &'static str,
    pub description: &'static str,
    pub body: &'static str,
    pub custom_names: &'static [&'static str],
}

/// Every bundled sample.
pub fn samples() -> [Sample; 4] {
    [
        Sample {
            name: "contrat",
            description: "Confirmation of a new employment contract",
            body: contract_start_template(),
            custom_names: &["date_debut", "lieu_travail", "horaires"],
        },
        Sample {
            name: "attestation",
            description: "Employment certificate",
            body: employment_certificate_template(),
            custom_names: &[],
        },
        Sample {
            name: "note",
            description: "Long internal notice spanning several pages",
            body: long_notice_template(),
            custom_names: &["date_reunion"],
        },
        Sample {
            name: "minimal",
            description: "Single paragraph",
            body: minimal_template(),
            custom_names: &[],
        },
    ]
}

pub fn find(name: &str) -> Option<Sample> {
    samples().into_iter().find(|s| s.name == name)
}

/// Contract start letter mixing system and custom placeholders.
pub fn contract_start_template() -> &'static str {
    r##"
<p>Nous avons le plaisir de vous confirmer votre engagement au sein de la société
<b>{{entreprise_nom}}</b> en qualité de <b>{{poste}}</b>, dans le cadre d'un contrat
{{type_contrat}}.</p>

<p>Votre contrat débutera le {{date_debut}}. Vous exercerez vos fonctions à
{{lieu_travail}}, au sein du département {{departement}}.</p>

<h3>Conditions principales</h3>
<ul>
    <li>Rémunération annuelle brute : {{salaire}} &euro;</li>
    <li>Temps de travail : {{temps_travail}}</li>
    <li>Horaires : {{horaires}}</li>
    <li>Période d'essai : {{periode_essai}}</li>
</ul>

<p style="text-align: justify">Nous vous remercions de bien vouloir nous retourner un
exemplaire de ce courrier daté et signé, précédé de la mention
<i>&laquo;&nbsp;Bon pour accord&nbsp;&raquo;</i>.</p>
"##
}

/// Employment certificate, system placeholders only.
pub fn employment_certificate_template() -> &'static str {
    r##"
<h2>Attestation d'emploi</h2>

<p>Je soussigné(e), {{signataire_nom}}, {{signataire_titre}} de la société
{{entreprise_nom}}, SIRET {{entreprise_siret}}, dont le siège est situé
{{entreprise_adresse}}, {{entreprise_ville}}, atteste que :</p>

<p align="center"><b>{{civilite}} {{nom_complet}}</b><br>
né(e) le {{date_naissance}} à {{lieu_naissance}}</p>

<p>est employé(e) au sein de notre entreprise depuis le {{date_embauche}} en qualité
de {{poste}}, sous contrat {{type_contrat}}, matricule {{matricule}}.</p>

<p>La présente attestation est délivrée à l'intéressé(e) pour servir et valoir ce que
de droit.</p>
<hr>
<p class="ql-align-right"><i>Fait le {{date_jour}}</i></p>
"##
}

/// Internal notice long enough to run over several A4 pages.
pub fn long_notice_template() -> &'static str {
    r##"
<h1>Note d'information au personnel</h1>

<p>Cette note présente l'organisation des prochains mois au sein de
{{entreprise_nom}}. Elle remplace les notes précédentes portant sur le même sujet et
reste applicable jusqu'à nouvel ordre. Une réunion d'information se tiendra le
{{date_reunion}} ; la présence de chaque responsable d'équipe est requise.</p>

<h2>1. Horaires et présence</h2>
<p>Les plages fixes de présence sont maintenues de 9 h 30 à 12 h et de 14 h à 16 h.
En dehors de ces plages, chaque collaborateur organise son temps de travail en accord
avec son responsable, dans le respect de la durée contractuelle et des temps de repos
quotidien et hebdomadaire. Les heures supplémentaires doivent faire l'objet d'une
demande préalable validée par écrit.</p>
<ul>
    <li>Les badgeuses restent la seule référence pour le décompte du temps.</li>
    <li>Toute absence imprévue est signalée avant 10 h au responsable direct.</li>
    <li>Les retards répétés donnent lieu à un entretien avec le service RH.</li>
</ul>

<h2>2. Congés payés</h2>
<p>Les demandes de congés d'été sont à déposer avant le 31 mars dans l'outil de
gestion des temps. Elles sont arbitrées par ordre d'arrivée, puis en fonction des
contraintes de service, de la situation familiale et de l'ancienneté. Une réponse est
apportée à chaque demande dans un délai de quinze jours.</p>
<ol>
    <li>Dépôt de la demande dans l'outil.</li>
    <li>Validation par le responsable d'équipe.</li>
    <li>Contrôle du solde par le service paie.</li>
    <li>Confirmation écrite au collaborateur.</li>
</ol>

<h2>3. Télétravail</h2>
<p>Le télétravail est ouvert à raison de deux jours par semaine pour les postes
éligibles. Les jours choisis sont fixés avec le responsable pour une période de trois
mois et peuvent être revus d'un commun accord. L'indemnité forfaitaire mensuelle est
versée avec le salaire du mois suivant. Le matériel mis à disposition reste la
propriété de l'entreprise et doit être restitué en cas de départ.</p>

<h2>4. Formation</h2>
<p>Le plan de développement des compétences de l'année est disponible auprès du
service RH. Chaque collaborateur peut exprimer ses souhaits lors de l'entretien
annuel. Les formations obligatoires liées à la sécurité sont planifiées en priorité
et ne peuvent être reportées qu'avec l'accord de la direction.</p>
<ul>
    <li>Sécurité incendie : session trimestrielle.</li>
    <li>Gestes et postures : nouveaux arrivants.</li>
    <li>Protection des données : tous les collaborateurs.</li>
</ul>

<h2>5. Santé et sécurité</h2>
<p>Le document unique d'évaluation des risques a été mis à jour. Il peut être consulté
au secrétariat. Les sauveteurs secouristes du travail sont identifiés par un badge
vert ; leur liste est affichée dans chaque bâtiment. Tout accident, même bénin, doit
être déclaré dans les vingt-quatre heures.</p>

<h2>6. Frais professionnels</h2>
<p>Les notes de frais sont saisies avant le 5 de chaque mois, accompagnées des
justificatifs originaux. Les frais de repas sont remboursés dans la limite du barème
en vigueur. Les déplacements en train sont réservés en seconde classe, sauf
dérogation accordée par la direction pour les trajets de plus de trois heures.</p>
<ol>
    <li>Saisie de la note dans l'outil.</li>
    <li>Validation hiérarchique.</li>
    <li>Contrôle comptable.</li>
    <li>Remboursement sur le bulletin de paie.</li>
</ol>

<h2>7. Entretiens annuels</h2>
<p>Les entretiens annuels et professionnels se déroulent entre janvier et mars. Les
supports sont transmis deux semaines avant la date retenue afin que chacun puisse se
préparer. Le compte rendu est signé par les deux parties et une copie est remise au
collaborateur.</p>

<h2>8. Représentants du personnel</h2>
<p>Les membres du comité social et économique tiennent une permanence le premier mardi
de chaque mois. Leurs coordonnées figurent sur le panneau d'affichage. Les comptes
rendus des réunions sont diffusés sur l'intranet dans le mois qui suit chaque
séance.</p>

<h2>9. Outils informatiques</h2>
<p>La charte informatique a été révisée. Les mots de passe doivent comporter au moins
douze caractères et être renouvelés chaque semestre. L'usage d'équipements personnels
pour accéder aux données de l'entreprise est soumis à autorisation préalable du
service informatique.</p>
<ul>
    <li>Verrouiller son poste à chaque absence.</li>
    <li>Ne jamais communiquer ses identifiants.</li>
    <li>Signaler tout message suspect au support.</li>
</ul>

<h2>10. Contacts</h2>
<p>Pour toute question relative à cette note, le service des ressources humaines
reste à votre disposition. Vous pouvez également vous adresser à votre responsable
direct, qui relaiera les demandes nécessitant un arbitrage.</p>
<hr>
<p align="right"><i>Note diffusée le {{date_jour}}</i></p>
"##
}

/// Smallest useful body.
pub fn minimal_template() -> &'static str {
    "<p>Bonjour {{prenom}},</p>"
}
