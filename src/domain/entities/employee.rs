use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::auth::password::is_password_hashed;
use crate::entities::education::{Education, NewEducation};
use crate::entities::employment::{Employment, NewEmployment};
use crate::entities::training::{NewTraining, Training};
use crate::errors::{AppError, FieldError};

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub dob: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub proposed_position: Option<String>,
    pub firm_name: Option<String>,
    pub picture: Option<String>,
    pub associations: Option<String>,
    pub work_countries: Option<String>,
    pub languages: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
impl Employee {
    pub fn fixture(email: &str, password: &str) -> Self {
        let now = Utc::now();
        Employee {
            id: Uuid::new_v4(),
            first_name: "Abebe".into(),
            last_name: "Kebede".into(),
            email: email.into(),
            password: password.into(),
            dob: None,
            nationality: Some("Ethiopian".into()),
            proposed_position: Some("Team Leader".into()),
            firm_name: None,
            picture: None,
            associations: None,
            work_countries: None,
            languages: Some("Amharic, English".into()),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Identity fields shared by the create, claim and edit writes.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub dob: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub proposed_position: Option<String>,
    pub firm_name: Option<String>,
    pub associations: Option<String>,
    pub work_countries: Option<String>,
    pub languages: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmployeeInsert {
    pub details: EmployeeDetails,
    pub password_hash: String,
    pub picture: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmployeeUpdate {
    pub details: EmployeeDetails,
    /// `None` keeps the stored picture.
    pub picture: Option<String>,
}

/// The three child collections of an account, already filtered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildRecords {
    pub education: Vec<NewEducation>,
    pub trainings: Vec<NewTraining>,
    pub employment_history: Vec<NewEmployment>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredCredential {
    pub id: Uuid,
    pub password: String,
}

// ───── Upsert Classification ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Create,
    Claim(Uuid),
    Reject,
}

/// Decides what a create submission does with the account already holding its email.
pub fn classify_existing(existing: Option<&StoredCredential>) -> UpsertAction {
    match existing {
        None => UpsertAction::Create,
        Some(credential) if is_password_hashed(&credential.password) => UpsertAction::Reject,
        Some(credential) => UpsertAction::Claim(credential.id),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created(Uuid),
    Claimed(Uuid),
}

impl UpsertOutcome {
    pub fn id(&self) -> Uuid {
        match self {
            UpsertOutcome::Created(id) | UpsertOutcome::Claimed(id) => *id,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            UpsertOutcome::Created(_) => "Created successfully",
            UpsertOutcome::Claimed(_) => "Account claimed successfully",
        }
    }
}

/// A committed create or claim, with the picture reference it replaced, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedEmployee {
    pub outcome: UpsertOutcome,
    pub replaced_picture: Option<String>,
}

/// The stored picture a write superseded. Writes without a new picture keep the old one.
pub fn replaced_picture(new_picture: Option<&str>, old_picture: Option<String>) -> Option<String> {
    let new_picture = new_picture?;
    old_picture.filter(|old| old != new_picture)
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PublicEmployee {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub dob: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub proposed_position: Option<String>,
    pub firm_name: Option<String>,
    pub picture: Option<String>,
    pub associations: Option<String>,
    pub work_countries: Option<String>,
    pub languages: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Employee> for PublicEmployee {
    fn from(employee: Employee) -> Self {
        PublicEmployee {
            id: employee.id,
            first_name: employee.first_name,
            last_name: employee.last_name,
            email: employee.email,
            dob: employee.dob,
            nationality: employee.nationality,
            proposed_position: employee.proposed_position,
            firm_name: employee.firm_name,
            picture: employee.picture,
            associations: employee.associations,
            work_countries: employee.work_countries,
            languages: employee.languages,
            created_at: employee.created_at,
            updated_at: employee.updated_at,
        }
    }
}

/// An account with its child collections nested alongside the profile fields.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeProfile {
    #[serde(flatten)]
    pub employee: PublicEmployee,
    pub education: Vec<Education>,
    pub trainings: Vec<Training>,
    pub employment_history: Vec<Employment>,
}

#[derive(Debug, Serialize)]
pub struct EmployeeCreatedResponse {
    pub message: String,
    pub employee_id: Uuid,
}

impl From<UpsertOutcome> for EmployeeCreatedResponse {
    fn from(outcome: UpsertOutcome) -> Self {
        EmployeeCreatedResponse {
            message: outcome.message().to_string(),
            employee_id: outcome.id(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse { message: message.into() }
    }
}

// ───── Input & Validation ───────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct EmployeeForm {
    #[validate(custom(function = "validate_not_blank", message = "First name is required"))]
    pub first_name: String,

    #[validate(custom(function = "validate_not_blank", message = "Last name is required"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: Option<String>,
    pub dob: Option<String>,
    pub nationality: Option<String>,
    pub proposed_position: Option<String>,
    pub firm_name: Option<String>,
    pub associations: Option<String>,
    pub work_countries: Option<String>,
    pub languages: Option<String>,

    #[serde(default)]
    pub education: Vec<EducationInput>,

    #[serde(default)]
    pub trainings: Vec<TrainingInput>,

    #[serde(default)]
    pub employment_history: Vec<EmploymentInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EducationInput {
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub year_completed: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingInput {
    #[serde(default)]
    pub certification_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmploymentInput {
    #[serde(default)]
    pub employer: Option<String>,
    #[serde(default)]
    pub position_held: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl EmployeeForm {
    /// Normalizes the identity fields.
    pub fn details(&self) -> Result<EmployeeDetails, AppError> {
        Ok(EmployeeDetails {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            dob: parse_optional_date("dob", self.dob.as_deref())?,
            nationality: non_empty(self.nationality.as_deref()),
            proposed_position: non_empty(self.proposed_position.as_deref()),
            firm_name: non_empty(self.firm_name.as_deref()),
            associations: non_empty(self.associations.as_deref()),
            work_countries: non_empty(self.work_countries.as_deref()),
            languages: non_empty(self.languages.as_deref()),
        })
    }

    /// Drops entries whose primary field is empty and normalizes the rest.
    pub fn child_records(&self) -> Result<ChildRecords, AppError> {
        let education = self.education
            .iter()
            .filter_map(|entry| {
                let degree = non_empty(entry.degree.as_deref())?;
                let institution = non_empty(entry.institution.as_deref())?;
                Some(NewEducation {
                    degree,
                    institution,
                    year_completed: non_empty(entry.year_completed.as_deref()),
                })
            })
            .collect();

        let trainings = self.trainings
            .iter()
            .filter_map(|entry| {
                non_empty(entry.certification_name.as_deref())
                    .map(|certification_name| NewTraining { certification_name })
            })
            .collect();

        let mut employment_history = Vec::new();
        for entry in &self.employment_history {
            let Some(employer) = non_empty(entry.employer.as_deref()) else {
                continue;
            };
            employment_history.push(NewEmployment {
                employer,
                position_held: non_empty(entry.position_held.as_deref()),
                start_date: parse_optional_date("employment_history.start_date", entry.start_date.as_deref())?,
                end_date: parse_optional_date("employment_history.end_date", entry.end_date.as_deref())?,
            });
        }

        Ok(ChildRecords {
            education,
            trainings,
            employment_history,
        })
    }

    pub fn required_password(&self) -> Result<&str, AppError> {
        match self.password.as_deref() {
            Some(password) if !password.is_empty() => Ok(password),
            _ => Err(FieldError::new("password", "Password is required").into()),
        }
    }
}

/// Rejects values that are empty once trimmed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("This field is required".into());
        return Err(error);
    }
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Accepts `YYYY-MM-DD`, or an RFC 3339 timestamp whose date part is used.
pub fn parse_optional_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, FieldError> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| Some(dt.date_naive()))
        .map_err(|_| FieldError::new(field, "Invalid date, expected YYYY-MM-DD"))
}

// ───── Multipart Upload ─────────────────────────────────────────────

#[derive(Debug, MultipartForm)]
pub struct EmployeeUpload {
    pub first_name: Option<Text<String>>,
    pub last_name: Option<Text<String>>,
    pub email: Option<Text<String>>,
    pub password: Option<Text<String>>,
    pub dob: Option<Text<String>>,
    pub nationality: Option<Text<String>>,
    pub proposed_position: Option<Text<String>>,
    pub firm_name: Option<Text<String>>,
    pub associations: Option<Text<String>>,
    pub work_countries: Option<Text<String>>,
    pub languages: Option<Text<String>>,
    pub education: Option<Text<String>>,
    pub trainings: Option<Text<String>>,
    pub employment_history: Option<Text<String>>,
    pub picture: Option<TempFile>,
}

impl EmployeeUpload {
    /// Splits the upload into the text form and the picture, if one was sent.
    /// Collections arrive as JSON-encoded text parts.
    pub fn into_form(self) -> Result<(EmployeeForm, Option<TempFile>), AppError> {
        let form = EmployeeForm {
            first_name: text(self.first_name).unwrap_or_default(),
            last_name: text(self.last_name).unwrap_or_default(),
            email: text(self.email).map(|e| e.trim().to_string()).unwrap_or_default(),
            password: text(self.password),
            dob: text(self.dob),
            nationality: text(self.nationality),
            proposed_position: text(self.proposed_position),
            firm_name: text(self.firm_name),
            associations: text(self.associations),
            work_countries: text(self.work_countries),
            languages: text(self.languages),
            education: parse_collection("education", text(self.education))?,
            trainings: parse_collection("trainings", text(self.trainings))?,
            employment_history: parse_collection("employment_history", text(self.employment_history))?,
        };

        // Browsers send an empty part when no file was chosen.
        let picture = self.picture.filter(|file| file.size > 0);

        Ok((form, picture))
    }
}

fn text(field: Option<Text<String>>) -> Option<String> {
    field.map(|t| t.into_inner())
}

fn parse_collection<T>(field: &str, raw: Option<String>) -> Result<Vec<T>, AppError>
where
    T: for<'de> Deserialize<'de>,
{
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(json) => serde_json::from_str(json)
            .map_err(|e| FieldError::new(field, format!("Malformed JSON list: {}", e)).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> EmployeeForm {
        EmployeeForm {
            first_name: " Abebe ".into(),
            last_name: "Kebede".into(),
            email: " abebe@example.com ".into(),
            password: Some("secret".into()),
            dob: Some("1990-04-12".into()),
            nationality: Some("".into()),
            ..Default::default()
        }
    }

    #[test]
    fn details_trim_and_drop_empty_fields() {
        let details = form().details().unwrap();

        assert_eq!(details.first_name, "Abebe");
        assert_eq!(details.email, "abebe@example.com");
        assert_eq!(details.dob, NaiveDate::from_ymd_opt(1990, 4, 12));
        assert_eq!(details.nationality, None);
    }

    #[test]
    fn child_records_keep_only_entries_with_primary_fields() {
        let mut form = form();
        form.education = vec![
            EducationInput { degree: Some("BSc".into()), institution: Some("AAU".into()), year_completed: Some("2012".into()) },
            EducationInput { degree: Some("MSc".into()), institution: Some("".into()), year_completed: None },
            EducationInput::default(),
        ];
        form.trainings = vec![
            TrainingInput { certification_name: Some("PMP".into()) },
            TrainingInput { certification_name: Some("   ".into()) },
        ];
        form.employment_history = vec![
            EmploymentInput {
                employer: Some("Ethio Consult".into()),
                position_held: Some("".into()),
                start_date: Some("2015-01-01".into()),
                end_date: Some("".into()),
            },
            EmploymentInput { employer: None, ..Default::default() },
        ];

        let records = form.child_records().unwrap();

        assert_eq!(records.education.len(), 1);
        assert_eq!(records.education[0].year_completed.as_deref(), Some("2012"));
        assert_eq!(records.trainings, vec![NewTraining { certification_name: "PMP".into() }]);
        assert_eq!(records.employment_history.len(), 1);
        assert_eq!(records.employment_history[0].position_held, None);
        assert_eq!(records.employment_history[0].end_date, None);
    }

    #[test]
    fn invalid_dates_are_rejected_on_kept_entries() {
        let mut form = form();
        form.employment_history = vec![EmploymentInput {
            employer: Some("Acme".into()),
            start_date: Some("yesterday".into()),
            ..Default::default()
        }];

        assert!(matches!(form.child_records(), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn parses_timestamps_as_dates() {
        let date = parse_optional_date("dob", Some("1990-04-12T00:00:00.000Z")).unwrap();

        assert_eq!(date, NaiveDate::from_ymd_opt(1990, 4, 12));
        assert_eq!(parse_optional_date("dob", Some("  ")).unwrap(), None);
    }

    #[test]
    fn password_is_required() {
        let mut form = form();
        assert_eq!(form.required_password().unwrap(), "secret");

        form.password = Some(String::new());
        assert!(form.required_password().is_err());
    }

    #[test]
    fn validation_reports_missing_fields() {
        let form = EmployeeForm::default();

        let err = AppError::from(form.validate().unwrap_err());
        match err {
            AppError::ValidationError(fields) => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["email", "first_name", "last_name"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn whitespace_only_names_are_rejected() {
        let mut form = form();
        form.first_name = "   ".into();
        form.last_name = "\t".into();

        let err = AppError::from(form.validate().unwrap_err());
        match err {
            AppError::ValidationError(fields) => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["first_name", "last_name"]);
                assert_eq!(fields[0].message, "First name is required");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn collections_parse_from_json_text() {
        let parsed: Vec<TrainingInput> =
            parse_collection("trainings", Some(r#"[{"certification_name":"ITIL"}]"#.into())).unwrap();
        assert_eq!(parsed[0].certification_name.as_deref(), Some("ITIL"));

        let empty: Vec<TrainingInput> = parse_collection("trainings", Some(" ".into())).unwrap();
        assert!(empty.is_empty());

        let err = parse_collection::<TrainingInput>("trainings", Some("{not json".into()));
        assert!(matches!(err, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn classifies_existing_accounts() {
        let id = Uuid::new_v4();
        let legacy = StoredCredential { id, password: "plaintext".into() };
        let secured = StoredCredential {
            id,
            password: "$argon2id$v=19$m=15000,t=2,p=1$c2FsdA$aGFzaA".into(),
        };

        assert_eq!(classify_existing(None), UpsertAction::Create);
        assert_eq!(classify_existing(Some(&legacy)), UpsertAction::Claim(id));
        assert_eq!(classify_existing(Some(&secured)), UpsertAction::Reject);
    }

    #[test]
    fn only_a_new_picture_replaces_the_stored_one() {
        let old = Some("uploads/old.png".to_string());

        assert_eq!(replaced_picture(Some("uploads/new.png"), old.clone()), old);
        assert_eq!(replaced_picture(None, old.clone()), None);
        assert_eq!(replaced_picture(Some("uploads/old.png"), old), None);
        assert_eq!(replaced_picture(Some("uploads/new.png"), None), None);
    }

    #[test]
    fn outcome_messages_distinguish_claims() {
        let id = Uuid::new_v4();
        let created = EmployeeCreatedResponse::from(UpsertOutcome::Created(id));
        let claimed = EmployeeCreatedResponse::from(UpsertOutcome::Claimed(id));

        assert_eq!(created.message, "Created successfully");
        assert_eq!(claimed.message, "Account claimed successfully");
        assert_eq!(claimed.employee_id, id);
    }
}
