use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    errors::ValidationError,
    models::AssetReference,
    naming,
    ordering::Ordered,
    value_objects::Namespace,
};

const MIN_YEAR: i32 = 1000;
const MAX_YEAR: i32 = 9999;

/// How a namespace derives ids for new records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    /// Upload timestamp in milliseconds, usually handed out with the upload intent
    Timestamp,
    /// Slug of the record title
    TitleSlug,
    /// One record per namespace under a fixed id
    Singleton(&'static str),
}

impl IdStrategy {
    pub fn derive(
        &self,
        supplied: Option<&str>,
        fields: &RecordFields,
        now_millis: u64,
    ) -> Result<String, ValidationError> {
        match self {
            IdStrategy::Timestamp => match supplied.map(str::trim).filter(|s| !s.is_empty()) {
                Some(id) if naming::is_safe_id(id) => Ok(id.to_string()),
                Some(id) => Err(ValidationError::InvalidField {
                    field: "recordId".to_string(),
                    value: id.to_string(),
                    expected: "letters, digits, '-' or '_'".to_string(),
                }),
                None => Ok(now_millis.to_string()),
            },
            IdStrategy::TitleSlug => {
                let title = fields.title.as_deref().unwrap_or_default();
                let slug = naming::slugify(title);
                if slug.is_empty() {
                    return Err(ValidationError::InvalidField {
                        field: "title".to_string(),
                        value: title.to_string(),
                        expected: "at least one letter or digit".to_string(),
                    });
                }
                Ok(slug)
            }
            IdStrategy::Singleton(id) => Ok((*id).to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    pub id: String,
    pub title: String,
    pub year: i32,
    /// Position within the year, 1-based
    pub number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub assets: Vec<AssetReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exhibition {
    pub id: String,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub assets: Vec<AssetReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub biography: String,
    #[serde(default)]
    pub statement: String,
    /// Poster gallery
    #[serde(default)]
    pub assets: Vec<AssetReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPost {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub assets: Vec<AssetReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry of a collection document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Artwork(Artwork),
    Exhibition(Exhibition),
    CvProfile(CvProfile),
    TextPost(TextPost),
    ContactInfo(ContactInfo),
}

impl Record {
    pub fn id(&self) -> &str {
        match self {
            Record::Artwork(r) => &r.id,
            Record::Exhibition(r) => &r.id,
            Record::CvProfile(r) => &r.id,
            Record::TextPost(r) => &r.id,
            Record::ContactInfo(r) => &r.id,
        }
    }

    pub fn namespace(&self) -> Namespace {
        match self {
            Record::Artwork(_) => Namespace::Artworks,
            Record::Exhibition(_) => Namespace::Exhibitions,
            Record::CvProfile(_) => Namespace::Cv,
            Record::TextPost(_) => Namespace::Texts,
            Record::ContactInfo(_) => Namespace::Contact,
        }
    }

    pub fn assets(&self) -> &[AssetReference] {
        match self {
            Record::Artwork(r) => &r.assets,
            Record::Exhibition(r) => &r.assets,
            Record::CvProfile(r) => &r.assets,
            Record::TextPost(r) => &r.assets,
            Record::ContactInfo(_) => &[],
        }
    }

    /// `None` for variants that carry no assets
    pub fn assets_mut(&mut self) -> Option<&mut Vec<AssetReference>> {
        match self {
            Record::Artwork(r) => Some(&mut r.assets),
            Record::Exhibition(r) => Some(&mut r.assets),
            Record::CvProfile(r) => Some(&mut r.assets),
            Record::TextPost(r) => Some(&mut r.assets),
            Record::ContactInfo(_) => None,
        }
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        match self {
            Record::Artwork(r) => r.updated_at,
            Record::Exhibition(r) => r.updated_at,
            Record::CvProfile(r) => r.updated_at,
            Record::TextPost(r) => r.updated_at,
            Record::ContactInfo(r) => r.updated_at,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        match self {
            Record::Artwork(r) => r.updated_at = now,
            Record::Exhibition(r) => r.updated_at = now,
            Record::CvProfile(r) => r.updated_at = now,
            Record::TextPost(r) => r.updated_at = now,
            Record::ContactInfo(r) => r.updated_at = now,
        }
    }

    pub fn as_artwork(&self) -> Option<&Artwork> {
        match self {
            Record::Artwork(artwork) => Some(artwork),
            _ => None,
        }
    }

    /// Build a new record of the namespace's variant. Artwork ordinals start at 0 and are
    /// assigned when the record is appended to its document.
    pub fn from_fields(
        namespace: Namespace,
        id: String,
        fields: &RecordFields,
        assets: Vec<AssetReference>,
        now: DateTime<Utc>,
    ) -> Result<Record, ValidationError> {
        fields.validate_for_create(namespace)?;

        let record = match namespace {
            Namespace::Artworks => Record::Artwork(Artwork {
                id,
                title: required_text(namespace, "title", &fields.title)?,
                year: fields
                    .year
                    .ok_or(ValidationError::MissingField {
                        namespace,
                        field: "year",
                    })?,
                number: 0,
                description: optional_text(&fields.description),
                medium: optional_text(&fields.medium),
                dimensions: optional_text(&fields.dimensions),
                assets,
                created_at: now,
                updated_at: now,
            }),
            Namespace::Exhibitions => Record::Exhibition(Exhibition {
                id,
                title: required_text(namespace, "title", &fields.title)?,
                start_date: fields.start_date.ok_or(ValidationError::MissingField {
                    namespace,
                    field: "startDate",
                })?,
                end_date: fields.end_date.ok_or(ValidationError::MissingField {
                    namespace,
                    field: "endDate",
                })?,
                location: required_text(namespace, "location", &fields.location)?,
                description: optional_text(&fields.description),
                assets,
                created_at: now,
                updated_at: now,
            }),
            Namespace::Cv => Record::CvProfile(CvProfile {
                id,
                name: required_text(namespace, "name", &fields.name)?,
                biography: fields.biography.clone().unwrap_or_default(),
                statement: fields.statement.clone().unwrap_or_default(),
                assets,
                created_at: now,
                updated_at: now,
            }),
            Namespace::Texts => Record::TextPost(TextPost {
                id,
                title: required_text(namespace, "title", &fields.title)?,
                year: fields.year,
                description: optional_text(&fields.description),
                assets,
                created_at: now,
                updated_at: now,
            }),
            Namespace::Contact => Record::ContactInfo(ContactInfo {
                id,
                text: required_text(namespace, "text", &fields.text)?,
                social_url: optional_text(&fields.social_url),
                created_at: now,
                updated_at: now,
            }),
        };

        Ok(record)
    }

    /// Merge the supplied fields into this record. Absent fields are left untouched,
    /// an empty string clears an optional field.
    pub fn apply_patch(
        &mut self,
        fields: &RecordFields,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        let namespace = self.namespace();
        fields.validate_applicable(namespace)?;
        fields.validate_values()?;

        match self {
            Record::Artwork(r) => {
                merge_required(namespace, "title", &mut r.title, &fields.title)?;
                if let Some(year) = fields.year {
                    r.year = year;
                }
                merge_optional(&mut r.description, &fields.description);
                merge_optional(&mut r.medium, &fields.medium);
                merge_optional(&mut r.dimensions, &fields.dimensions);
            }
            Record::Exhibition(r) => {
                merge_required(namespace, "title", &mut r.title, &fields.title)?;
                merge_required(namespace, "location", &mut r.location, &fields.location)?;
                let start = fields.start_date.unwrap_or(r.start_date);
                let end = fields.end_date.unwrap_or(r.end_date);
                check_date_range(start, end)?;
                r.start_date = start;
                r.end_date = end;
                merge_optional(&mut r.description, &fields.description);
            }
            Record::CvProfile(r) => {
                merge_required(namespace, "name", &mut r.name, &fields.name)?;
                if let Some(biography) = &fields.biography {
                    r.biography = biography.clone();
                }
                if let Some(statement) = &fields.statement {
                    r.statement = statement.clone();
                }
            }
            Record::TextPost(r) => {
                merge_required(namespace, "title", &mut r.title, &fields.title)?;
                if fields.year.is_some() {
                    r.year = fields.year;
                }
                merge_optional(&mut r.description, &fields.description);
            }
            Record::ContactInfo(r) => {
                merge_required(namespace, "text", &mut r.text, &fields.text)?;
                merge_optional(&mut r.social_url, &fields.social_url);
            }
        }

        self.touch(now);
        Ok(())
    }
}

impl Ordered for Artwork {
    fn ordinal_id(&self) -> &str {
        &self.id
    }

    fn partition(&self) -> i32 {
        self.year
    }

    fn ordinal(&self) -> u32 {
        self.number
    }

    fn set_ordinal(&mut self, ordinal: u32) {
        self.number = ordinal;
    }
}

/// Field values supplied by a caller for create or partial update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RecordFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_url: Option<String>,
}

impl RecordFields {
    /// Names of the fields that carry a value
    pub fn supplied(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut push = |present: bool, name: &'static str| {
            if present {
                names.push(name);
            }
        };
        push(self.title.is_some(), "title");
        push(self.name.is_some(), "name");
        push(self.year.is_some(), "year");
        push(self.start_date.is_some(), "startDate");
        push(self.end_date.is_some(), "endDate");
        push(self.location.is_some(), "location");
        push(self.description.is_some(), "description");
        push(self.medium.is_some(), "medium");
        push(self.dimensions.is_some(), "dimensions");
        push(self.biography.is_some(), "biography");
        push(self.statement.is_some(), "statement");
        push(self.text.is_some(), "text");
        push(self.social_url.is_some(), "socialUrl");
        names
    }

    pub fn applicable_fields(namespace: Namespace) -> &'static [&'static str] {
        match namespace {
            Namespace::Artworks => &["title", "year", "description", "medium", "dimensions"],
            Namespace::Exhibitions => &["title", "startDate", "endDate", "location", "description"],
            Namespace::Cv => &["name", "biography", "statement"],
            Namespace::Texts => &["title", "year", "description"],
            Namespace::Contact => &["text", "socialUrl"],
        }
    }

    pub fn required_fields(namespace: Namespace) -> &'static [&'static str] {
        match namespace {
            Namespace::Artworks => &["title", "year"],
            Namespace::Exhibitions => &["title", "startDate", "endDate", "location"],
            Namespace::Cv => &["name"],
            Namespace::Texts => &["title"],
            Namespace::Contact => &["text"],
        }
    }

    pub fn validate_for_create(&self, namespace: Namespace) -> Result<(), ValidationError> {
        self.validate_applicable(namespace)?;

        let supplied = self.supplied();
        if let Some(missing) = Self::required_fields(namespace)
            .iter()
            .copied()
            .find(|field| !supplied.contains(field))
        {
            return Err(ValidationError::MissingField {
                namespace,
                field: missing,
            });
        }

        self.validate_values()?;

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            check_date_range(start, end)?;
        }
        Ok(())
    }

    pub fn validate_applicable(&self, namespace: Namespace) -> Result<(), ValidationError> {
        let applicable = Self::applicable_fields(namespace);
        match self
            .supplied()
            .into_iter()
            .find(|field| !applicable.contains(field))
        {
            Some(field) => Err(ValidationError::FieldNotApplicable { namespace, field }),
            None => Ok(()),
        }
    }

    fn validate_values(&self) -> Result<(), ValidationError> {
        if let Some(year) = self.year {
            if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                return Err(ValidationError::InvalidField {
                    field: "year".to_string(),
                    value: year.to_string(),
                    expected: format!("a year between {} and {}", MIN_YEAR, MAX_YEAR),
                });
            }
        }

        if let Some(url) = self.social_url.as_deref().filter(|u| !u.is_empty()) {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ValidationError::InvalidField {
                    field: "socialUrl".to_string(),
                    value: url.to_string(),
                    expected: "an http(s) URL".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn check_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if end < start {
        return Err(ValidationError::InvalidField {
            field: "endDate".to_string(),
            value: end.to_string(),
            expected: format!("a date on or after {}", start),
        });
    }
    Ok(())
}

fn required_text(
    namespace: Namespace,
    field: &'static str,
    value: &Option<String>,
) -> Result<String, ValidationError> {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(ValidationError::MissingField { namespace, field }),
    }
}

fn optional_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn merge_required(
    namespace: Namespace,
    field: &'static str,
    target: &mut String,
    value: &Option<String>,
) -> Result<(), ValidationError> {
    if value.is_some() {
        *target = required_text(namespace, field, value)?;
    }
    Ok(())
}

fn merge_optional(target: &mut Option<String>, value: &Option<String>) {
    if value.is_some() {
        *target = optional_text(value);
    }
}
