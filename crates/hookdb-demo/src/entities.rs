//! Entities used by the walkthroughs.
use chrono::{DateTime, Utc};
use hookdb_core::prelude::*;

///
/// Customer
///

#[derive(Clone, Debug, Default)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub city: Option<String>,
    pub country: Option<String>,
    phone_number: Option<String>,
    retrieved: Option<DateTime<Utc>>,
    logger: Option<EntityLogger>,
}

impl Customer {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_city(mut self, city: &str) -> Self {
        self.city = Some(city.to_string());
        self
    }

    #[must_use]
    pub fn in_country(mut self, country: &str) -> Self {
        self.country = Some(country.to_string());
        self
    }

    #[must_use]
    pub fn with_phone_number(mut self, phone_number: &str) -> Self {
        self.phone_number = Some(phone_number.to_string());
        self
    }

    #[must_use]
    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    /// Change the phone number, reporting the change through the injected
    /// logger when there is one.
    pub fn set_phone_number(&mut self, phone_number: &str) {
        if let Some(logger) = &self.logger {
            logger.info(
                1,
                &format!(
                    "updating phone number for '{}' from '{}' to '{phone_number}'",
                    self.name,
                    self.phone_number.as_deref().unwrap_or_default()
                ),
            );
        }

        self.phone_number = Some(phone_number.to_string());
    }
}

const CUSTOMER_FIELDS: [EntityFieldModel; 5] = [
    EntityFieldModel::new("id", EntityFieldKind::Int),
    EntityFieldModel::new("name", EntityFieldKind::Text),
    EntityFieldModel::nullable("city", EntityFieldKind::Text),
    EntityFieldModel::nullable("country", EntityFieldKind::Text),
    EntityFieldModel::nullable("phone_number", EntityFieldKind::Text),
];

impl EntityKind for Customer {
    const MODEL: &'static EntityModel = &EntityModel {
        path: "hookdb_demo::Customer",
        entity_name: "Customer",
        primary_key: "id",
        fields: &CUSTOMER_FIELDS,
        key: KeyCapability::of::<Self>(),
    };

    fn to_row(&self) -> Row {
        Row::new()
            .with("id", self.id)
            .with("name", self.name.as_str())
            .with("city", self.city.clone())
            .with("country", self.country.clone())
            .with("phone_number", self.phone_number.clone())
    }

    fn from_row(row: &Row) -> Result<Self, InternalError> {
        let id = row
            .get("id")
            .as_int()
            .ok_or_else(|| InternalError::materialize("Customer", "id must be an integer"))?;
        let name = row
            .get("name")
            .as_text()
            .ok_or_else(|| InternalError::materialize("Customer", "name must be text"))?;
        let text = |field: &str| row.get(field).as_text().map(str::to_string);

        Ok(Self {
            id,
            name: name.to_string(),
            city: text("city"),
            country: text("country"),
            phone_number: text("phone_number"),
            ..Self::default()
        })
    }
}

impl HasIntKey for Customer {
    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}

impl HasRetrieved for Customer {
    fn retrieved(&self) -> Option<DateTime<Utc>> {
        self.retrieved
    }

    fn set_retrieved(&mut self, at: DateTime<Utc>) {
        self.retrieved = Some(at);
    }
}

impl HasLogger for Customer {
    fn logger(&self) -> Option<&EntityLogger> {
        self.logger.as_ref()
    }

    fn set_logger(&mut self, logger: EntityLogger) {
        self.logger = Some(logger);
    }
}

entity_instance!(Customer, {
    fn as_has_retrieved_mut(&mut self) -> Option<&mut dyn HasRetrieved> {
        Some(self)
    }

    fn as_has_logger_mut(&mut self) -> Option<&mut dyn HasLogger> {
        Some(self)
    }
});

///
/// Country
/// Immutable reference data keyed by name.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Country {
    pub name: String,
    pub dialing_codes: String,
}

impl Country {
    #[must_use]
    pub fn new(name: &str, dialing_codes: &str) -> Self {
        Self {
            name: name.to_string(),
            dialing_codes: dialing_codes.to_string(),
        }
    }

    /// Seed rows for the countries table.
    #[must_use]
    pub fn reference_data() -> Vec<Self> {
        [
            ("Australia", "+61"),
            ("Canada", "+1"),
            ("France", "+33"),
            ("Germany", "+49"),
            ("Ireland", "+353"),
            ("Japan", "+81"),
            ("New Zealand", "+64"),
            ("Norway", "+47"),
            ("United Kingdom", "+44"),
            ("United States", "+1"),
        ]
        .into_iter()
        .map(|(name, dialing_codes)| Self::new(name, dialing_codes))
        .collect()
    }
}

const COUNTRY_FIELDS: [EntityFieldModel; 2] = [
    EntityFieldModel::new("name", EntityFieldKind::Text),
    EntityFieldModel::new("dialing_codes", EntityFieldKind::Text),
];

impl EntityKind for Country {
    const MODEL: &'static EntityModel = &EntityModel {
        path: "hookdb_demo::Country",
        entity_name: "Country",
        primary_key: "name",
        fields: &COUNTRY_FIELDS,
        key: KeyCapability::None,
    };

    fn to_row(&self) -> Row {
        Row::new()
            .with("name", self.name.as_str())
            .with("dialing_codes", self.dialing_codes.as_str())
    }

    fn from_row(row: &Row) -> Result<Self, InternalError> {
        match (row.get("name").as_text(), row.get("dialing_codes").as_text()) {
            (Some(name), Some(dialing_codes)) => Ok(Self::new(name, dialing_codes)),
            _ => Err(InternalError::materialize(
                "Country",
                "name and dialing_codes must be text",
            )),
        }
    }
}

entity_instance!(Country);
