//! Entities shared by unit tests.
use crate::{
    entity_instance,
    error::InternalError,
    model::{EntityFieldKind, EntityFieldModel, EntityModel, KeyCapability},
    traits::{EntityKind, EntityLogger, HasIntKey, HasLogger, HasRetrieved},
    value::{Row, Value},
};
use chrono::{DateTime, Utc};

///
/// Customer
/// Integer-keyed entity with retrieval stamp and logger capabilities.
///

#[derive(Clone, Debug, Default)]
pub(crate) struct Customer {
    pub id: i64,
    pub name: String,
    pub city: Option<String>,
    pub phone_number: Option<String>,
    pub retrieved: Option<DateTime<Utc>>,
    pub logger: Option<EntityLogger>,
}

impl Customer {
    pub fn new(name: &str, city: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            city: city.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn with_id(id: i64, name: &str, city: Option<&str>) -> Self {
        Self {
            id,
            ..Self::new(name, city)
        }
    }
}

const CUSTOMER_FIELDS: [EntityFieldModel; 4] = [
    EntityFieldModel::new("id", EntityFieldKind::Int),
    EntityFieldModel::new("name", EntityFieldKind::Text),
    EntityFieldModel::nullable("city", EntityFieldKind::Text),
    EntityFieldModel::nullable("phone_number", EntityFieldKind::Text),
];

impl EntityKind for Customer {
    const MODEL: &'static EntityModel = &EntityModel {
        path: "test_fixtures::Customer",
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

        Ok(Self {
            id,
            name: name.to_string(),
            city: row.get("city").as_text().map(str::to_string),
            phone_number: row.get("phone_number").as_text().map(str::to_string),
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
/// Text-keyed entity without an integer identifier.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Country {
    pub name: String,
    pub dialing_codes: String,
}

impl Country {
    pub fn new(name: &str, dialing_codes: &str) -> Self {
        Self {
            name: name.to_string(),
            dialing_codes: dialing_codes.to_string(),
        }
    }
}

const COUNTRY_FIELDS: [EntityFieldModel; 2] = [
    EntityFieldModel::new("name", EntityFieldKind::Text),
    EntityFieldModel::new("dialing_codes", EntityFieldKind::Text),
];

impl EntityKind for Country {
    const MODEL: &'static EntityModel = &EntityModel {
        path: "test_fixtures::Country",
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
        match (row.get("name"), row.get("dialing_codes")) {
            (Value::Text(name), Value::Text(dialing_codes)) => Ok(Self {
                name: name.clone(),
                dialing_codes: dialing_codes.clone(),
            }),
            _ => Err(InternalError::materialize(
                "Country",
                "name and dialing_codes must be text",
            )),
        }
    }
}

entity_instance!(Country);

/// Customer rows in insertion order, deliberately not sorted by id.
pub(crate) fn customer_rows() -> Vec<Row> {
    vec![
        Customer::with_id(4, "Baxter", None).to_row(),
        Customer::with_id(2, "Mac", Some("Ames")).to_row(),
        Customer::with_id(3, "Toast", None).to_row(),
        Customer::with_id(1, "Alice", Some("Ames")).to_row(),
    ]
}
