use crate::codec::{Field, FieldKind, FieldSpec, GraphObject, PropertyReader, PropertyWriter};
use crate::data::{Address, MappingError, User};

pub const USER_VERTEX_LABEL: &str = "User";
pub const USERNAME_PROPERTY: &str = "username";
pub const NAME_PROPERTY: &str = "name";
/// Flattened key of the nested `address.state` field.
pub const ADDRESS_STATE_PROPERTY: &str = "address_state";

const ADDRESS: &str = "address";

const ADDRESS_FIELDS: &[Field] = &[
    Field::optional("addressLine", FieldKind::String),
    Field::optional("zipCode", FieldKind::String),
    Field::optional("city", FieldKind::String),
    Field::optional("state", FieldKind::String),
    Field::optional("country", FieldKind::String),
];

impl GraphObject for User {
    const LABEL: &'static str = USER_VERTEX_LABEL;

    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::Scalar(Field::required(USERNAME_PROPERTY, FieldKind::String)),
        FieldSpec::Scalar(Field::optional(NAME_PROPERTY, FieldKind::String)),
        FieldSpec::Nested { name: ADDRESS, fields: ADDRESS_FIELDS },
    ];

    fn write_properties(&self, writer: &mut PropertyWriter) {
        writer.id(self.id.as_ref());
        writer.string(USERNAME_PROPERTY, Some(self.username.as_str()));
        writer.string(NAME_PROPERTY, self.name.as_deref());

        let address = self.address.as_ref();
        writer.nested(ADDRESS, |nested| {
            nested.string("addressLine", address.and_then(|a| a.address_line.as_deref()));
            nested.string("zipCode", address.and_then(|a| a.zip_code.as_deref()));
            nested.string("city", address.and_then(|a| a.city.as_deref()));
            nested.string("state", address.and_then(|a| a.state.as_deref()));
            nested.string("country", address.and_then(|a| a.country.as_deref()));
        });
    }

    /// An address with every field absent reads back as `None`, so a user
    /// written with `Some(Address::default())` does not round-trip.
    fn read_properties(reader: &PropertyReader<'_>) -> Result<Self, MappingError> {
        let nested = reader.nested(ADDRESS);
        let address = Address {
            address_line: nested.string("addressLine")?,
            zip_code: nested.string("zipCode")?,
            city: nested.string("city")?,
            state: nested.string("state")?,
            country: nested.string("country")?,
        };

        Ok(User {
            id: reader.id()?,
            username: reader.required_string(USERNAME_PROPERTY)?,
            name: reader.string(NAME_PROPERTY)?,
            address: (!address.is_empty()).then_some(address),
        })
    }
}
