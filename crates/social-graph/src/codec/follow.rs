use crate::codec::{Field, FieldKind, FieldSpec, GraphObject, PropertyReader, PropertyWriter};
use crate::data::{Direction, FollowEdge, MappingError, UserRef};

pub const FOLLOW_EDGE_LABEL: &str = "FOLLOW";

impl GraphObject for FollowEdge {
    const LABEL: &'static str = FOLLOW_EDGE_LABEL;

    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::Scalar(Field::optional("status", FieldKind::String)),
        FieldSpec::Scalar(Field::optional("startPeriod", FieldKind::Date)),
        FieldSpec::Scalar(Field::optional("endPeriod", FieldKind::Date)),
    ];

    fn write_properties(&self, writer: &mut PropertyWriter) {
        writer.id(self.id.as_ref());
        writer.string("status", self.status.as_deref());
        writer.date("startPeriod", self.start_period);
        writer.date("endPeriod", self.end_period);
        writer.anchor(Direction::In, self.target.as_ref().and_then(UserRef::id));
        writer.anchor(Direction::Out, self.source.as_ref().and_then(UserRef::id));
    }

    fn read_properties(reader: &PropertyReader<'_>) -> Result<Self, MappingError> {
        Ok(FollowEdge {
            id: reader.id()?,
            status: reader.string("status")?,
            start_period: reader.date("startPeriod")?,
            end_period: reader.date("endPeriod")?,
            target: reader.anchor(Direction::In)?.map(|id| UserRef::Lazy { id }),
            source: reader.anchor(Direction::Out)?.map(|id| UserRef::Lazy { id }),
        })
    }
}
