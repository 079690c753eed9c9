//! Schema checks for JSON inputs.
//!
//! Input datasets are read with an explicit schema. Before loading, the
//! declared schema can be compared with what the engine infers from the data
//! so that drift in the upstream files fails the run instead of silently
//! producing nulls.

use std::fmt;

use deltalake::arrow::datatypes::{DataType, Schema};

/// One incompatibility between a declared and an inferred schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaProblem {
    /// Declared field does not appear in the data.
    MissingField { name: String },
    /// Field appears with a type that cannot be read as the declared one.
    TypeMismatch {
        name: String,
        declared: DataType,
        inferred: DataType,
    },
}

impl fmt::Display for SchemaProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaProblem::MissingField { name } => write!(f, "field '{name}' not found in data"),
            SchemaProblem::TypeMismatch {
                name,
                declared,
                inferred,
            } => write!(
                f,
                "field '{name}' declared as {declared} but data contains {inferred}"
            ),
        }
    }
}

/// Compare a declared schema against one inferred from the data.
///
/// Inferred fields that are not declared are ignored (they are dropped at
/// load time). Returns every problem found, in declared field order.
pub fn validate_schema(declared: &Schema, inferred: &Schema) -> Vec<SchemaProblem> {
    declared
        .fields()
        .iter()
        .filter_map(|field| match inferred.field_with_name(field.name()) {
            Err(_) => Some(SchemaProblem::MissingField {
                name: field.name().clone(),
            }),
            Ok(found) if !is_readable_as(found.data_type(), field.data_type()) => {
                Some(SchemaProblem::TypeMismatch {
                    name: field.name().clone(),
                    declared: field.data_type().clone(),
                    inferred: found.data_type().clone(),
                })
            }
            Ok(_) => None,
        })
        .collect()
}

/// Whether JSON values inferred as `inferred` decode cleanly as `declared`.
///
/// A column that is null in every sampled record is inferred as `Null` and is
/// compatible with anything. Integers widen to larger integers and to floats.
/// Anything can be read as a string.
fn is_readable_as(inferred: &DataType, declared: &DataType) -> bool {
    use DataType::*;

    if inferred == declared {
        return true;
    }

    match (inferred, declared) {
        (Null, _) => true,
        (_, Utf8 | LargeUtf8 | Utf8View) => true,
        (Int8 | Int16 | Int32, Int32) => true,
        (Int8 | Int16 | Int32 | Int64, Int64) => true,
        (Int8 | Int16 | Int32 | Int64 | Float16 | Float32, Float64) => true,
        (Int8 | Int16 | Int32 | Float16, Float32) => true,
        (Utf8, Timestamp(_, _) | Date32) => true,
        (Int64, Timestamp(_, _)) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltalake::arrow::datatypes::Field;

    fn schema(fields: &[(&str, DataType)]) -> Schema {
        Schema::new(
            fields
                .iter()
                .map(|(name, dt)| Field::new(*name, dt.clone(), true))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_identical_schemas_validate() {
        let s = schema(&[("song_id", DataType::Utf8), ("year", DataType::Int64)]);
        assert!(validate_schema(&s, &s).is_empty());
    }

    #[test]
    fn test_missing_field_reported() {
        let declared = schema(&[("song_id", DataType::Utf8), ("title", DataType::Utf8)]);
        let inferred = schema(&[("song_id", DataType::Utf8)]);

        assert_eq!(
            validate_schema(&declared, &inferred),
            vec![SchemaProblem::MissingField {
                name: "title".to_string()
            }]
        );
    }

    #[test]
    fn test_type_mismatch_reported() {
        let declared = schema(&[("ts", DataType::Int64)]);
        let inferred = schema(&[("ts", DataType::Utf8)]);

        let problems = validate_schema(&declared, &inferred);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].to_string().contains("'ts'"));
    }

    #[test]
    fn test_numeric_widening_and_nulls_are_compatible() {
        let declared = schema(&[
            ("artist_latitude", DataType::Float64),
            ("year", DataType::Int64),
            ("artist_location", DataType::Utf8),
        ]);
        let inferred = schema(&[
            ("artist_latitude", DataType::Int64),
            ("year", DataType::Int64),
            ("artist_location", DataType::Null),
        ]);

        assert!(validate_schema(&declared, &inferred).is_empty());
    }

    #[test]
    fn test_float_cannot_narrow_to_integer() {
        let declared = schema(&[("sessionId", DataType::Int64)]);
        let inferred = schema(&[("sessionId", DataType::Float64)]);
        assert_eq!(validate_schema(&declared, &inferred).len(), 1);
    }

    #[test]
    fn test_extra_inferred_fields_ignored() {
        let declared = schema(&[("page", DataType::Utf8)]);
        let inferred = schema(&[("page", DataType::Utf8), ("method", DataType::Utf8)]);
        assert!(validate_schema(&declared, &inferred).is_empty());
    }
}
