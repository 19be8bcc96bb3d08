use ::csv::{ReaderBuilder, WriterBuilder};

use super::{FormatError, FormatParser, FormatSerializer};
use crate::udm::{Node, ObjectNode};

/// CSV adapter: a document is an array of flat objects, one per record,
/// keyed by the header row. Fields are scanned for numbers and booleans on
/// the way in; `@`-prefixed columns carry attributes.
pub struct CsvAdapter;

impl FormatParser for CsvAdapter {
    fn parse(&self, text: &str) -> Result<Node, FormatError> {
        let mut reader = ReaderBuilder::new().from_reader(text.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| FormatError::Syntax(e.to_string()))?
            .clone();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| FormatError::Syntax(e.to_string()))?;
            let mut object = ObjectNode::default();
            for (header, field) in headers.iter().zip(record.iter()) {
                if let Some(name) = header.strip_prefix('@') {
                    object
                        .metadata
                        .attributes
                        .push((name.to_string(), field.to_string()));
                } else {
                    object.entries.push((header.to_string(), infer_scalar(field)));
                }
            }
            rows.push(Node::Object(object));
        }
        Ok(Node::Array(rows))
    }
}

impl FormatSerializer for CsvAdapter {
    fn serialize(&self, node: &Node) -> Result<String, FormatError> {
        let Node::Array(rows) = node else {
            return Err(FormatError::Shape(format!(
                "csv output requires an array of objects, got {}",
                node.type_name()
            )));
        };
        if rows.is_empty() {
            return Ok(String::new());
        }

        // The first record fixes the column set.
        let first = object_row(&rows[0])?;
        let mut columns: Vec<String> = first
            .metadata
            .attributes
            .iter()
            .map(|(name, _)| format!("@{}", name))
            .collect();
        columns.extend(first.entries.iter().map(|(key, _)| key.clone()));

        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        writer
            .write_record(&columns)
            .map_err(|e| FormatError::Shape(e.to_string()))?;

        for row in rows {
            let object = object_row(row)?;
            let mut fields = Vec::with_capacity(columns.len());
            for column in &columns {
                fields.push(field_of(object, column)?);
            }
            writer
                .write_record(&fields)
                .map_err(|e| FormatError::Shape(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| FormatError::Shape(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| FormatError::Shape(e.to_string()))
    }
}

fn infer_scalar(field: &str) -> Node {
    if let Ok(n) = field.parse::<i64>() {
        return Node::Integer(n);
    }
    if let Ok(n) = field.parse::<f64>() {
        return Node::Float(n);
    }
    match field {
        "true" => Node::Boolean(true),
        "false" => Node::Boolean(false),
        _ => Node::String(field.to_string()),
    }
}

fn object_row(row: &Node) -> Result<&ObjectNode, FormatError> {
    match row {
        Node::Object(object) => Ok(object),
        other => Err(FormatError::Shape(format!(
            "csv records must be objects, got {}",
            other.type_name()
        ))),
    }
}

fn field_of(object: &ObjectNode, column: &str) -> Result<String, FormatError> {
    if let Some(name) = column.strip_prefix('@') {
        return Ok(object.metadata.attribute(name).unwrap_or("").to_string());
    }
    match object.get(column) {
        None | Some(Node::Null) => Ok(String::new()),
        Some(value) => value.coerce_string().ok_or_else(|| {
            FormatError::Shape(format!(
                "column '{}' holds a {}, csv fields must be scalars",
                column,
                value.type_name()
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_become_objects_with_inferred_scalars() {
        let parsed = CsvAdapter.parse("name,qty,price\nbolt,3,0.25\n").unwrap();
        let expected = Node::Array(vec![Node::object(vec![
            ("name".to_string(), Node::String("bolt".to_string())),
            ("qty".to_string(), Node::Integer(3)),
            ("price".to_string(), Node::Float(0.25)),
        ])]);
        assert_eq!(parsed, expected);
    }

    #[test]
    fn attribute_columns_round_trip() {
        let text = "@id,val\n5,1\n";
        let parsed = CsvAdapter.parse(text).unwrap();
        assert_eq!(CsvAdapter.serialize(&parsed).unwrap(), text);
    }

    #[test]
    fn nested_values_are_a_shape_error() {
        let rows = Node::Array(vec![Node::object(vec![(
            "a".to_string(),
            Node::Array(vec![Node::Integer(1)]),
        )])]);
        assert!(matches!(
            CsvAdapter.serialize(&rows),
            Err(FormatError::Shape(_))
        ));
    }

    #[test]
    fn non_array_output_is_rejected() {
        assert!(matches!(
            CsvAdapter.serialize(&Node::Integer(1)),
            Err(FormatError::Shape(_))
        ));
    }
}
